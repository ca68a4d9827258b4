//! Transport bootstrap — resolve a host/port pair and connect to the first
//! candidate that accepts.
//!
//! This is a single attempt fanned out across candidates in resolver order,
//! not a retry policy.

use std::future::Future;
use std::io;
use std::net::SocketAddr;

use tokio::net::TcpStream;

use crate::error::ConnectError;

/// Maps a host/port pair to an ordered list of candidate addresses.
pub trait Resolver {
    fn resolve(&self, host: &str, port: u16)
        -> impl Future<Output = io::Result<Vec<SocketAddr>>>;
}

/// Opens a stream to one candidate address.
pub trait Connector {
    type Stream;

    fn connect(&self, addr: SocketAddr) -> impl Future<Output = io::Result<Self::Stream>>;
}

/// The system resolver, in the address-family order it returns.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl Resolver for SystemResolver {
    async fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<SocketAddr>> {
        Ok(tokio::net::lookup_host((host, port)).await?.collect())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&self, addr: SocketAddr) -> io::Result<TcpStream> {
        TcpStream::connect(addr).await
    }
}

/// Resolve `host:port` and connect to the first candidate that accepts.
pub async fn connect<R, C>(
    host: &str,
    port: u16,
    resolver: &R,
    connector: &C,
) -> Result<C::Stream, ConnectError>
where
    R: Resolver,
    C: Connector,
{
    let candidates =
        resolver
            .resolve(host, port)
            .await
            .map_err(|source| ConnectError::ResolutionFailed {
                host: host.to_string(),
                port,
                source,
            })?;
    if candidates.is_empty() {
        return Err(ConnectError::ResolutionFailed {
            host: host.to_string(),
            port,
            source: io::Error::new(io::ErrorKind::NotFound, "no addresses found"),
        });
    }
    tracing::debug!(host, port, candidates = candidates.len(), "resolved");

    let mut last = None;
    for (attempt, addr) in candidates.iter().enumerate() {
        match connector.connect(*addr).await {
            Ok(stream) => {
                tracing::debug!(%addr, attempt, "connected");
                return Ok(stream);
            }
            Err(e) => {
                tracing::debug!(%addr, attempt, error = %e, "candidate failed, trying next");
                last = Some(e);
            }
        }
    }

    // Non-empty candidates means at least one attempt recorded an error.
    let last = last.unwrap_or_else(|| io::Error::from(io::ErrorKind::NotConnected));
    Err(ConnectError::AllCandidatesFailed {
        host: host.to_string(),
        port,
        attempts: candidates.len(),
        last,
    })
}

/// [`connect`] with the system resolver over TCP.
pub async fn connect_tcp(host: &str, port: u16) -> Result<TcpStream, ConnectError> {
    connect(host, port, &SystemResolver, &TcpConnector).await
}
