//! One complete exchange: connect, send the posting, decode the reply.

use tokio::io::{AsyncRead, AsyncWrite};

use simplemsg_core::{DecoderConfig, Posting};

use crate::error::ClientError;
use crate::response::{Response, ResponseDecoder};
use crate::sink::SinkFactory;
use crate::transport;

/// Where to connect. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

/// Send `posting` over an already connected `stream`, then decode the reply
/// from the same stream into `sinks`.
///
/// The stream is dropped (closed) on every path out of this function.
pub async fn exchange_over<S, F>(
    mut stream: S,
    posting: &Posting,
    decoder: &DecoderConfig,
    sinks: &mut F,
) -> Result<Response, ClientError>
where
    S: AsyncRead + AsyncWrite + Unpin,
    F: SinkFactory,
{
    crate::request::send_posting(&mut stream, posting).await?;
    let response = ResponseDecoder::new(stream, decoder).decode(sinks).await?;
    Ok(response)
}

/// Connect to `endpoint` over TCP and run [`exchange_over`].
pub async fn exchange<F>(
    endpoint: &Endpoint,
    posting: &Posting,
    decoder: &DecoderConfig,
    sinks: &mut F,
) -> Result<Response, ClientError>
where
    F: SinkFactory,
{
    let stream = transport::connect_tcp(&endpoint.host, endpoint.port).await?;
    tracing::info!(host = %endpoint.host, port = endpoint.port, "connected");
    exchange_over(stream, posting, decoder, sinks).await
}
