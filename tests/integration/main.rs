//! simplemsg integration test harness.
//!
//! Tests run the real client against a scripted peer on a loopback TCP
//! listener. The peer reads the request until the client half-closes, then
//! replies and closes, exactly like a protocol-conformant server.
//!
//!   cargo test --test integration

mod exchange;
mod failures;

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use simplemsg_client::Endpoint;

// ── Harness ───────────────────────────────────────────────────────────────────

/// How a scripted peer delivers its reply.
#[derive(Debug, Clone, Copy)]
pub enum Delivery {
    /// One write.
    Whole,
    /// Writes of at most this many bytes, each flushed separately.
    Pieces(usize),
}

/// A peer serving exactly one connection.
pub struct ScriptedPeer {
    pub addr: SocketAddr,
    task: JoinHandle<Result<Vec<u8>>>,
}

impl ScriptedPeer {
    /// Bind on loopback and serve `reply` to the first client.
    pub async fn start(reply: Vec<u8>, delivery: Delivery) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("failed to bind scripted peer")?;
        let addr = listener.local_addr()?;

        let task = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.context("accept failed")?;
            sock.set_nodelay(true)?;

            // Returns only once the client has half-closed.
            let mut request = Vec::new();
            tokio::time::timeout(Duration::from_secs(10), sock.read_to_end(&mut request))
                .await
                .context("client never half-closed")??;

            match delivery {
                Delivery::Whole => sock.write_all(&reply).await?,
                Delivery::Pieces(size) => {
                    for piece in reply.chunks(size.max(1)) {
                        sock.write_all(piece).await?;
                        sock.flush().await?;
                        tokio::task::yield_now().await;
                    }
                }
            }
            sock.shutdown().await?;
            Ok::<_, anyhow::Error>(request)
        });

        Ok(Self { addr, task })
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.addr.ip().to_string(), self.addr.port())
    }

    /// The request bytes the peer saw.
    pub async fn request(self) -> Result<Vec<u8>> {
        self.task.await.context("peer task panicked")?
    }
}

/// Serialize a reply the way a server would.
pub fn reply(status: i32, records: &[(&str, &[u8])]) -> Vec<u8> {
    let mut out = format!("status={status}\n").into_bytes();
    for (name, payload) in records {
        out.extend_from_slice(format!("file={name}\nlen={}\n", payload.len()).as_bytes());
        out.extend_from_slice(payload);
    }
    out
}
