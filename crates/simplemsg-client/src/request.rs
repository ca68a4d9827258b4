//! Request encoder — write a posting and signal end-of-request by
//! half-closing the write direction.

use tokio::io::{AsyncWrite, AsyncWriteExt};

use simplemsg_core::Posting;

use crate::error::SendError;

/// Write `posting`, flush, and shut down the write side of `writer`.
///
/// On a `TcpStream` the shutdown is `shutdown(Write)`: the read direction
/// stays open for the response. The peer composes its reply only after it
/// sees this half-close, so nothing may be read before this returns.
pub async fn send_posting<W>(writer: &mut W, posting: &Posting) -> Result<(), SendError>
where
    W: AsyncWrite + Unpin,
{
    let request = posting.encode();

    writer
        .write_all(&request)
        .await
        .map_err(SendError::WriteFailed)?;
    writer.flush().await.map_err(SendError::FlushFailed)?;
    writer.shutdown().await.map_err(SendError::ShutdownFailed)?;

    tracing::debug!(
        user = posting.user(),
        image = posting.image().is_some(),
        bytes = request.len(),
        "request sent, write side closed"
    );
    Ok(())
}
