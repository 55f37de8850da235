//! Message framing.
//!
//! Messages are JSON values framed by HTTP-like headers:
//!
//! ```text
//! Content-Length: <n>\r\n
//! \r\n
//! <n bytes of UTF-8 JSON>
//! ```

use crate::error::IpcError;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest body accepted from the peer.
pub const MAX_MESSAGE_LEN: usize = 64 * 1024 * 1024;

/// Write a single framed message to `writer`.
pub async fn write_message<W>(writer: &mut W, value: &Value) -> Result<(), IpcError>
where
    W: AsyncWrite + Unpin,
{
    let body = serde_json::to_vec(value)?;

    let header = format!("Content-Length: {}\r\n\r\n", body.len());
    writer.write_all(header.as_bytes()).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

/// Read a single framed message from `reader`.
///
/// Returns:
/// - `Ok(Some(value))` when a message is successfully read.
/// - `Ok(None)` on clean EOF before any header byte.
pub async fn read_message<R>(reader: &mut R) -> Result<Option<Value>, IpcError>
where
    R: AsyncBufRead + Unpin,
{
    let mut content_length: Option<usize> = None;
    let mut line = String::new();
    let mut header_seen = false;

    loop {
        line.clear();
        let read = reader.read_line(&mut line).await?;
        if read == 0 {
            if header_seen {
                return Err(IpcError::Framing("connection closed inside headers".into()));
            }
            return Ok(None);
        }
        header_seen = true;

        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            break;
        }

        // Header names are case-insensitive; unknown headers are skipped.
        if let Some((name, rest)) = trimmed.split_once(':')
            && name.trim().eq_ignore_ascii_case("Content-Length")
        {
            let len = rest
                .trim()
                .parse::<usize>()
                .map_err(|_| IpcError::Framing(format!("bad Content-Length: {}", rest.trim())))?;
            content_length = Some(len);
        }
    }

    let len =
        content_length.ok_or_else(|| IpcError::Framing("missing Content-Length header".into()))?;
    if len > MAX_MESSAGE_LEN {
        return Err(IpcError::Framing(format!("message of {len} bytes is too large")));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;

    Ok(Some(serde_json::from_slice(&body)?))
}
