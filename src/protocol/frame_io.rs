//! Async frame read/write over any byte stream.
//!
//! The transport may deliver data in arbitrary chunk sizes. `read_frame`
//! feeds a [`FrameBuffer`] with reads sized to the bytes still missing, so
//! it never consumes past the end of the frame.

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::frame_buffer::FrameBuffer;
use super::wire_format::encode_length;
use crate::error::Result;

/// Read chunk size for payload accumulation.
const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Read exactly one length-prefixed frame and return its payload.
///
/// # Errors
///
/// - [`TruncatedHeader`](crate::HostpipeError::TruncatedHeader) if the peer
///   closes before 4 prefix bytes arrive
/// - [`InvalidLength`](crate::HostpipeError::InvalidLength) if the declared
///   length is out of bounds
/// - [`TruncatedPayload`](crate::HostpipeError::TruncatedPayload) if the peer
///   closes mid-payload
pub async fn read_frame<R>(reader: &mut R, max_payload_size: usize) -> Result<Bytes>
where
    R: AsyncRead + Unpin,
{
    let mut frames = FrameBuffer::with_max_payload(max_payload_size);
    let mut chunk = vec![0u8; READ_CHUNK_SIZE];

    loop {
        let want = frames.bytes_needed().min(READ_CHUNK_SIZE);
        let n = reader.read(&mut chunk[..want]).await?;
        if n == 0 {
            return Err(frames.truncation_error());
        }

        if let Some(payload) = frames.push(&chunk[..n])? {
            return Ok(payload);
        }
    }
}

/// Write one length-prefixed frame and flush.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let prefix = encode_length(payload.len())?;
    writer.write_all(&prefix).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}
