//! Length-prefixed framing: a 4-byte big-endian length, then that many
//! bytes of UTF-8 JSON. The older unframed variant is not supported.

use bytes::{BufMut, Bytes, BytesMut};
use serde::{de::DeserializeOwned, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::client::PersistenceError;

/// Largest frame accepted in either direction
pub const MAX_FRAME_LEN: u32 = 1 << 20;

/// Write one frame and flush
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<(), PersistenceError>
where
    W: AsyncWrite + Unpin,
{
    let len = u32::try_from(payload.len())
        .ok()
        .filter(|len| *len <= MAX_FRAME_LEN)
        .ok_or(PersistenceError::FrameTooLarge(payload.len()))?;

    let mut buf = BytesMut::with_capacity(4 + payload.len());
    buf.put_u32(len);
    buf.put_slice(payload);

    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}

/// Read exactly one frame
pub async fn read_frame<R>(reader: &mut R) -> Result<Bytes, PersistenceError>
where
    R: AsyncRead + Unpin,
{
    let len = reader.read_u32().await?;
    if len > MAX_FRAME_LEN {
        return Err(PersistenceError::FrameTooLarge(len as usize));
    }

    let mut buf = BytesMut::zeroed(len as usize);
    reader.read_exact(&mut buf).await?;
    Ok(buf.freeze())
}

/// Serialize `value` as JSON and write it as one frame
pub async fn write_json<W, T>(writer: &mut W, value: &T) -> Result<(), PersistenceError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let body = serde_json::to_vec(value).map_err(PersistenceError::Encode)?;
    write_frame(writer, &body).await
}

/// Read one frame and decode it as JSON
pub async fn read_json<R, T>(reader: &mut R) -> Result<T, PersistenceError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let body = read_frame(reader).await?;
    serde_json::from_slice(&body).map_err(PersistenceError::Decode)
}
