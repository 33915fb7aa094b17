//! Length-prefixed frame I/O
//!
//! Reads loop until the full header and payload have arrived, however
//! the transport fragments delivery; a connection that closes mid-frame
//! is a fatal protocol violation for that connection.

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, ProtocolError, Result};

use super::{LENGTH_HEADER_BYTES, MAX_PAYLOAD_BYTES};

/// Send a 1-byte pull command
pub async fn write_command<W>(writer: &mut W, command: u8) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&[command]).await?;
    writer.flush().await?;
    Ok(())
}

/// Receive the next pull command.
///
/// Returns `Ok(None)` when the peer closed the connection cleanly
/// between frames (a normal disconnect, not a protocol violation).
pub async fn read_command<R>(reader: &mut R) -> Result<Option<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut byte = [0u8; 1];
    match reader.read(&mut byte).await {
        Ok(0) => Ok(None),
        Ok(_) => Ok(Some(byte[0])),
        Err(e) => Err(e.into()),
    }
}

/// Write one frame: `i32` little-endian payload length, then the
/// payload bytes.
///
/// Payloads over [`MAX_PAYLOAD_BYTES`] are refused before anything is
/// written.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    if payload.len() > MAX_PAYLOAD_BYTES {
        return Err(Error::CapacityExceeded {
            needed: payload.len(),
            capacity: MAX_PAYLOAD_BYTES,
        });
    }

    let mut header = [0u8; LENGTH_HEADER_BYTES];
    header.copy_from_slice(&(payload.len() as i32).to_le_bytes());
    writer.write_all(&header).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame into `scratch`, returning the payload.
///
/// `scratch` is reused across frames and fully overwritten for the
/// bytes returned. A declared length that is negative or exceeds
/// [`MAX_PAYLOAD_BYTES`] is rejected without reading the payload.
pub async fn read_frame<R>(reader: &mut R, scratch: &mut BytesMut) -> Result<Bytes>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; LENGTH_HEADER_BYTES];
    read_exact_or_truncated(reader, &mut header).await?;

    let declared = i32::from_le_bytes(header);
    if declared < 0 || declared as usize > MAX_PAYLOAD_BYTES {
        return Err(ProtocolError::Oversized(declared as usize).into());
    }
    let len = declared as usize;

    scratch.clear();
    scratch.resize(len, 0);
    read_exact_or_truncated(reader, &mut scratch[..]).await?;
    Ok(scratch.split_to(len).freeze())
}

/// `read_exact` with EOF mapped to the protocol's truncation error
async fn read_exact_or_truncated<R>(reader: &mut R, buf: &mut [u8]) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    match reader.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            Err(ProtocolError::Truncated.into())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::PULL_XYZRGB;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn test_command_round_trip() {
        let (mut client, mut server) = tokio::io::duplex(64);
        write_command(&mut client, PULL_XYZRGB).await.unwrap();
        assert_eq!(read_command(&mut server).await.unwrap(), Some(PULL_XYZRGB));
    }

    #[tokio::test]
    async fn test_command_eof_is_clean_disconnect() {
        let (client, mut server) = tokio::io::duplex(64);
        drop(client);
        assert_eq!(read_command(&mut server).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_frame_round_trip() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        let payload: Vec<u8> = (0..100).collect();

        write_frame(&mut server, &payload).await.unwrap();

        let mut scratch = BytesMut::new();
        let got = read_frame(&mut client, &mut scratch).await.unwrap();
        assert_eq!(&got[..], &payload[..]);
    }

    #[tokio::test]
    async fn test_frame_reassembled_from_fragments() {
        // The reader must see exactly N bytes however the transport
        // fragments delivery.
        for chunk_size in [1usize, 7, 4096] {
            let payload: Vec<u8> = (0..9010u32).map(|i| (i % 251) as u8).collect();
            let mut wire = Vec::new();
            wire.extend_from_slice(&(payload.len() as i32).to_le_bytes());
            wire.extend_from_slice(&payload);

            let (mut tx, mut rx) = tokio::io::duplex(16 * 1024);
            let writer = tokio::spawn(async move {
                for chunk in wire.chunks(chunk_size) {
                    tx.write_all(chunk).await.unwrap();
                    tx.flush().await.unwrap();
                    tokio::task::yield_now().await;
                }
            });

            let mut scratch = BytesMut::new();
            let got = read_frame(&mut rx, &mut scratch).await.unwrap();
            writer.await.unwrap();

            assert_eq!(got.len(), payload.len(), "chunk_size={}", chunk_size);
            assert_eq!(&got[..], &payload[..], "chunk_size={}", chunk_size);
        }
    }

    #[tokio::test]
    async fn test_truncated_header_is_fatal() {
        let (mut tx, mut rx) = tokio::io::duplex(64);
        tx.write_all(&[1, 0]).await.unwrap();
        drop(tx);

        let mut scratch = BytesMut::new();
        let err = read_frame(&mut rx, &mut scratch).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::Truncated)
        ));
    }

    #[tokio::test]
    async fn test_truncated_payload_is_fatal() {
        let (mut tx, mut rx) = tokio::io::duplex(64);
        tx.write_all(&20i32.to_le_bytes()).await.unwrap();
        tx.write_all(&[0u8; 5]).await.unwrap();
        drop(tx);

        let mut scratch = BytesMut::new();
        let err = read_frame(&mut rx, &mut scratch).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::Truncated)
        ));
    }

    #[tokio::test]
    async fn test_oversized_length_rejected() {
        let (mut tx, mut rx) = tokio::io::duplex(64);
        tx.write_all(&(MAX_PAYLOAD_BYTES as i32 + 1).to_le_bytes())
            .await
            .unwrap();

        let mut scratch = BytesMut::new();
        let err = read_frame(&mut rx, &mut scratch).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::Oversized(_))
        ));
    }

    #[tokio::test]
    async fn test_negative_length_rejected() {
        let (mut tx, mut rx) = tokio::io::duplex(64);
        tx.write_all(&(-1i32).to_le_bytes()).await.unwrap();

        let mut scratch = BytesMut::new();
        let err = read_frame(&mut rx, &mut scratch).await.unwrap_err();
        assert!(matches!(err, Error::Protocol(ProtocolError::Oversized(_))));
    }

    #[tokio::test]
    async fn test_oversized_write_refused() {
        let (mut tx, _rx) = tokio::io::duplex(64);
        let payload = vec![0u8; MAX_PAYLOAD_BYTES + 2];
        let err = write_frame(&mut tx, &payload).await.unwrap_err();
        assert!(matches!(err, Error::CapacityExceeded { .. }));
    }

    #[tokio::test]
    async fn test_empty_frame() {
        let (mut tx, mut rx) = tokio::io::duplex(64);
        write_frame(&mut tx, &[]).await.unwrap();

        let mut scratch = BytesMut::new();
        let got = read_frame(&mut rx, &mut scratch).await.unwrap();
        assert!(got.is_empty());
    }
}
