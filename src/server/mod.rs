//! Camera-side stream server
//!
//! Owns one listening socket and serves one consumer at a time. Each
//! accepted pull command obtains a frame from the external
//! [`FrameSource`], encodes it, and sends it before draining the next
//! command: fully synchronous request/response, no pipelining and no
//! buffered in-flight frames.

mod config;

pub use config::ServerConfig;

use bytes::Bytes;
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;

use crate::cloud::PointBuffer;
use crate::encoder::{OwnedRawFrame, PointEncoder};
use crate::error::{Error, ProtocolError, Result};
use crate::protocol::{self, PULL_XYZRGB};
use crate::stats::EncodeStats;

/// External frame source (live sensor or recorded-capture playback)
///
/// The server pulls exactly one frame per consumer request. Acquiring
/// frames from physical hardware lives behind this seam, outside the
/// crate.
pub trait FrameSource: Send {
    /// Produce the next frame to stream
    fn next_frame(&mut self) -> Result<OwnedRawFrame>;
}

impl<F> FrameSource for F
where
    F: FnMut() -> Result<OwnedRawFrame> + Send,
{
    fn next_frame(&mut self) -> Result<OwnedRawFrame> {
        self()
    }
}

/// Point-cloud stream server for one camera process
pub struct StreamServer<S: FrameSource> {
    config: ServerConfig,
    source: S,
    encoder: PointEncoder,
    scratch: PointBuffer,
    stats: EncodeStats,
}

impl<S: FrameSource> StreamServer<S> {
    /// Create a server over the given frame source
    pub fn new(config: ServerConfig, source: S) -> Self {
        let encoder = PointEncoder::new(config.encoder.clone());
        Self {
            config,
            source,
            encoder,
            scratch: PointBuffer::with_max_capacity(),
            stats: EncodeStats::new(),
        }
    }

    /// Encoding statistics accumulated so far
    pub fn stats(&self) -> &EncodeStats {
        &self.stats
    }

    /// Bind, accept one consumer, and serve it until it disconnects.
    ///
    /// Connection-setup failures and protocol violations return `Err`;
    /// a consumer closing between frames returns `Ok`.
    pub async fn run(&mut self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Stream server listening");

        let (socket, peer_addr) = listener.accept().await?;
        tracing::info!(peer = %peer_addr, "Consumer connected");

        if self.config.tcp_nodelay {
            socket.set_nodelay(true)?;
        }

        let result = self.serve(socket).await;
        match &result {
            Ok(()) => tracing::info!(peer = %peer_addr, "Consumer disconnected"),
            Err(e) => tracing::error!(peer = %peer_addr, error = %e, "Connection failed"),
        }
        result
    }

    /// Serve pull requests on an established connection.
    ///
    /// Any command byte other than [`PULL_XYZRGB`] is a fatal protocol
    /// violation for the connection.
    pub async fn serve<Rw>(&mut self, mut stream: Rw) -> Result<()>
    where
        Rw: AsyncRead + AsyncWrite + Unpin,
    {
        loop {
            match protocol::read_command(&mut stream).await? {
                None => return Ok(()),
                Some(PULL_XYZRGB) => {
                    let payload = self.encode_next_frame()?;
                    protocol::write_frame(&mut stream, &payload).await?;
                }
                Some(other) => {
                    return Err(ProtocolError::UnexpectedCommand(other).into());
                }
            }
        }
    }

    /// Pull one frame from the source and encode it.
    ///
    /// A frame exceeding the scratch capacity fails that frame only:
    /// the consumer receives an empty payload and the connection
    /// stays up.
    fn encode_next_frame(&mut self) -> Result<Bytes> {
        let frame = self.source.next_frame()?;
        let started = Instant::now();

        match self.encoder.encode(&frame.as_frame(), &mut self.scratch) {
            Ok(bytes) => {
                self.stats
                    .record_frame(frame.positions.len(), bytes, started.elapsed());
                tracing::debug!(
                    points_in = frame.positions.len(),
                    bytes = bytes,
                    "Frame encoded"
                );
                Ok(self.scratch.to_payload())
            }
            Err(Error::CapacityExceeded { needed, capacity }) => {
                tracing::warn!(
                    needed = needed,
                    capacity = capacity,
                    "Frame exceeds scratch capacity, sending empty frame"
                );
                Ok(Bytes::new())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::EncoderConfig;

    fn test_frame(n: usize) -> OwnedRawFrame {
        OwnedRawFrame {
            positions: (0..n).map(|i| [i as f32 * 0.001, 0.0, 1.0]).collect(),
            tex_coords: vec![[0.0, 0.0]; n],
            color_data: vec![128; 12],
            width: 2,
            height: 2,
            bytes_per_pixel: 3,
            stride_bytes: 6,
        }
    }

    fn server_with_frames(n: usize) -> StreamServer<impl FrameSource> {
        StreamServer::new(
            ServerConfig::default().encoder(EncoderConfig::default()),
            move || -> Result<OwnedRawFrame> { Ok(test_frame(n)) },
        )
    }

    #[tokio::test]
    async fn test_serves_one_frame_per_pull() {
        let mut server = server_with_frames(3);
        let (mut consumer, transport) = tokio::io::duplex(64 * 1024);

        let task = tokio::spawn(async move { server.serve(transport).await });

        let mut scratch = bytes::BytesMut::new();
        for _ in 0..2 {
            protocol::write_command(&mut consumer, PULL_XYZRGB)
                .await
                .unwrap();
            let payload = protocol::read_frame(&mut consumer, &mut scratch)
                .await
                .unwrap();
            assert_eq!(payload.len(), 3 * 10);
        }

        drop(consumer);
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_unexpected_command_is_fatal() {
        let mut server = server_with_frames(1);
        let (mut consumer, transport) = tokio::io::duplex(1024);

        let task = tokio::spawn(async move { server.serve(transport).await });

        protocol::write_command(&mut consumer, b'Q').await.unwrap();
        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::UnexpectedCommand(b'Q'))
        ));
    }

    #[tokio::test]
    async fn test_reserved_xyz_command_rejected() {
        let mut server = server_with_frames(1);
        let (mut consumer, transport) = tokio::io::duplex(1024);

        let task = tokio::spawn(async move { server.serve(transport).await });

        protocol::write_command(&mut consumer, crate::protocol::PULL_XYZ)
            .await
            .unwrap();
        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::UnexpectedCommand(_))
        ));
    }

    #[tokio::test]
    async fn test_clean_disconnect_returns_ok() {
        let mut server = server_with_frames(1);
        let (consumer, transport) = tokio::io::duplex(1024);

        let task = tokio::spawn(async move { server.serve(transport).await });
        drop(consumer);
        task.await.unwrap().unwrap();
    }
}
