//! Consumer-side camera connection
//!
//! One [`StreamClient`] per remote camera, bound 1:1 to that camera's
//! registration transform. `pull()` is the client half of the
//! request/response exchange: send the command byte, read exactly one
//! frame, decode the wire records back into meters, decimate, and map
//! into the shared global frame.

use std::net::SocketAddr;

use bytes::{Buf, Bytes, BytesMut};
use tokio::net::TcpStream;

use crate::cloud::{unpack_color, CameraTransform, PointCloud, BYTES_PER_POINT, CONV_RATE};
use crate::error::{ProtocolError, Result};
use crate::protocol::{self, PULL_XYZRGB};

/// Client configuration for one camera connection
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Camera server address
    pub addr: SocketAddr,

    /// Registration transform mapping this camera into the global frame
    pub transform: CameraTransform,

    /// Keep every Nth point (1 = keep all)
    pub downsample: usize,

    /// Enable TCP_NODELAY
    pub tcp_nodelay: bool,
}

impl ClientConfig {
    /// Config with the identity transform and no decimation
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            transform: CameraTransform::identity(),
            downsample: 1,
            tcp_nodelay: true,
        }
    }

    /// Set the registration transform
    pub fn transform(mut self, transform: CameraTransform) -> Self {
        self.transform = transform;
        self
    }

    /// Set the decimation factor (0 is treated as 1)
    pub fn downsample(mut self, factor: usize) -> Self {
        self.downsample = factor.max(1);
        self
    }
}

/// A live connection to one camera server
pub struct StreamClient {
    transport: Transport,
    transform: CameraTransform,
    downsample: usize,
    scratch: BytesMut,
}

/// Either a real socket or an in-memory stream for tests
enum Transport {
    Tcp(TcpStream),
    #[cfg(test)]
    Duplex(tokio::io::DuplexStream),
}

impl StreamClient {
    /// Connect to the camera server.
    ///
    /// Connection failure is fatal to the caller's setup phase; there
    /// is no retry.
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let socket = TcpStream::connect(config.addr).await?;
        if config.tcp_nodelay {
            socket.set_nodelay(true)?;
        }
        tracing::info!(addr = %config.addr, "Connected to camera");

        Ok(Self {
            transport: Transport::Tcp(socket),
            transform: config.transform,
            downsample: config.downsample.max(1),
            scratch: BytesMut::new(),
        })
    }

    #[cfg(test)]
    pub(crate) fn over_duplex(stream: tokio::io::DuplexStream, config: &ClientConfig) -> Self {
        Self {
            transport: Transport::Duplex(stream),
            transform: config.transform,
            downsample: config.downsample.max(1),
            scratch: BytesMut::new(),
        }
    }

    /// This camera's registration transform
    pub fn transform(&self) -> &CameraTransform {
        &self.transform
    }

    /// Pull one frame and decode it into the global frame.
    ///
    /// Strictly half-duplex: the previous frame is fully consumed
    /// before this sends the next request, so at most one frame is ever
    /// in flight on the connection.
    pub async fn pull(&mut self) -> Result<PointCloud> {
        let payload = match &mut self.transport {
            Transport::Tcp(s) => {
                protocol::write_command(s, PULL_XYZRGB).await?;
                protocol::read_frame(s, &mut self.scratch).await?
            }
            #[cfg(test)]
            Transport::Duplex(s) => {
                protocol::write_command(s, PULL_XYZRGB).await?;
                protocol::read_frame(s, &mut self.scratch).await?
            }
        };

        let cloud = self.decode(payload)?;
        tracing::debug!(points = cloud.len(), "Frame pulled");
        Ok(cloud)
    }

    /// Decode a wire payload: dequantize, decimate, transform.
    fn decode(&self, mut payload: Bytes) -> Result<PointCloud> {
        if payload.len() % BYTES_PER_POINT != 0 {
            return Err(ProtocolError::Malformed("payload not a whole number of records").into());
        }

        let total = payload.len() / BYTES_PER_POINT;
        let mut cloud = PointCloud::with_capacity(total / self.downsample + 1);

        for i in 0..total {
            let x = payload.get_i16_le();
            let y = payload.get_i16_le();
            let z = payload.get_i16_le();
            let w0 = payload.get_i16_le() as u16;
            let w1 = payload.get_i16_le() as u16;

            if i % self.downsample != 0 {
                continue;
            }

            let local = [
                x as f32 / CONV_RATE,
                y as f32 / CONV_RATE,
                z as f32 / CONV_RATE,
            ];
            cloud.push(self.transform.apply(local), unpack_color([w0, w1]));
        }

        Ok(cloud)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::Point;
    use tokio::io::AsyncWriteExt;

    fn wire_payload(points: &[Point]) -> Vec<u8> {
        let mut out = Vec::new();
        for p in points {
            for w in p.to_words() {
                out.extend_from_slice(&w.to_le_bytes());
            }
        }
        out
    }

    async fn pull_via_duplex(config: ClientConfig, payload: Vec<u8>) -> Result<PointCloud> {
        let (client_end, mut server_end) = tokio::io::duplex(64 * 1024);
        let mut client = StreamClient::over_duplex(client_end, &config);

        let server = tokio::spawn(async move {
            let cmd = protocol::read_command(&mut server_end).await.unwrap();
            assert_eq!(cmd, Some(PULL_XYZRGB));
            let mut framed = Vec::new();
            framed.extend_from_slice(&(payload.len() as i32).to_le_bytes());
            framed.extend_from_slice(&payload);
            server_end.write_all(&framed).await.unwrap();
        });

        let result = client.pull().await;
        server.await.unwrap();
        result
    }

    fn dummy_config() -> ClientConfig {
        ClientConfig::new("127.0.0.1:8000".parse().unwrap())
    }

    #[tokio::test]
    async fn test_pull_decodes_records() {
        let points = vec![
            Point::quantize([0.1, 0.2, 0.3], [10, 20, 30]),
            Point::quantize([-1.0, 0.0, 1.5], [255, 0, 128]),
        ];
        let cloud = pull_via_duplex(dummy_config(), wire_payload(&points))
            .await
            .unwrap();

        assert_eq!(cloud.len(), 2);
        for (i, p) in points.iter().enumerate() {
            let expected = p.position_m();
            for axis in 0..3 {
                assert!((cloud.positions[i][axis] - expected[axis]).abs() < 1e-6);
            }
            assert_eq!(cloud.colors[i], p.rgb());
        }
    }

    #[tokio::test]
    async fn test_pull_applies_transform() {
        let config = dummy_config().transform(CameraTransform::from_rotation_translation(
            [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            [1.0, 2.0, 3.0],
        ));
        let points = vec![Point::quantize([0.5, 0.5, 0.5], [0, 0, 0])];
        let cloud = pull_via_duplex(config, wire_payload(&points)).await.unwrap();

        assert!((cloud.positions[0][0] - 1.5).abs() < 1e-6);
        assert!((cloud.positions[0][1] - 2.5).abs() < 1e-6);
        assert!((cloud.positions[0][2] - 3.5).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_pull_downsamples_every_nth() {
        let points: Vec<Point> = (0..10)
            .map(|i| Point::quantize([i as f32 * 0.01, 0.0, 1.0], [i as u8, 0, 0]))
            .collect();
        let cloud = pull_via_duplex(dummy_config().downsample(3), wire_payload(&points))
            .await
            .unwrap();

        // Indexes 0, 3, 6, 9 survive, order preserved.
        assert_eq!(cloud.len(), 4);
        assert_eq!(cloud.colors[0][0], 0);
        assert_eq!(cloud.colors[1][0], 3);
        assert_eq!(cloud.colors[2][0], 6);
        assert_eq!(cloud.colors[3][0], 9);
    }

    #[tokio::test]
    async fn test_pull_rejects_ragged_payload() {
        let err = pull_via_duplex(dummy_config(), vec![0u8; 13])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Protocol(ProtocolError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_pull_empty_frame() {
        let cloud = pull_via_duplex(dummy_config(), Vec::new()).await.unwrap();
        assert!(cloud.is_empty());
    }

    #[test]
    fn test_downsample_zero_normalized() {
        let config = dummy_config().downsample(0);
        assert_eq!(config.downsample, 1);
    }
}
