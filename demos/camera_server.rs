//! Camera server example with a synthetic frame source
//!
//! Run with: cargo run --example camera_server [BIND_ADDR]
//!
//! Examples:
//!   cargo run --example camera_server                  # binds to 0.0.0.0:8000
//!   cargo run --example camera_server 127.0.0.1:8001
//!
//! Serves one consumer at a time. Each pull request encodes a synthetic
//! sweeping point cloud; swap `SyntheticSource` for a sensor-backed
//! `FrameSource` to stream real captures.

use std::net::SocketAddr;

use pcs_rs::encoder::{EncoderConfig, OwnedRawFrame};
use pcs_rs::error::Result;
use pcs_rs::server::{FrameSource, ServerConfig, StreamServer};

/// Generates a deterministic sweeping cloud, one variation per frame
struct SyntheticSource {
    frame_number: u64,
    points: usize,
}

impl SyntheticSource {
    fn new(points: usize) -> Self {
        Self {
            frame_number: 0,
            points,
        }
    }
}

impl FrameSource for SyntheticSource {
    fn next_frame(&mut self) -> Result<OwnedRawFrame> {
        self.frame_number += 1;
        let phase = self.frame_number as f32 * 0.05;

        let width = 64;
        let height = 48;
        let bpp = 3;
        let stride = width * bpp;

        let mut color_data = vec![0u8; stride * height];
        for y in 0..height {
            for x in 0..width {
                let idx = x * bpp + y * stride;
                color_data[idx] = (x * 4) as u8;
                color_data[idx + 1] = (y * 5) as u8;
                color_data[idx + 2] = 200;
            }
        }

        let mut positions = Vec::with_capacity(self.points);
        let mut tex_coords = Vec::with_capacity(self.points);
        for i in 0..self.points {
            let t = i as f32 / self.points as f32;
            positions.push([
                (t * 12.0 + phase).sin() * 1.5,
                t * 2.0 - 1.0,
                1.0 + (t * 7.0 + phase).cos() * 0.4,
            ]);
            tex_coords.push([t, (t * 3.0).fract()]);
        }

        Ok(OwnedRawFrame {
            positions,
            tex_coords,
            color_data,
            width,
            height,
            bytes_per_pixel: bpp,
            stride_bytes: stride,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let bind_addr: SocketAddr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "0.0.0.0:8000".to_string())
        .parse()
        .expect("invalid bind address");

    let config = ServerConfig::with_addr(bind_addr)
        .encoder(EncoderConfig::default().filter(true).vectorized(true).threads(4));

    let mut server = StreamServer::new(config, SyntheticSource::new(100_000));
    let result = server.run().await;

    tracing::info!(stats = %server.stats(), "Server finished");
    result
}
