//! Multi-camera stitching example
//!
//! Run with: cargo run --example stitching_client [ADDR]...
//!
//! Examples:
//!   cargo run --example stitching_client 192.168.2.8:8000 192.168.2.9:8000
//!   cargo run --example stitching_client            # one camera on localhost
//!
//! Connects to each camera server in registration order, then pulls in
//! lock-step and logs every merged cloud. Real deployments would load
//! per-camera registration transforms and hand merged clouds to a
//! visualizer or writer sink.

use pcs_rs::client::{ClientConfig, StreamClient};
use pcs_rs::cloud::{CameraTransform, PointCloud};
use pcs_rs::error::Result;
use pcs_rs::stitch::StitchCoordinator;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut addrs: Vec<String> = std::env::args().skip(1).collect();
    if addrs.is_empty() {
        addrs.push("127.0.0.1:8000".to_string());
    }

    // The first camera defines the global frame; additional cameras
    // would carry transforms produced by offline registration.
    let mut clients = Vec::new();
    for addr in &addrs {
        let config = ClientConfig::new(addr.parse().expect("invalid camera address"))
            .transform(CameraTransform::identity())
            .downsample(1);
        clients.push(StreamClient::connect(config).await?);
    }

    let mut coordinator = StitchCoordinator::new(clients);
    tracing::info!(cameras = coordinator.camera_count(), "Stitching started");

    let mut frame_count = 0u64;
    let mut sink = |cloud: &PointCloud| -> Result<()> {
        frame_count += 1;
        if frame_count % 30 == 0 {
            tracing::info!(frame = frame_count, points = cloud.len(), "Merged cloud");
        }
        Ok(())
    };

    let result = coordinator.run(&mut sink).await;
    tracing::info!(stats = %coordinator.stats(), "Stitching finished");
    result
}
