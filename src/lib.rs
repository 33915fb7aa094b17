//! # pcs-rs
//!
//! Point-cloud streaming client/server library.
//!
//! Streams per-frame 3-D point clouds (position + color) from depth/RGB
//! camera processes to remote consumers over TCP, and stitches streams
//! from several independently registered cameras into one combined
//! cloud.
//!
//! ```text
//! sensor source -> PointEncoder -> wire frame (server)
//!      -> TCP -> wire frame (client) -> decode + transform
//!      -> StitchCoordinator merge -> sink
//! ```
//!
//! ## Components
//!
//! - [`encoder::PointEncoder`]: quantizes, filters, and packs one raw
//!   depth+color frame into the compact wire representation, in
//!   parallel across CPU cores with an optional 4-wide vectorized path
//! - [`protocol`]: the pull-based, length-prefixed wire protocol
//! - [`server::StreamServer`]: serves one camera's frames to a consumer
//! - [`client::StreamClient`]: one connection per remote camera;
//!   pulls, decodes, decimates, and applies that camera's registration
//!   transform
//! - [`stitch::StitchCoordinator`]: lock-step fan-out/fan-in over N
//!   cameras, merging each iteration into one cloud for an external
//!   sink
//!
//! ## Example: serving a camera
//!
//! ```no_run
//! use pcs_rs::encoder::{EncoderConfig, OwnedRawFrame};
//! use pcs_rs::server::{ServerConfig, StreamServer};
//!
//! # async fn example() -> pcs_rs::error::Result<()> {
//! let config = ServerConfig::default()
//!     .encoder(EncoderConfig::default().filter(true).threads(4));
//!
//! let mut server = StreamServer::new(config, || -> pcs_rs::error::Result<OwnedRawFrame> {
//!     // Pull one frame from the sensor SDK here.
//!     Ok(OwnedRawFrame::default())
//! });
//! server.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod cloud;
pub mod encoder;
pub mod error;
pub mod protocol;
pub mod server;
pub mod stats;
pub mod stitch;

pub use client::{ClientConfig, StreamClient};
pub use cloud::{CameraTransform, Point, PointBuffer, PointCloud};
pub use encoder::{EncoderConfig, PointEncoder};
pub use error::{Error, Result};
pub use server::{FrameSource, ServerConfig, StreamServer};
pub use stitch::{CloudSink, StitchCoordinator};
