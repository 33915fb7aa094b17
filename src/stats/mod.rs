//! Streaming statistics

mod metrics;

pub use metrics::{EncodeStats, StitchStats};
