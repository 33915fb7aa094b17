//! Multi-camera stitching coordinator
//!
//! Drives N camera connections in lock-step: every iteration pulls one
//! frame from each camera concurrently, joins all pulls (the slowest
//! camera bounds the iteration), merges the decoded, transformed clouds
//! in connection registration order, and hands the merged cloud to an
//! external sink. No partial iteration is ever published: either every
//! camera contributes or the coordinator is still gathering.
//!
//! There is no per-camera timeout and no cancellation; a stalled camera
//! stalls the stitched pipeline indefinitely.

use std::time::Instant;

use crate::client::StreamClient;
use crate::cloud::PointCloud;
use crate::error::{Error, Result};
use crate::stats::StitchStats;

/// External consumer of merged clouds (visualizer, writer, ...)
pub trait CloudSink {
    /// Receive one merged cloud; called once per completed iteration
    fn publish(&mut self, cloud: &PointCloud) -> Result<()>;
}

impl<F> CloudSink for F
where
    F: FnMut(&PointCloud) -> Result<()>,
{
    fn publish(&mut self, cloud: &PointCloud) -> Result<()> {
        self(cloud)
    }
}

/// Coordinator state, observable between iterations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    /// No iteration in flight
    Idle,
    /// An iteration is gathering frames from the cameras
    Gathering,
}

/// Lock-step fan-out/fan-in coordinator over N camera connections
pub struct StitchCoordinator {
    clients: Vec<StreamClient>,
    stitched: PointCloud,
    state: CoordinatorState,
    stats: StitchStats,
}

impl StitchCoordinator {
    /// Create a coordinator over connections in registration order.
    ///
    /// Merge order across cameras follows this order; order within one
    /// camera's cloud is preserved as decoded.
    pub fn new(clients: Vec<StreamClient>) -> Self {
        Self {
            clients,
            stitched: PointCloud::new(),
            state: CoordinatorState::Idle,
            stats: StitchStats::new(),
        }
    }

    /// Number of camera connections
    pub fn camera_count(&self) -> usize {
        self.clients.len()
    }

    /// Current state
    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    /// Stitching statistics accumulated so far
    pub fn stats(&self) -> &StitchStats {
        &self.stats
    }

    /// Run one lock-step iteration and return the merged cloud.
    ///
    /// Spawns one pull task per camera, then joins all of them; the
    /// join is a hard barrier. Any pull failure fails the iteration
    /// with nothing published.
    pub async fn run_iteration(&mut self) -> Result<&PointCloud> {
        self.state = CoordinatorState::Gathering;
        let started = Instant::now();

        // Fan out: one task per camera, each owning its connection for
        // the duration of the pull. Sockets are only ever reused
        // sequentially between iterations.
        let handles: Vec<_> = std::mem::take(&mut self.clients)
            .into_iter()
            .map(|mut client| {
                tokio::spawn(async move {
                    let result = client.pull().await;
                    (client, result)
                })
            })
            .collect();

        // Fan in: join in registration order.
        let mut clouds = Vec::with_capacity(handles.len());
        let mut first_error = None;
        for handle in handles {
            let (client, result) = handle.await.map_err(|e| {
                Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e))
            })?;
            self.clients.push(client);
            match result {
                Ok(cloud) => clouds.push(cloud),
                Err(e) if first_error.is_none() => first_error = Some(e),
                Err(_) => {}
            }
        }

        self.state = CoordinatorState::Idle;
        if let Some(e) = first_error {
            return Err(e);
        }

        // Merge in connection order into the reused stitched cloud.
        self.stitched.clear();
        for cloud in &clouds {
            self.stitched.append_cloud(cloud);
        }

        self.stats.record_iteration(self.stitched.len(), started.elapsed());
        tracing::debug!(
            cameras = self.clients.len(),
            points = self.stitched.len(),
            "Iteration stitched"
        );
        Ok(&self.stitched)
    }

    /// Loop iterations forever, publishing each merged cloud to `sink`.
    ///
    /// Returns the first pull or sink error; all failures are fatal to
    /// the pipeline.
    pub async fn run(&mut self, sink: &mut dyn CloudSink) -> Result<()> {
        loop {
            self.run_iteration().await?;
            sink.publish(&self.stitched)?;
        }
    }
}
