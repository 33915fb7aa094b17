//! Statistics for encoding and stitching

use std::time::Duration;

/// Encoder-side statistics for one server
#[derive(Debug, Clone, Default)]
pub struct EncodeStats {
    /// Frames encoded
    pub frames: u64,
    /// Input points across all frames
    pub points_in: u64,
    /// Payload bytes produced across all frames
    pub bytes_out: u64,
    /// Cumulative encode time
    pub encode_time: Duration,
}

impl EncodeStats {
    /// Create new stats tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one encoded frame
    pub fn record_frame(&mut self, points_in: usize, bytes_out: usize, elapsed: Duration) {
        self.frames += 1;
        self.points_in += points_in as u64;
        self.bytes_out += bytes_out as u64;
        self.encode_time += elapsed;
    }

    /// Average encode time per frame in milliseconds
    pub fn avg_frame_millis(&self) -> f64 {
        if self.frames == 0 {
            return 0.0;
        }
        self.encode_time.as_secs_f64() * 1000.0 / self.frames as f64
    }

    /// Sustained frame rate implied by the average encode time
    pub fn avg_fps(&self) -> f64 {
        let ms = self.avg_frame_millis();
        if ms > 0.0 {
            1000.0 / ms
        } else {
            0.0
        }
    }

    /// Average payload size per frame in megabytes
    pub fn avg_frame_megabytes(&self) -> f64 {
        if self.frames == 0 {
            return 0.0;
        }
        self.bytes_out as f64 / self.frames as f64 / 1_000_000.0
    }
}

impl std::fmt::Display for EncodeStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "frames={} avg_frame_time={:.2}ms avg_fps={:.1} avg_bytes_per_frame={:.2}MB",
            self.frames,
            self.avg_frame_millis(),
            self.avg_fps(),
            self.avg_frame_megabytes()
        )
    }
}

/// Coordinator-side statistics across stitching iterations
#[derive(Debug, Clone, Default)]
pub struct StitchStats {
    /// Completed iterations
    pub iterations: u64,
    /// Points merged across all iterations
    pub points_merged: u64,
    /// Cumulative iteration time (pull barrier + merge)
    pub stitch_time: Duration,
}

impl StitchStats {
    /// Create new stats tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed iteration
    pub fn record_iteration(&mut self, points: usize, elapsed: Duration) {
        self.iterations += 1;
        self.points_merged += points as u64;
        self.stitch_time += elapsed;
    }

    /// Average iteration time in milliseconds
    pub fn avg_iteration_millis(&self) -> f64 {
        if self.iterations == 0 {
            return 0.0;
        }
        self.stitch_time.as_secs_f64() * 1000.0 / self.iterations as f64
    }
}

impl std::fmt::Display for StitchStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "iterations={} avg_iteration={:.2}ms points_merged={}",
            self.iterations,
            self.avg_iteration_millis(),
            self.points_merged
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_stats_new() {
        let stats = EncodeStats::new();
        assert_eq!(stats.frames, 0);
        assert_eq!(stats.avg_frame_millis(), 0.0);
        assert_eq!(stats.avg_fps(), 0.0);
    }

    #[test]
    fn test_encode_stats_averages() {
        let mut stats = EncodeStats::new();
        stats.record_frame(1000, 2_000_000, Duration::from_millis(10));
        stats.record_frame(1000, 4_000_000, Duration::from_millis(30));

        assert_eq!(stats.frames, 2);
        assert!((stats.avg_frame_millis() - 20.0).abs() < 1e-9);
        assert!((stats.avg_fps() - 50.0).abs() < 1e-9);
        assert!((stats.avg_frame_megabytes() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_stitch_stats_record() {
        let mut stats = StitchStats::new();
        stats.record_iteration(500, Duration::from_millis(8));
        stats.record_iteration(700, Duration::from_millis(12));

        assert_eq!(stats.iterations, 2);
        assert_eq!(stats.points_merged, 1200);
        assert!((stats.avg_iteration_millis() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_display_does_not_panic_when_empty() {
        let _ = EncodeStats::new().to_string();
        let _ = StitchStats::new().to_string();
    }
}
