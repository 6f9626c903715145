//! Progress reporting for a sweep (ids processed, throughput, ETA).
//!
//! The run loop emits a snapshot every `progress_every` ids; consumers compute
//! rate and remaining time from it.

/// Snapshot of sweep progress (CLI-friendly).
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressStats {
    /// Ids attempted so far (skipped ids excluded).
    pub processed: u64,
    /// Artifacts saved so far.
    pub succeeded: u64,
    /// Ids still ahead of the cursor, skipped ones included.
    pub remaining: u64,
    /// Elapsed time since the run started (seconds).
    pub elapsed_secs: f64,
}

impl ProgressStats {
    /// Ids per second (0 if elapsed is 0).
    pub fn ids_per_sec(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.processed as f64 / self.elapsed_secs
    }

    /// Estimated seconds remaining (None if throughput is still unknown).
    pub fn eta_secs(&self) -> Option<f64> {
        if self.remaining == 0 {
            return Some(0.0);
        }
        let rate = self.ids_per_sec();
        if rate <= 0.0 {
            return None;
        }
        Some(self.remaining as f64 / rate)
    }
}
