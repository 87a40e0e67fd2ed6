use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::WorkerRunSummary;

/// Aggregate metrics derived from the final block metadata of a successful
/// run. Purely read-only; nothing here feeds back into correctness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub input_bytes: u64,
    pub output_bytes: u64,
    pub blocks_total: usize,
    pub elapsed: Duration,
    pub workers: Vec<WorkerRunSummary>,
}

impl RunStats {
    /// Compression ratio `1 - output/input`. NaN for the degenerate
    /// zero-byte input, the only case where it is undefined.
    pub fn ratio(&self) -> f64 {
        if self.input_bytes == 0 {
            f64::NAN
        } else {
            1.0 - self.output_bytes as f64 / self.input_bytes as f64
        }
    }

    /// Ratio expressed as percent saved, the way the summary prints it.
    pub fn space_saving_percent(&self) -> f64 {
        self.ratio() * 100.0
    }

    /// Input bytes per second; elapsed is floored at 1 microsecond.
    pub fn throughput_bps(&self) -> f64 {
        self.input_bytes as f64 / self.elapsed.as_secs_f64().max(1e-6)
    }
}
