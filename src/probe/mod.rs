//! Throughput probing through an external transfer tool
//!
//! A probe forces the download of the test URL through one candidate address
//! and reports the average rate. The [`TransferTool`] trait is the seam the
//! runner depends on; [`CurlTool`] is the production implementation.

mod curl;

pub use curl::{CurlTool, NULL_DEVICE, WRITE_OUT_FORMAT};

use crate::{
    defaults::COMPLETENESS_RATIO,
    models::{Candidate, ProbeOutcome, TransferStats},
};
use async_trait::async_trait;

/// Measures download throughput through a single candidate
#[async_trait]
pub trait TransferTool: Send + Sync {
    /// Probe `candidate`. Failures are reported in the outcome, never as errors.
    async fn measure(&self, candidate: &Candidate) -> ProbeOutcome;
}

/// Turn the statistics of a finished transfer into an outcome.
///
/// Short transfers and zero rates are [`ProbeOutcome::incomplete`].
pub fn evaluate(stats: TransferStats, expected_bytes: u64, attempts: u32) -> ProbeOutcome {
    if stats.is_complete(expected_bytes, COMPLETENESS_RATIO) && stats.speed_bytes_per_sec > 0.0 {
        ProbeOutcome::success(stats, attempts)
    } else {
        ProbeOutcome::incomplete(stats, attempts)
    }
}
