//! Per-block output of a `TargetFilter`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Result of one completed block for a target frequency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSummary {
    /// Squared relative magnitude of the target frequency in this block.
    pub magnitude2: f64,
    /// Frequency being detected (Hz).
    pub frequency: f64,
    /// Elapsed signal time this block represents.
    pub duration: Duration,
    /// Number of samples in the block.
    pub samples: usize,
    /// `magnitude2` strictly exceeded the filter's threshold.
    pub present: bool,
}

/// Counters returned by `TargetFilter::ingest`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    /// Samples read from the stream.
    pub samples: u64,
    /// Blocks completed.
    pub blocks: u64,
    /// Summaries dropped because the output queue was full.
    pub dropped: u64,
}
