//! Per-filter tunables.

use serde::{Deserialize, Serialize};

use crate::{
    blocksize::BlockSizeStrategy,
    constants::{BLOCK_BUFFER_SIZE, TONE_THRESHOLD},
    error::{Result, ToneError},
};

/// How the squared magnitude of a completed block is computed.
///
/// Both modes are normalised by `(N/2)²`, so a full-scale sine of amplitude
/// `A` sitting on the target bin yields roughly `A²` either way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MagnitudeMode {
    /// Real/imaginary decomposition using the precomputed sin/cos.
    #[default]
    Standard,
    /// Phase-insensitive `q1² + q2² − q1·q2·coeff`; skips the sin/cos terms.
    Optimized,
}

/// Configuration for a `TargetFilter`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterConfig {
    /// Squared-magnitude level a block must strictly exceed to count as
    /// present. Default: 7.8e7.
    pub threshold: f64,
    /// Block summaries buffered for the consumer before new ones are
    /// dropped. Default: 50.
    pub queue_capacity: usize,
    /// Magnitude formula. Default: `Standard`.
    pub magnitude_mode: MagnitudeMode,
    /// Block-size policy used when `block_size` is `None`.
    pub block_size_strategy: BlockSizeStrategy,
    /// Fixed block size (samples), bypassing the strategy. Useful with the
    /// reference sizes in `constants`.
    pub block_size: Option<usize>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            threshold: TONE_THRESHOLD,
            queue_capacity: BLOCK_BUFFER_SIZE,
            magnitude_mode: MagnitudeMode::default(),
            block_size_strategy: BlockSizeStrategy::default(),
            block_size: None,
        }
    }
}

impl FilterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.threshold.is_nan() {
            return Err(ToneError::InvalidConfig("threshold is NaN".into()));
        }
        if self.queue_capacity == 0 {
            return Err(ToneError::InvalidConfig(
                "queue capacity must be at least 1".into(),
            ));
        }
        if self.block_size == Some(0) {
            return Err(ToneError::InvalidConfig("block size must be positive".into()));
        }
        Ok(())
    }
}
