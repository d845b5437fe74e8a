//! Block-size (N) selection for the Goertzel filter.
//!
//! ## Periodic (default)
//!
//! ```text
//! baseline = 20 ms of samples
//! periods  = max(5, whole target periods in baseline)
//! N        = periods · rate / f            (truncated)
//! ```
//!
//! The block boundary lands on a whole number of target cycles, so the target
//! sits exactly on bin `k = periods` and leakage out of the bin is minimal.
//! Low frequencies get a longer block rather than fewer than five periods.
//!
//! ## Commensurate
//!
//! Searches downward from the minimum-duration window for the largest N that
//! holds an integer number of target periods. Kept as an alternative policy;
//! the filter uses it only when `FilterConfig::block_size_strategy` asks.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Shortest analysis window the periodic strategy will produce.
pub const MIN_BLOCK_WINDOW: Duration = Duration::from_millis(20);

/// Fewest whole target periods a periodic block may contain.
pub const MIN_BLOCK_PERIODS: f64 = 5.0;

/// Tolerance used when deciding whether a period count is integral.
const INTEGRAL_EPSILON: f64 = 1e-9;

/// How a `TargetFilter` derives its block size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockSizeStrategy {
    /// 20 ms floor, at least five whole periods. See [`optimal_block_size`].
    #[default]
    Periodic,
    /// Largest period-aligned N within the minimum duration.
    /// See [`commensurate_block_size`].
    Commensurate,
}

impl BlockSizeStrategy {
    pub fn block_size(self, frequency: f64, sample_rate: f64, min_duration: Duration) -> usize {
        match self {
            BlockSizeStrategy::Periodic => optimal_block_size(frequency, sample_rate, min_duration),
            BlockSizeStrategy::Commensurate => {
                commensurate_block_size(frequency, sample_rate, min_duration)
            }
        }
    }
}

/// Compute a frequency-aligned block size of at least 20 ms.
///
/// `min_duration` does not influence the result; the 20 ms floor is what
/// bounds the block from below. Inputs are assumed positive and finite.
/// The result is always at least 1.
pub fn optimal_block_size(frequency: f64, sample_rate: f64, _min_duration: Duration) -> usize {
    let baseline = (MIN_BLOCK_WINDOW.as_secs_f64() * sample_rate).floor();

    let periods = (baseline * frequency / sample_rate)
        .floor()
        .max(MIN_BLOCK_PERIODS);

    let n = (periods * sample_rate / frequency).floor();
    (n as usize).max(1)
}

/// Largest block no longer than `min_duration` whose length is an integer
/// multiple of the target period.
///
/// Falls back to the full `min_duration` window when no such block exists,
/// and to 1 when that window holds no samples at all.
pub fn commensurate_block_size(frequency: f64, sample_rate: f64, min_duration: Duration) -> usize {
    let max_n = (min_duration.as_secs_f64() * sample_rate).floor() as usize;
    if max_n < 2 {
        return max_n.max(1);
    }

    (2..=max_n)
        .rev()
        .find(|&n| is_integral(n as f64 * frequency / sample_rate))
        .unwrap_or(max_n)
}

fn is_integral(x: f64) -> bool {
    (x - x.round()).abs() < INTEGRAL_EPSILON
}
