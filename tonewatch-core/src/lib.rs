//! # tonewatch-core
//!
//! Goertzel-based detection of telephony tones (call progress, DTMF,
//! disconnect, supervisory signaling) in a stream of 16-bit linear PCM.
//!
//! ## Architecture
//!
//! ```text
//! impl Read (slin) → TargetFilter::ingest (ingest thread)
//!                          │ BlockSummary per block, try_send
//!                    bounded crossbeam queue (drop newest when full)
//!                          │
//!                    ToneDetector run-length loop (caller thread)
//!                          │
//!                    Ok(true) once the run covers min_duration
//! ```
//!
//! Use [`detect_presence`] / [`detect_absence`] for a yes/no answer, or
//! drive a [`TargetFilter`] directly for raw per-block magnitudes.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod blocksize;
pub mod constants;
pub mod detector;
pub mod error;
pub mod filter;
pub mod pcm;

#[cfg(test)]
pub(crate) mod test_signal;

// Convenience re-exports for downstream crates
pub use blocksize::{commensurate_block_size, optimal_block_size, BlockSizeStrategy};
pub use detector::{
    detect_absence, detect_presence, CancelToken, DetectorConfig, ToneDetector,
};
pub use error::{Result, ToneError};
pub use filter::{
    BlockReceiver, BlockSummary, FilterConfig, FilterHandle, GoertzelConstants, IngestReport,
    MagnitudeMode, TargetFilter,
};
