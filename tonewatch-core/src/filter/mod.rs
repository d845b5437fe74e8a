//! `TargetFilter` — streaming Goertzel detector for one frequency.
//!
//! ## Per sample
//!
//! ```text
//! q  = coeff·q1 − q2 + x
//! q2 = q1
//! q1 = q
//! ```
//!
//! Every N samples the squared magnitude is computed, a [`BlockSummary`] is
//! offered to the output queue (dropped if the queue is full), and
//! `q1 = q2 = 0` for the next block.
//!
//! ## Lifecycle
//!
//! ```text
//! TargetFilter::new()
//!     └─► set_block_size()   (optional, recomputes sin/cos/coeff)
//!         └─► attach_output() → BlockReceiver
//!             └─► ingest()    → runs until EOF, read error, or stop
//!                 └─► stop()  → queue closed, filter terminal
//! ```
//!
//! A filter is single-use: once stopped it never ingests again and cannot
//! have a new output attached.

pub mod config;
pub mod output;
pub mod summary;

use std::f64::consts::PI;
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace, warn};

pub use config::{FilterConfig, MagnitudeMode};
pub use output::{BlockReceiver, FilterHandle};
pub use summary::{BlockSummary, IngestReport};

use crate::{
    error::{Result, ToneError},
    pcm::SlinReader,
};
use output::{Delivery, SharedOutput};

/// Goertzel constants derived from the block size and target bin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoertzelConstants {
    pub sin: f64,
    pub cos: f64,
    /// `2·cos(ω)`
    pub coeff: f64,
}

impl GoertzelConstants {
    fn new(frequency: f64, sample_rate: f64, block_size: usize) -> Self {
        let n = block_size as f64;
        let k = (0.5 + n * frequency / sample_rate).floor();
        let w = (2.0 * PI / n) * k;
        let cos = w.cos();
        Self {
            sin: w.sin(),
            cos,
            coeff: 2.0 * cos,
        }
    }
}

/// Block-wise Goertzel detector for a single target frequency.
pub struct TargetFilter {
    frequency: f64,
    sample_rate: f64,
    config: FilterConfig,
    block_size: usize,
    constants: GoertzelConstants,

    q1: f64,
    q2: f64,
    /// Samples accumulated in the current block.
    filled: usize,
    /// Squared magnitude of the last completed block.
    magnitude2: f64,

    shared: Arc<SharedOutput>,
}

impl TargetFilter {
    /// Create a filter with the default configuration.
    ///
    /// # Errors
    /// `ToneError::InvalidConfig` unless `frequency` and `sample_rate` are
    /// positive and finite.
    pub fn new(frequency: f64, sample_rate: f64, min_duration: Duration) -> Result<Self> {
        Self::with_config(frequency, sample_rate, min_duration, FilterConfig::default())
    }

    pub fn with_config(
        frequency: f64,
        sample_rate: f64,
        min_duration: Duration,
        config: FilterConfig,
    ) -> Result<Self> {
        if !(frequency.is_finite() && frequency > 0.0) {
            return Err(ToneError::InvalidConfig(format!(
                "frequency must be positive, got {frequency}"
            )));
        }
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(ToneError::InvalidConfig(format!(
                "sample rate must be positive, got {sample_rate}"
            )));
        }
        config.validate()?;

        let block_size = config.block_size.unwrap_or_else(|| {
            config
                .block_size_strategy
                .block_size(frequency, sample_rate, min_duration)
        });

        Ok(Self {
            frequency,
            sample_rate,
            constants: GoertzelConstants::new(frequency, sample_rate, block_size),
            config,
            block_size,
            q1: 0.0,
            q2: 0.0,
            filled: 0,
            magnitude2: 0.0,
            shared: Arc::new(SharedOutput::new()),
        })
    }

    /// Replace the computed block size and regenerate the Goertzel constants.
    ///
    /// Any partially accumulated block is discarded.
    pub fn set_block_size(&mut self, n: usize) -> Result<()> {
        if n == 0 {
            return Err(ToneError::InvalidConfig("block size must be positive".into()));
        }
        self.block_size = n;
        self.constants = GoertzelConstants::new(self.frequency, self.sample_rate, n);
        self.reset();
        Ok(())
    }

    /// Attach the output queue.
    ///
    /// Returns `None` if a queue was already attached or the filter has been
    /// stopped; the existing receiver keeps working.
    pub fn attach_output(&self) -> Option<BlockReceiver> {
        self.shared.attach(self.config.queue_capacity)
    }

    /// Handle for stopping this filter from another thread.
    pub fn stop_handle(&self) -> FilterHandle {
        FilterHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Read slin samples from `input` until end of stream, a read error, or
    /// stop. The filter is stopped on every exit path.
    ///
    /// A trailing odd byte is treated as end of stream.
    ///
    /// # Errors
    /// `ToneError::Io` for any read failure other than end of stream.
    pub fn ingest<R: Read>(&mut self, input: R) -> Result<IngestReport> {
        let result = self.ingest_until_stopped(input);
        self.stop();
        result
    }

    fn ingest_until_stopped<R: Read>(&mut self, input: R) -> Result<IngestReport> {
        let mut reader = SlinReader::new(input);
        let mut report = IngestReport::default();

        self.reset();

        while !self.shared.is_stopped() {
            let sample = match reader.read_sample() {
                Ok(Some(sample)) => sample,
                Ok(None) => {
                    debug!(
                        frequency = self.frequency,
                        samples = report.samples,
                        blocks = report.blocks,
                        dropped = report.dropped,
                        "input exhausted"
                    );
                    return Ok(report);
                }
                Err(e) => {
                    warn!(frequency = self.frequency, "read failed: {e}");
                    return Err(e.into());
                }
            };

            report.samples += 1;
            let Some(summary) = self.push_sample(sample) else {
                continue;
            };
            report.blocks += 1;

            if self.shared.deliver(summary) == Delivery::Dropped {
                report.dropped += 1;
                debug!(
                    frequency = self.frequency,
                    dropped = report.dropped,
                    "output queue full, block summary dropped"
                );
            }
        }

        Ok(report)
    }

    /// Feed one sample. Returns the block summary when this sample completes
    /// a block.
    pub fn push_sample(&mut self, sample: i16) -> Option<BlockSummary> {
        let q = self.constants.coeff * self.q1 - self.q2 + f64::from(sample);
        self.q2 = self.q1;
        self.q1 = q;
        self.filled += 1;

        if self.filled < self.block_size {
            return None;
        }

        self.magnitude2 = self.block_magnitude2();
        let summary = self.block_summary();
        trace!(
            frequency = self.frequency,
            magnitude2 = summary.magnitude2,
            present = summary.present,
            "block complete"
        );
        self.reset();
        Some(summary)
    }

    fn block_magnitude2(&self) -> f64 {
        let (q1, q2) = (self.q1, self.q2);
        let scale = self.block_size as f64 / 2.0;

        match self.config.magnitude_mode {
            MagnitudeMode::Optimized => {
                (q1 * q1 + q2 * q2 - q1 * q2 * self.constants.coeff) / (scale * scale)
            }
            MagnitudeMode::Standard => {
                let real = (q1 - q2 * self.constants.cos) / scale;
                let imag = (q2 * self.constants.sin) / scale;
                real * real + imag * imag
            }
        }
    }

    fn block_summary(&self) -> BlockSummary {
        BlockSummary {
            magnitude2: self.magnitude2,
            frequency: self.frequency,
            duration: self.block_duration(),
            samples: self.block_size,
            present: self.magnitude2 > self.config.threshold,
        }
    }

    fn reset(&mut self) {
        self.q1 = 0.0;
        self.q2 = 0.0;
        self.filled = 0;
    }

    /// Close the output queue and make the filter terminal. Idempotent.
    pub fn stop(&mut self) {
        self.shared.stop();
        self.reset();
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.is_stopped()
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn threshold(&self) -> f64 {
        self.config.threshold
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Signal time covered by one block.
    pub fn block_duration(&self) -> Duration {
        let nanos = self.block_size as f64 * 1e9 / self.sample_rate;
        Duration::from_nanos(nanos.round() as u64)
    }

    pub fn constants(&self) -> GoertzelConstants {
        self.constants
    }

    /// Squared magnitude of the most recently completed block.
    pub fn magnitude2(&self) -> f64 {
        self.magnitude2
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }
}

impl std::fmt::Debug for TargetFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetFilter")
            .field("frequency", &self.frequency)
            .field("sample_rate", &self.sample_rate)
            .field("block_size", &self.block_size)
            .field("threshold", &self.config.threshold)
            .field("stopped", &self.is_stopped())
            .finish()
    }
}
