//! Duration-based tone presence/absence detection.
//!
//! ## Session
//!
//! ```text
//! caller thread                         tonewatch-ingest thread
//! ─────────────                         ───────────────────────
//! TargetFilter::new + attach_output
//! spawn ───────────────────────────────► filter.ingest(input)
//! loop {                                     │ one BlockSummary per block
//!   select! { blocks, cancel }  ◄────────────┘ (try_send, drop if full)
//!   run = matched ? run + 1 : 0
//!   run ≥ required → stop, Ok(true)
//! }
//! queue closed → join result channel ◄──── Result<IngestReport>
//! ```
//!
//! The queue drops the newest summary when full, so a source that outruns
//! the consumer can lose blocks. [`ToneDetector::detect_lossless`] runs the
//! same evaluation on the caller's thread for finite inputs.
//!
//! A negative frequency asks for *absence*: the magnitude of `|f|` is tracked
//! and every presence flag is inverted before it counts toward the run.

pub mod cancel;

use std::io::Read;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{select, Receiver};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use cancel::CancelToken;

use crate::{
    error::{Result, ToneError},
    filter::{BlockReceiver, FilterConfig, IngestReport, TargetFilter},
    pcm::SlinReader,
};

/// Configuration for a `ToneDetector`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetectorConfig {
    /// Settings for the per-session `TargetFilter`.
    pub filter: FilterConfig,
    /// Lower bound on the consecutive blocks needed to declare detection,
    /// applied after the duration-derived count. Default: 1.
    pub min_required_blocks: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            filter: FilterConfig::default(),
            min_required_blocks: 1,
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_required_blocks == 0 {
            return Err(ToneError::InvalidConfig(
                "min required blocks must be at least 1".into(),
            ));
        }
        self.filter.validate()
    }
}

/// What a session is looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Goal {
    Presence,
    Absence,
}

impl Goal {
    fn matches(self, present: bool) -> bool {
        match self {
            Goal::Presence => present,
            Goal::Absence => !present,
        }
    }
}

/// Consecutive-block counter for one session.
#[derive(Debug)]
struct RunLength {
    goal: Goal,
    required: usize,
    run: usize,
}

impl RunLength {
    /// Count one block; true once the run is long enough.
    fn observe(&mut self, present: bool) -> bool {
        if self.goal.matches(present) {
            self.run += 1;
        } else {
            self.run = 0;
        }
        self.run >= self.required
    }
}

/// Runs detection sessions with a fixed configuration.
///
/// Each call is an independent session with its own filter, thread and run
/// counter.
#[derive(Debug, Clone, Default)]
pub struct ToneDetector {
    config: DetectorConfig,
}

impl ToneDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Block until `frequency` has been present for `min_duration`.
    pub fn detect_presence<R>(
        &self,
        cancel: &CancelToken,
        frequency: f64,
        sample_rate: f64,
        min_duration: Duration,
        input: R,
    ) -> Result<bool>
    where
        R: Read + Send + 'static,
    {
        self.detect(cancel, frequency.abs(), sample_rate, min_duration, input)
    }

    /// Block until `frequency` has been absent for `min_duration`.
    pub fn detect_absence<R>(
        &self,
        cancel: &CancelToken,
        frequency: f64,
        sample_rate: f64,
        min_duration: Duration,
        input: R,
    ) -> Result<bool>
    where
        R: Read + Send + 'static,
    {
        self.detect(cancel, -frequency.abs(), sample_rate, min_duration, input)
    }

    /// Run one detection session over `input`.
    ///
    /// A negative `frequency` detects sustained absence of `|frequency|`.
    ///
    /// Returns `Ok(true)` once enough consecutive blocks match. Returns
    /// `Ok(false)` when cancelled or when the input ends first. Only a
    /// genuine read failure yields `Err`.
    ///
    /// The ingest thread keeps running until its current read returns; the
    /// filter is stopped before this function returns so it exits right after.
    pub fn detect<R>(
        &self,
        cancel: &CancelToken,
        frequency: f64,
        sample_rate: f64,
        min_duration: Duration,
        input: R,
    ) -> Result<bool>
    where
        R: Read + Send + 'static,
    {
        let (mut filter, run) = self.session(frequency, sample_rate, min_duration)?;
        let target = filter.frequency();
        let goal = run.goal;
        let blocks = filter.attach_output().ok_or(ToneError::OutputAttached)?;
        let handle = filter.stop_handle();

        let (result_tx, result_rx) = crossbeam_channel::bounded::<Result<IngestReport>>(1);
        thread::Builder::new()
            .name("tonewatch-ingest".into())
            .spawn(move || {
                let _ = result_tx.send(filter.ingest(input));
            })?;

        let outcome = evaluate(cancel, run, &blocks, &result_rx);
        handle.stop();

        if let Ok(true) = outcome {
            info!(frequency = target, ?goal, ?min_duration, "tone condition detected");
        }
        outcome
    }

    /// Run one session over a finite source on the calling thread.
    ///
    /// Same semantics as [`ToneDetector::detect`], but every block is
    /// evaluated: there is no ingest thread and no output queue to overflow.
    /// Use it for files and buffers, which are read far faster than a
    /// queued consumer can keep up with. `cancel` is checked once per block.
    pub fn detect_lossless<R: Read>(
        &self,
        cancel: &CancelToken,
        frequency: f64,
        sample_rate: f64,
        min_duration: Duration,
        input: R,
    ) -> Result<bool> {
        let (mut filter, mut run) = self.session(frequency, sample_rate, min_duration)?;

        for sample in SlinReader::new(input) {
            let Some(summary) = filter.push_sample(sample?) else {
                continue;
            };
            if run.observe(summary.present) {
                info!(
                    frequency = filter.frequency(),
                    goal = ?run.goal,
                    ?min_duration,
                    "tone condition detected"
                );
                return Ok(true);
            }
            if cancel.is_cancelled() {
                debug!(run = run.run, "detection cancelled");
                return Ok(false);
            }
        }

        debug!(run = run.run, "input ended before detection");
        Ok(false)
    }

    /// Build the filter and run counter for one session.
    fn session(
        &self,
        frequency: f64,
        sample_rate: f64,
        min_duration: Duration,
    ) -> Result<(TargetFilter, RunLength)> {
        self.config.validate()?;

        let goal = if frequency < 0.0 {
            Goal::Absence
        } else {
            Goal::Presence
        };

        let filter = TargetFilter::with_config(
            frequency.abs(),
            sample_rate,
            min_duration,
            self.config.filter.clone(),
        )?;

        let required = required_blocks(min_duration, filter.block_size(), sample_rate)
            .max(self.config.min_required_blocks);
        debug!(
            frequency = filter.frequency(),
            ?goal,
            block_size = filter.block_size(),
            required,
            "detection session started"
        );

        Ok((
            filter,
            RunLength {
                goal,
                required,
                run: 0,
            },
        ))
    }

    /// Async wrapper around [`ToneDetector::detect`] for Tokio callers.
    ///
    /// The session runs on the blocking pool; cancel it through `cancel`.
    pub async fn detect_async<R>(
        &self,
        cancel: CancelToken,
        frequency: f64,
        sample_rate: f64,
        min_duration: Duration,
        input: R,
    ) -> Result<bool>
    where
        R: Read + Send + 'static,
    {
        let detector = self.clone();
        tokio::task::spawn_blocking(move || {
            detector.detect(&cancel, frequency, sample_rate, min_duration, input)
        })
        .await
        .map_err(|e| ToneError::Other(anyhow::anyhow!("detection task failed: {e}")))?
    }
}

/// Consume summaries until the run is long enough, the token fires, or the
/// producer closes the queue.
fn evaluate(
    cancel: &CancelToken,
    mut run: RunLength,
    blocks: &BlockReceiver,
    result_rx: &Receiver<Result<IngestReport>>,
) -> Result<bool> {
    loop {
        let next = select! {
            recv(blocks) -> msg => msg.ok(),
            recv(cancel.signal()) -> _ => {
                debug!(run = run.run, "detection cancelled");
                return Ok(false);
            },
        };
        let Some(summary) = next else {
            break;
        };

        if run.observe(summary.present) {
            return Ok(true);
        }

        if cancel.is_cancelled() {
            debug!(run = run.run, "detection cancelled");
            return Ok(false);
        }
    }

    // The producer closes the queue as its last act; its result follows.
    match result_rx.recv() {
        Ok(Ok(report)) => {
            debug!(
                samples = report.samples,
                blocks = report.blocks,
                dropped = report.dropped,
                "input ended before detection"
            );
            Ok(false)
        }
        Ok(Err(e)) => Err(e),
        Err(_) => Err(ToneError::IngestAborted),
    }
}

/// Consecutive blocks needed to cover `min_duration`.
pub fn required_blocks(min_duration: Duration, block_size: usize, sample_rate: f64) -> usize {
    let blocks = min_duration.as_secs_f64() * sample_rate / block_size as f64;
    blocks.ceil() as usize
}

/// Detect sustained presence of `frequency` with the default configuration.
pub fn detect_presence<R>(
    cancel: &CancelToken,
    frequency: f64,
    sample_rate: f64,
    min_duration: Duration,
    input: R,
) -> Result<bool>
where
    R: Read + Send + 'static,
{
    ToneDetector::default().detect_presence(cancel, frequency, sample_rate, min_duration, input)
}

/// Detect sustained absence of `frequency` with the default configuration.
pub fn detect_absence<R>(
    cancel: &CancelToken,
    frequency: f64,
    sample_rate: f64,
    min_duration: Duration,
    input: R,
) -> Result<bool>
where
    R: Read + Send + 'static,
{
    ToneDetector::default().detect_absence(cancel, frequency, sample_rate, min_duration, input)
}
