//! Command-line parsing.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};

pub const USAGE: &str = "\
Usage: tonewatch <detect|blocks> --freq <hz> [options] <input|->

Input is raw 16-bit little-endian mono PCM, or a .wav file.

Options:
  --freq <hz>         target frequency (required)
  --absence           detect sustained absence instead of presence
  --rate <hz>         sample rate (default: WAV header, else 8000)
  --min-ms <ms>       minimum duration (default: 50)
  --threshold <mag2>  presence threshold (default: 7.8e7)
  --block-size <n>    fixed block size in samples
  --optimized         use the phase-insensitive magnitude formula
  --config <file>     detector config JSON, applied before other flags
  -h, --help          show this help";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Run a detection session and report found / not found.
    Detect,
    /// Print one JSON line per block.
    Blocks,
}

#[derive(Debug, Clone)]
pub struct Args {
    pub command: Command,
    pub frequency: f64,
    pub absence: bool,
    pub sample_rate: Option<f64>,
    pub min_duration: Duration,
    pub threshold: Option<f64>,
    pub block_size: Option<usize>,
    pub optimized: bool,
    pub config: Option<PathBuf>,
    /// `None` reads stdin.
    pub input: Option<PathBuf>,
}

#[derive(Debug)]
pub enum Parsed {
    Help,
    Run(Args),
}

fn value<I: Iterator<Item = String>>(it: &mut I, flag: &str) -> Result<String> {
    it.next().ok_or_else(|| anyhow!("missing value for {flag}"))
}

fn number<T: std::str::FromStr, I: Iterator<Item = String>>(it: &mut I, flag: &str) -> Result<T> {
    let raw = value(it, flag)?;
    raw.parse::<T>()
        .map_err(|_| anyhow!("invalid value for {flag}: {raw}"))
}

pub fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Parsed> {
    let mut it = args.into_iter();

    let command = match it.next().as_deref() {
        Some("detect") => Command::Detect,
        Some("blocks") => Command::Blocks,
        Some("-h" | "--help") => return Ok(Parsed::Help),
        Some(other) => bail!("unknown command: {other}"),
        None => bail!("missing command"),
    };

    let mut frequency: Option<f64> = None;
    let mut absence = false;
    let mut sample_rate = None;
    let mut min_ms: u64 = 50;
    let mut threshold = None;
    let mut block_size = None;
    let mut optimized = false;
    let mut config = None;
    let mut input: Option<Option<PathBuf>> = None;

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--freq" => frequency = Some(number(&mut it, "--freq")?),
            "--absence" => absence = true,
            "--rate" => sample_rate = Some(number(&mut it, "--rate")?),
            "--min-ms" => min_ms = number(&mut it, "--min-ms")?,
            "--threshold" => threshold = Some(number(&mut it, "--threshold")?),
            "--block-size" => block_size = Some(number(&mut it, "--block-size")?),
            "--optimized" => optimized = true,
            "--config" => config = Some(PathBuf::from(value(&mut it, "--config")?)),
            "-h" | "--help" => return Ok(Parsed::Help),
            "-" => input = Some(None),
            flag if flag.starts_with("--") => bail!("unknown argument: {flag}"),
            path => {
                if input.is_some() {
                    bail!("more than one input given");
                }
                input = Some(Some(PathBuf::from(path)));
            }
        }
    }

    let frequency = frequency.context("--freq is required")?;
    if !(frequency.is_finite() && frequency > 0.0) {
        bail!("--freq must be a positive number of Hz");
    }
    let input = input.context("missing input (use - for stdin)")?;

    Ok(Parsed::Run(Args {
        command,
        frequency,
        absence,
        sample_rate,
        min_duration: Duration::from_millis(min_ms),
        threshold,
        block_size,
        optimized,
        config,
        input,
    }))
}
