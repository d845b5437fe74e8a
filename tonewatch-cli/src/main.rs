//! `tonewatch` — run Goertzel tone detection over a PCM file or stdin.

mod args;
mod input;
mod settings;

use std::io::{self, Read, Write};
use std::process::ExitCode;

use anyhow::Result;
use tonewatch_core::{
    constants::RATE_TELEPHONY, pcm::SlinReader, CancelToken, DetectorConfig, TargetFilter,
    ToneDetector,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::args::{Args, Command, Parsed, USAGE};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tonewatch_core=info,tonewatch=info")),
        )
        .init();

    let args = match args::parse(std::env::args().skip(1)) {
        Ok(Parsed::Run(args)) => args,
        Ok(Parsed::Help) => {
            println!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("{e:#}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(2)
        }
    }
}

fn run(args: &Args) -> Result<ExitCode> {
    let config = settings::resolve(args)?;
    let source = input::open(args.input.as_deref())?;

    let sample_rate = match (args.sample_rate, source.sample_rate) {
        (Some(flag), Some(header)) if flag != header => {
            warn!(flag, header, "--rate overrides the WAV header rate");
            flag
        }
        (Some(flag), _) => flag,
        (None, Some(header)) => header,
        (None, None) => RATE_TELEPHONY,
    };

    match args.command {
        Command::Detect => {
            let found = detect(args, config, sample_rate, source.reader)?;

            println!("{}", if found { "found" } else { "not found" });
            Ok(if found {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            })
        }
        Command::Blocks => {
            let mut filter = TargetFilter::with_config(
                args.frequency,
                sample_rate,
                args.min_duration,
                config.filter,
            )?;
            info!(
                frequency = filter.frequency(),
                sample_rate,
                block_size = filter.block_size(),
                threshold = filter.threshold(),
                "dumping block summaries"
            );

            // Every block is printed, so drive the filter sample by sample
            // rather than through the lossy output queue.
            let stdout = io::stdout();
            let mut out = stdout.lock();
            let mut blocks = 0u64;
            for sample in SlinReader::new(source.reader) {
                if let Some(summary) = filter.push_sample(sample?) {
                    serde_json::to_writer(&mut out, &summary)?;
                    writeln!(out)?;
                    blocks += 1;
                }
            }
            out.flush()?;
            info!(blocks, "input exhausted");
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Run one detection session over the whole input.
///
/// Files and pipes are read much faster than real time, so the session is
/// driven on this thread and every block counts toward the run.
fn detect<R: Read>(
    args: &Args,
    config: DetectorConfig,
    sample_rate: f64,
    input: R,
) -> Result<bool> {
    let frequency = if args.absence {
        -args.frequency
    } else {
        args.frequency
    };
    let found = ToneDetector::new(config).detect_lossless(
        &CancelToken::new(),
        frequency,
        sample_rate,
        args.min_duration,
        input,
    )?;
    Ok(found)
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;
    use std::io::Cursor;
    use std::time::Duration;

    use tonewatch_core::pcm::encode_slin;

    use super::*;

    fn args(frequency: f64, absence: bool, min_duration: Duration) -> Args {
        Args {
            command: Command::Detect,
            frequency,
            absence,
            sample_rate: None,
            min_duration,
            threshold: None,
            block_size: None,
            optimized: false,
            config: None,
            input: None,
        }
    }

    fn tone(frequency: f64, secs: f64) -> Vec<i16> {
        let n = (secs * RATE_TELEPHONY) as usize;
        (0..n)
            .map(|i| {
                let t = i as f64 / RATE_TELEPHONY;
                (16000.0 * (2.0 * PI * frequency * t).sin()) as i16
            })
            .collect()
    }

    fn silence(secs: f64) -> Vec<i16> {
        vec![0; (secs * RATE_TELEPHONY) as usize]
    }

    /// 15 s: silence, 1400 Hz, silence, 2300 Hz, silence; 3 s each.
    fn combo_file() -> Vec<u8> {
        let mut s = silence(3.0);
        s.extend(tone(1400.0, 3.0));
        s.extend(silence(3.0));
        s.extend(tone(2300.0, 3.0));
        s.extend(silence(3.0));
        encode_slin(&s)
    }

    #[test]
    fn late_tone_in_file_is_found_with_defaults() {
        let a = args(2300.0, false, Duration::from_secs(1));
        let found = detect(
            &a,
            DetectorConfig::default(),
            RATE_TELEPHONY,
            Cursor::new(combo_file()),
        )
        .unwrap();
        assert!(found);
    }

    #[test]
    fn missing_tone_in_file_is_not_found() {
        let a = args(500.0, false, Duration::from_secs(1));
        let found = detect(
            &a,
            DetectorConfig::default(),
            RATE_TELEPHONY,
            Cursor::new(combo_file()),
        )
        .unwrap();
        assert!(!found);
    }

    #[test]
    fn absence_flag_inverts_the_goal() {
        let a = args(2300.0, true, Duration::from_secs(2));
        let found = detect(
            &a,
            DetectorConfig::default(),
            RATE_TELEPHONY,
            Cursor::new(encode_slin(&tone(2300.0, 4.0))),
        )
        .unwrap();
        assert!(!found);
    }
}
