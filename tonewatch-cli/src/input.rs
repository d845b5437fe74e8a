//! Opens the sample source named on the command line.

use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::Path;

use anyhow::{bail, Context, Result};
use tonewatch_core::pcm::encode_slin;
use tracing::info;

/// An slin byte stream plus the sample rate its container declared, if any.
pub struct Source {
    pub reader: Box<dyn Read + Send>,
    pub sample_rate: Option<f64>,
}

pub fn open(path: Option<&Path>) -> Result<Source> {
    let Some(path) = path else {
        return Ok(Source {
            reader: Box::new(io::stdin()),
            sample_rate: None,
        });
    };

    let is_wav = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.eq_ignore_ascii_case("wav"))
        .unwrap_or(false);
    if is_wav {
        return open_wav(path);
    }

    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    Ok(Source {
        reader: Box::new(file),
        sample_rate: None,
    })
}

/// Decode a 16-bit integer WAV, averaging channels down to mono.
fn open_wav(path: &Path) -> Result<Source> {
    let mut reader =
        hound::WavReader::open(path).with_context(|| format!("opening {}", path.display()))?;
    let spec = reader.spec();

    if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
        bail!(
            "{}: only 16-bit integer WAV is supported ({}-bit {:?})",
            path.display(),
            spec.bits_per_sample,
            spec.sample_format
        );
    }

    let channels = usize::from(spec.channels.max(1));
    let interleaved = reader
        .samples::<i16>()
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("decoding {}", path.display()))?;

    let mono: Vec<i16> = interleaved
        .chunks(channels)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| i32::from(s)).sum();
            (sum / frame.len() as i32) as i16
        })
        .collect();

    info!(
        path = %path.display(),
        sample_rate = spec.sample_rate,
        channels,
        samples = mono.len(),
        "wav input decoded"
    );

    Ok(Source {
        reader: Box::new(Cursor::new(encode_slin(&mono))),
        sample_rate: Some(f64::from(spec.sample_rate)),
    })
}
