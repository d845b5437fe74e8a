//! Synthetic slin signals for unit tests.

use std::f64::consts::PI;

pub(crate) const TONE_AMPLITUDE: f64 = 16_000.0;

pub(crate) fn sine(frequency: f64, sample_rate: f64, secs: f64, amplitude: f64) -> Vec<i16> {
    let n = (secs * sample_rate).round() as usize;
    (0..n)
        .map(|i| {
            let t = i as f64 / sample_rate;
            (amplitude * (2.0 * PI * frequency * t).sin()).round() as i16
        })
        .collect()
}

pub(crate) fn tone(frequency: f64, sample_rate: f64, secs: f64) -> Vec<i16> {
    sine(frequency, sample_rate, secs, TONE_AMPLITUDE)
}

pub(crate) fn silence(sample_rate: f64, secs: f64) -> Vec<i16> {
    vec![0; (secs * sample_rate).round() as usize]
}
