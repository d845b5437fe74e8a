//! Reference rates, thresholds, block sizes and tone tables.
//!
//! These are plain data. Everything that consumes them takes its value from a
//! config struct (`FilterConfig`, `DetectorConfig`) whose `Default` impl reads
//! from here, so a host can override any of them per filter.

/// Standard telephony sample rate (Hz).
pub const RATE_TELEPHONY: f64 = 8000.0;

/// Default presence threshold on the squared-magnitude scale.
pub const TONE_THRESHOLD: f64 = 7.8e7;

/// Block summaries buffered for slow readers before new ones are dropped.
pub const BLOCK_BUFFER_SIZE: usize = 50;

/// Block size for North American call-progress tones:
/// 350 440 480 620 850 1400 1800 Hz.
pub const BLOCK_SIZE_NORTH_AMERICA: usize = 183;

/// Block size for Costa Rica and Brazil (425 Hz).
pub const BLOCK_SIZE_SOUTH_AMERICA: usize = 188;

/// Block size for the UK disconnect tone (400 Hz).
pub const BLOCK_SIZE_UK_DISCONNECT: usize = 160;

/// Block size for DTMF detection.
pub const BLOCK_SIZE_DTMF: usize = 102;

/// North American DTMF row and column frequencies (Hz).
pub const DTMF_FREQUENCIES: [f64; 8] = [
    697.0, 770.0, 852.0, 941.0, 1209.0, 1336.0, 1477.0, 1633.0,
];

/// Common North American telephony tone frequencies (Hz).
pub const NA_TELEPHONY_FREQUENCIES: [f64; 7] = [350.0, 440.0, 480.0, 620.0, 850.0, 1400.0, 1800.0];

/// SIA Contact ID handshake frequencies (Hz).
pub const CONTACT_ID_FREQUENCIES: [f64; 2] = [1400.0, 2300.0];
