use thiserror::Error;

/// All errors produced by tonewatch-core.
#[derive(Debug, Error)]
pub enum ToneError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("output queue is already attached")]
    OutputAttached,

    #[error("ingest thread exited without reporting a result")]
    IngestAborted,

    #[error("error reading from input: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ToneError>;
