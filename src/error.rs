//! Stage-level failure taxonomy.
//!
//! Lower layers propagate `Box<dyn Error>` with `?`; the stage boundaries
//! translate into [`PipelineError`] so the command surface can tell the
//! degraded-but-continuing cases apart from the ones that abort a run.

use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum PipelineError {
    /// An outbound fetch failed or timed out. Degrades to fixtures.
    SourceUnavailable { source: String, reason: String },
    /// The text generator raised or returned nothing. Degrades to pass-through.
    GenerationFailure(String),
    /// The collector could not persist a single category.
    NoCollectedData,
    /// The curator found no snapshot data for the day.
    NoRawData { dir: String },
    /// The cached mail credentials are missing, expired or rejected.
    Auth(String),
    /// The send call raised or returned a non-success status.
    Delivery(String),
    /// Settings are missing a required key or hold an invalid value.
    Config(String),
    Io(std::io::Error),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::SourceUnavailable { source, reason } => {
                write!(f, "source {source} unavailable: {reason}")
            }
            PipelineError::GenerationFailure(msg) => write!(f, "generation failed: {msg}"),
            PipelineError::NoCollectedData => write!(f, "no category produced any output"),
            PipelineError::NoRawData { dir } => write!(f, "no raw data found under {dir}"),
            PipelineError::Auth(msg) => write!(f, "mail authentication failed: {msg}"),
            PipelineError::Delivery(msg) => write!(f, "delivery failed: {msg}"),
            PipelineError::Config(msg) => write!(f, "invalid configuration: {msg}"),
            PipelineError::Io(e) => write!(f, "i/o error: {e}"),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(e: std::io::Error) -> Self {
        PipelineError::Io(e)
    }
}
