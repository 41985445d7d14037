// Error handling for CSD reader

use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CsdError>;

#[derive(Error, Debug)]
pub enum CsdError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{region} needs {needed} bytes, only {available} available")]
    Structural {
        region: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

/// Non-fatal conditions found while decoding headers.
///
/// Decoding continues past all of these; they are kept on the reader so the
/// caller can decide whether to offer a repair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Degradation {
    DegradedHeader {
        field: &'static str,
        raw: i64,
        replacement: i64,
    },
    TruncatedChannelTable {
        declared: usize,
        usable: usize,
    },
    TextDecodeFallback {
        field: &'static str,
        channel: Option<usize>,
    },
}

impl std::fmt::Display for Degradation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Degradation::DegradedHeader {
                field,
                raw,
                replacement,
            } => write!(f, "{} was {}, using {}", field, raw, replacement),
            Degradation::TruncatedChannelTable { declared, usable } => write!(
                f,
                "channel table truncated: {} declared, {} usable",
                declared, usable
            ),
            Degradation::TextDecodeFallback {
                field,
                channel: Some(idx),
            } => write!(f, "{} of channel {} is not valid UTF-8", field, idx),
            Degradation::TextDecodeFallback {
                field,
                channel: None,
            } => write!(f, "{} is not valid UTF-8", field),
        }
    }
}
