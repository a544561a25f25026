//! Voice Context - Errors

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VoiceError {
    #[error("invalid voice name: {0}")]
    InvalidName(String),

    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),
}
