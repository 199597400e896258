//! Error types and handling
//!
//! Common error types used across the session controller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{AudioEncoderKind, OutputFormat};

/// Session-wide error type
///
/// Configuration-combination errors (`IncompatibleEncoder`, `UnsupportedEncoder`,
/// `UnsupportedFormat`) and malformed-input errors are raised before any
/// collaborator resource is acquired. Collaborator failures during assembly
/// (`SourceInitFailed`, `EncoderConnectFailed`, `EncoderCreateFailed`) carry the
/// component's own error and leave the session reusable.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("audio encoder {encoder:?} is incompatible with output format {format:?}")]
    IncompatibleEncoder {
        encoder: AudioEncoderKind,
        format: OutputFormat,
    },

    #[error("audio encoder {0:?} is not supported for container output")]
    UnsupportedEncoder(AudioEncoderKind),

    #[error("unsupported output format code: {0}")]
    UnsupportedFormat(i32),

    #[error("a recording is already in progress")]
    AlreadyRecording,

    #[error("no recording in progress")]
    NotRecording,

    #[error("capture source failed to initialize: {0}")]
    SourceInitFailed(anyhow::Error),

    #[error("could not connect to an encoder service: {0}")]
    EncoderConnectFailed(anyhow::Error),

    #[error("encoder rejected the request: {0}")]
    EncoderCreateFailed(anyhow::Error),

    #[error("pipeline was assembled with no audio or video track")]
    NoActiveTrack,

    #[error("malformed parameter entry: {0:?}")]
    MalformedParameter(String),

    #[error("unknown parameter key: {0:?}")]
    UnknownParameter(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SessionError {
    /// Stable code string for this error
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::InvalidArgument(_) => "INVALID_ARGUMENT",
            SessionError::InvalidState(_) => "INVALID_STATE",
            SessionError::IncompatibleEncoder { .. } => "INCOMPATIBLE_ENCODER",
            SessionError::UnsupportedEncoder(_) => "UNSUPPORTED_ENCODER",
            SessionError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            SessionError::AlreadyRecording => "ALREADY_RECORDING",
            SessionError::NotRecording => "NOT_RECORDING",
            SessionError::SourceInitFailed(_) => "SOURCE_INIT_FAILED",
            SessionError::EncoderConnectFailed(_) => "ENCODER_CONNECT_FAILED",
            SessionError::EncoderCreateFailed(_) => "ENCODER_CREATE_FAILED",
            SessionError::NoActiveTrack => "NO_ACTIVE_TRACK",
            SessionError::MalformedParameter(_) => "MALFORMED_PARAMETER",
            SessionError::UnknownParameter(_) => "UNKNOWN_PARAMETER",
            SessionError::Io(_) => "IO_ERROR",
        }
    }
}

/// Error response for IPC/frontend callers
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<SessionError> for ErrorResponse {
    fn from(error: SessionError) -> Self {
        ErrorResponse {
            code: error.code().to_string(),
            message: error.to_string(),
        }
    }
}

/// Result type alias using SessionError
pub type SessionResult<T> = Result<T, SessionError>;
