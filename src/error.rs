//! Error types for docshift.

use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::format::Format;

/// Result type alias for docshift operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during conversion.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A format name that is not one of the supported formats.
    #[error("Invalid format: {0:?} (expected markdown, html, or pdf)")]
    InvalidFormat(String),

    /// The requested (source, target) pair has no conversion path.
    #[error("Unsupported conversion path: {from} to {to}")]
    UnsupportedPath {
        /// Requested source format
        from: Format,
        /// Requested target format
        to: Format,
    },

    /// Input payload exceeds the configured limit.
    #[error("Input is {size} bytes, limit is {limit} bytes")]
    InputTooLarge {
        /// Payload size in bytes
        size: usize,
        /// Configured limit in bytes
        limit: usize,
    },

    /// Request is malformed in some other way.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Source bytes could not be read as the declared format.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The document could not be written in the target format.
    #[error("Rendering error: {0}")]
    Render(String),

    /// A conversion job failed after it was created.
    #[error(transparent)]
    Conversion(Box<ConversionError>),

    /// A job was asked to leave a terminal state.
    #[error("Job {id} is already {status} and cannot move to {requested}")]
    InvalidTransition {
        /// Job id
        id: Uuid,
        /// Current status
        status: String,
        /// Requested status
        requested: String,
    },

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Stable classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnsupportedPath { .. } => ErrorKind::UnsupportedPath,
            Error::Io(_)
            | Error::InvalidFormat(_)
            | Error::InputTooLarge { .. }
            | Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::Parse(_) => ErrorKind::Parse,
            Error::Render(_) => ErrorKind::Render,
            Error::Conversion(err) => err.kind(),
            Error::InvalidTransition { .. } | Error::Other(_) => ErrorKind::Internal,
        }
    }

    /// Get the wrapped conversion failure, if this is one.
    pub fn as_conversion(&self) -> Option<&ConversionError> {
        match self {
            Error::Conversion(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConversionError> for Error {
    fn from(err: ConversionError) -> Self {
        Error::Conversion(Box::new(err))
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::Render(format!("PDF writer: {}", err))
    }
}

/// Failure of a conversion job, carrying the path and the underlying cause.
#[derive(Error, Debug)]
#[error("Failed to convert from {from} to {to}: {cause}")]
pub struct ConversionError {
    /// Source format of the failed job
    pub from: Format,
    /// Target format of the failed job
    pub to: Format,
    /// Id of the failed job
    pub job_id: Uuid,
    /// The parse or render error that ended the job
    #[source]
    pub cause: Box<Error>,
}

impl ConversionError {
    /// Wrap a cause for the given job.
    pub fn new(from: Format, to: Format, job_id: Uuid, cause: Error) -> Self {
        Self {
            from,
            to,
            job_id,
            cause: Box::new(cause),
        }
    }

    /// Classification of the underlying cause.
    pub fn kind(&self) -> ErrorKind {
        self.cause.kind()
    }
}

/// Stable error classification exposed to calling layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Path not in the supported set (including any PDF source)
    UnsupportedPath,
    /// Malformed request: unknown format, oversized or unreadable input
    InvalidInput,
    /// Source content could not be parsed
    Parse,
    /// Target content could not be rendered
    Render,
    /// Unexpected internal failure
    Internal,
}

impl ErrorKind {
    /// Stable string identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnsupportedPath => "unsupported_path",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Parse => "parse_error",
            ErrorKind::Render => "render_error",
            ErrorKind::Internal => "internal",
        }
    }

    /// Whether the caller sent something wrong (HTTP 400) rather than
    /// the engine failing (HTTP 500).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ErrorKind::UnsupportedPath | ErrorKind::InvalidInput | ErrorKind::Parse
        )
    }

    /// HTTP status a web layer should answer with.
    pub fn http_status(&self) -> u16 {
        if self.is_client_error() {
            400
        } else {
            500
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
