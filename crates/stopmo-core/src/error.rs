//! Engine error types

use std::path::PathBuf;

use thiserror::Error;

use crate::audio::AudioError;

/// Errors produced by the clip, import and recording paths
///
/// None of these are fatal to the process: callers degrade to
/// "no audio", "no import" or "recording stopped" and report the message.
#[derive(Error, Debug)]
pub enum EngineError {
    /// File open/read/link/unlink failure
    #[error("{path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed image or audio data
    #[error("Decode error: {0}")]
    Decode(String),

    /// Buffer allocation failure
    #[error("Allocation failed: {0}")]
    Alloc(String),

    /// Channel count the playback path cannot handle
    #[error("{0}-Ch playback unimplemented")]
    UnsupportedFormat(u16),

    /// Frame index outside the store bounds
    #[error("No such frame: {index} (clip has {count})")]
    OutOfRange { index: usize, count: usize },

    /// Audio device open/stream failure
    #[error(transparent)]
    Device(#[from] AudioError),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl EngineError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this is an I/O error of the given kind
    pub fn is_io_kind(&self, kind: std::io::ErrorKind) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == kind)
    }
}

impl From<std::collections::TryReserveError> for EngineError {
    fn from(e: std::collections::TryReserveError) -> Self {
        Self::Alloc(e.to_string())
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
