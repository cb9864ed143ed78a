//! ms_io: the engine's boundary with the outside world.
//!
//! - `snapshot`: backend JSON wire types and their conversion into `ms_core`
//! - `catalogue`: discipline catalogue JSON
//! - `canonical_json` + `hasher`: snapshot fingerprints
//! - `submission_code`: decoding of (already decrypted) score-submission codes
//! - `import_text`: pasted participant tables
//! - `backend`: the `Backend` trait with memory, file and (feature `remote`) HTTP stores
//!
//! Every fallible function returns [`IoError`].

#![forbid(unsafe_code)]

use thiserror::Error;

/// Unified error for ms_io.
#[derive(Debug, Error)]
pub enum IoError {
    /// Filesystem / path errors.
    #[error("io/path error: {0}")]
    Path(String),

    /// JSON (de)serialization errors with a JSON Pointer hint.
    #[error("json error at {pointer}: {msg}")]
    Json { pointer: String, msg: String },

    /// Pasted/tabular input that could not be read.
    #[error("table error at line {line}: {msg}")]
    Table { line: usize, msg: String },

    /// Generic validation / invariants.
    #[error("invalid: {0}")]
    Invalid(String),

    /// The backend answered with a non-success status.
    #[error("backend error ({status}): {msg}")]
    Backend { status: u16, msg: String },

    /// The backend could not be reached.
    #[error("transport error: {0}")]
    Transport(String),
}

pub type IoResult<T> = Result<T, IoError>;

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Path(e.to_string())
    }
}

impl From<serde_json::Error> for IoError {
    fn from(e: serde_json::Error) -> Self {
        // serde_json keeps line/column, not a pointer; default to root.
        IoError::Json { pointer: "/".to_string(), msg: e.to_string() }
    }
}

impl From<ms_core::CoreError> for IoError {
    fn from(e: ms_core::CoreError) -> Self {
        IoError::Invalid(e.to_string())
    }
}

pub mod backend;
pub mod canonical_json;
pub mod catalogue;
#[cfg(feature = "hash")]
pub mod hasher;
pub mod import_text;
#[cfg(feature = "remote")]
pub mod remote;
pub mod snapshot;
pub mod submission_code;
