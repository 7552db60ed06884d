//! Error types for the folder/prompt model and its record store
//!
//! Domain failures (`Validation`, `NotFound`, `Cycle`) are kept apart from
//! `Storage` so callers can tell a rejected request from a failing system.

use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by a [`RecordStore`](crate::storage::RecordStore).
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The stored document could not be decoded
    #[error("malformed library document {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The snapshot could not be encoded
    #[error("failed to serialize library: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The store refused the operation
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by every library operation.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// A required field was missing or blank
    #[error("invalid input: {0}")]
    Validation(String),

    /// A referenced id does not exist
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    /// A folder move would make the folder its own ancestor
    #[error("cannot move folder '{folder_id}' into '{target_id}': it would create a cycle")]
    Cycle { folder_id: String, target_id: String },

    /// The backing store failed
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl LibraryError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn folder_not_found(id: &str) -> Self {
        Self::NotFound {
            entity: "folder",
            id: id.to_string(),
        }
    }

    pub fn prompt_not_found(id: &str) -> Self {
        Self::NotFound {
            entity: "prompt",
            id: id.to_string(),
        }
    }

    /// Stable machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound { .. } => "notFound",
            Self::Cycle { .. } => "cycle",
            Self::Storage(_) => "storage",
        }
    }
}

pub type LibraryResult<T> = Result<T, LibraryError>;
