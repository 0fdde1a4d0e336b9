//! Error types for document loading, diffing, and report storage.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while turning raw input into a spec document.
///
/// Unparseable content is not an error at this layer: the loader yields
/// `None` and the caller decides how to surface it. These variants cover
/// I/O and missing-capability failures only.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Capability errors (exit code 2)
    #[error("input looks like YAML but YAML support is not compiled in")]
    YamlUnavailable,
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            LoadError::YamlUnavailable => 2,
        }
    }
}

/// Errors from the diff façade.
#[derive(Debug, Error)]
pub enum DiffError {
    #[error("{side} document is not an object: got {actual}")]
    InputInvalid {
        side: &'static str,
        actual: &'static str,
    },
}

impl DiffError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            DiffError::InputInvalid { .. } => 2,
        }
    }
}

/// Errors from the report store.
///
/// Conflicting inserts are not represented here: `put` treats a duplicate
/// row as success.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("report store unavailable: {message}")]
    Unavailable { message: String },

    #[error("report store operation failed: {source}")]
    Backend {
        #[source]
        source: rusqlite::Error,
    },
}

impl From<rusqlite::Error> for StoreError {
    fn from(source: rusqlite::Error) -> Self {
        StoreError::Backend { source }
    }
}
