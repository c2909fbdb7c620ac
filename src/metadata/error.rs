//! Metadata lookup errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for metadata operations.
pub type MetadataResult<T> = Result<T, MetadataError>;

/// Errors a metadata backend can report.
///
/// The analyzer never propagates these; a failed lookup degrades to the
/// "no statistics" defaults.
#[derive(Error, Debug)]
pub enum MetadataError {
    /// The lookup did not answer in time.
    #[error("metadata lookup timed out after {0} ms")]
    Timeout(u64),

    /// The backend failed (connection lost, query error, ...).
    #[error("metadata backend error: {0}")]
    Backend(String),

    /// Failed to read a metadata file.
    #[error("failed to read metadata file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to decode metadata JSON.
    #[error("failed to parse metadata: {0}")]
    Parse(#[from] serde_json::Error),
}

impl MetadataError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}
