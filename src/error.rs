//! Error types for the patch pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by the library.
///
/// A missing input file is not an error: it reads as an empty config.
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PatchError>;
