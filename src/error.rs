//! Error types for compose-dot

use std::path::PathBuf;
use thiserror::Error;

/// Result type for compose-dot operations
pub type Result<T> = std::result::Result<T, ComposeDotError>;

/// Fatal errors. Field-level shape problems are never reported here; they
/// degrade to empty values plus a [`crate::compose::Warning`].
#[derive(Error, Debug)]
pub enum ComposeDotError {
    #[error("Compose file parse error: {0}")]
    ComposeParse(String),

    #[error("Invalid compose document: {0}")]
    InvalidRoot(String),

    #[error("Failed to write output to {}: {source}", .path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
