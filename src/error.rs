//! Error types for watermark rendering, export and persistence.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors surfaced by the watermark engine and its persistence layer.
///
/// Categories follow how callers are expected to react:
/// - `Decode` / `Encode`: per-image failures, reported and skipped in a batch
/// - `Config`: malformed settings or template documents, recovered with defaults
/// - `Preview`: scaling for display failed; the previous preview stays
/// - `NotFound`: a named template that does not exist
#[derive(Error, Debug)]
pub enum WatermarkError {
    /// Source image could not be read or decoded.
    #[error("Failed to decode image {}: {message}", .path.display())]
    Decode { path: PathBuf, message: String },

    /// Rendered image could not be encoded or written.
    #[error("Failed to write image {}: {message}", .path.display())]
    Encode { path: PathBuf, message: String },

    /// Settings, template or application configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Preview could not be produced from a rendered image.
    #[error("Preview failed: {0}")]
    Preview(String),

    /// A named resource (template) does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used across the crate.
pub type WatermarkResult<T> = Result<T, WatermarkError>;

impl WatermarkError {
    pub fn decode(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Decode {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    pub fn encode(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Encode {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// True for errors scoped to a single image of a batch.
    pub fn is_per_image(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::Encode { .. })
    }
}
