//! Error types for KawaiiReview.
//!
//! Library crates use [`KawaiiError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all KawaiiReview operations.
#[derive(Debug, thiserror::Error)]
pub enum KawaiiError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while talking to a metadata API or downloading art.
    #[error("network error: {0}")]
    Network(String),

    /// Frontmatter, JSON, or API payload parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input validation error (bad kind, empty title, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// A review, template, or candidate that was required does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The target already exists and overwriting was not requested.
    #[error("{0}")]
    Conflict(String),

    /// The operator backed out of an interactive step.
    #[error("cancelled")]
    Cancelled,
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, KawaiiError>;

impl KawaiiError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = KawaiiError::config("missing site root");
        assert_eq!(err.to_string(), "config error: missing site root");

        let err = KawaiiError::Conflict("Folder already exists: anime/frieren".into());
        assert_eq!(err.to_string(), "Folder already exists: anime/frieren");

        let err = KawaiiError::NotFound("anime/frieren/blog.md".into());
        assert!(err.to_string().contains("frieren"));
    }

    #[test]
    fn io_error_keeps_path() {
        let err = KawaiiError::io(
            "data/anime.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("data/anime.json"));
    }
}
