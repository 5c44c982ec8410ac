// src/error.rs

//! Error types for the classpath pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can abort a pipeline run
///
/// Nothing is recovered locally: every variant surfaces to the caller, which
/// is expected to fail the surrounding build step.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error without additional context
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O error tied to a specific path
    #[error("I/O error on {}: {source}", path.display())]
    PathIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory traversal failed
    #[error("failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// Archive could not be read or written
    #[error("archive error in {archive}: {source}")]
    Archive {
        archive: String,
        #[source]
        source: zip::result::ZipError,
    },

    /// Relative path would land outside its output directory
    #[error("path traversal attempt: {0}")]
    PathTraversal(String),

    /// Class payload header is malformed
    #[error("malformed class payload: {0}")]
    ClassFormat(String),

    /// Transformer script failed to parse
    #[error("failed to parse transformer '{name}' at {line}:{column}: {reason}")]
    ScriptParse {
        name: String,
        line: usize,
        column: usize,
        reason: String,
    },

    /// The rewrite engine failed; its error is passed through untouched
    #[error(transparent)]
    Engine(anyhow::Error),

    /// Invalid or unreadable configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Wrap an I/O error with the path it occurred on
    pub fn io_at(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::PathIo {
            path: path.into(),
            source,
        }
    }

    /// Wrap a zip error with the archive it occurred in
    pub fn archive(archive: impl Into<String>, source: zip::result::ZipError) -> Self {
        Self::Archive {
            archive: archive.into(),
            source,
        }
    }
}
