//! Error types for Findex core operations.
//!
//! This module defines well-structured error types using `thiserror` for
//! library-level errors, while the CLI uses `anyhow` for convenient error
//! handling at the process boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using FindexError
pub type Result<T> = std::result::Result<T, FindexError>;

/// Core error types for Findex operations.
///
/// Only [`FindexError::ConfigError`] is meant to be fatal. Everything raised
/// while scanning or resolving is absorbed by the caller and logged.
#[derive(Error, Debug)]
pub enum FindexError {
    // === Configuration Errors ===
    /// Configuration file is malformed or holds invalid values
    #[error("configuration error in {path}: {reason}")]
    ConfigError { path: PathBuf, reason: String },

    /// The configuration directory could not be determined
    #[error("could not determine configuration directory")]
    NoConfigDir,

    // === Resolution Errors ===
    /// A path or URI could not be turned into an index entry
    #[error("cannot resolve {target}: {reason}")]
    ResolveError { target: String, reason: String },

    // === Scan Errors ===
    /// A configured glob pattern is not valid
    #[error("invalid glob pattern {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    // === I/O Errors ===
    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    /// Serialization/deserialization failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FindexError {
    /// Returns true if this error should stop process startup.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            FindexError::ConfigError { .. } | FindexError::NoConfigDir
        )
    }

    /// Create a resolution error
    pub fn resolve(target: impl Into<String>, reason: impl Into<String>) -> Self {
        FindexError::ResolveError {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        FindexError::ConfigError {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
