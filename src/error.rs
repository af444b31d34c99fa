//! Error types for the compile-time profiler
//!
//! Only structural problems become errors. Data-quality issues (odd trace
//! events, duplicate headers, unclassified commands) are logged with
//! `tracing::warn!` and the run continues.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that abort a profiling run
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("build path {dir} does not contain a {file}")]
    BuildGraphMissing { dir: PathBuf, file: String },

    #[error("build command enumeration failed: {0}")]
    Enumerator(String),

    #[error("no time trace file found at {path} (command: {command})")]
    TraceMissing { path: PathBuf, command: String },

    #[error("invalid trace file {path}: {reason}")]
    TraceFormat { path: PathBuf, reason: String },

    #[error("invalid command cache {path}: {reason}")]
    CacheFormat { path: PathBuf, reason: String },

    #[error("command timed out after {timeout:?}: {command}")]
    CommandTimedOut { command: String, timeout: Duration },

    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for profiling operations
pub type Result<T> = std::result::Result<T, ProfileError>;
