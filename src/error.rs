//! Error types for taskpad

use thiserror::Error;

use crate::task::TaskId;

/// Main error type for taskpad operations
#[derive(Error, Debug)]
pub enum Error {
    // Lookup failures
    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("Epic not found: {0}")]
    EpicNotFound(TaskId),

    #[error("Subtask not found: {0}")]
    SubtaskNotFound(TaskId),

    // Bad input
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unsupported snapshot version: {0}")]
    SnapshotVersion(String),

    // Operation failures
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Result type alias for taskpad operations
pub type Result<T> = std::result::Result<T, Error>;
