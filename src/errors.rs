// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SitepipeError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Cycle detected in task graph: {0}")]
    DagCycle(String),

    /// Per-file compile failure. Transforms log these and skip the file; they
    /// never abort the surrounding task.
    #[error("Compile error in {file:?}: {message}")]
    CompileError { file: PathBuf, message: String },

    #[error("Publish failed: {0}")]
    PublishError(String),

    #[error("Tasks failed: {}", .0.join(", "))]
    TaskFailed(Vec<String>),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SitepipeError>;
