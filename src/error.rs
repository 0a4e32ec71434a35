// ABOUTME: Application-wide error types for rollstep.
// ABOUTME: Covers config loading and validation plus rollout failures reported by the CLI.

use std::path::PathBuf;
use thiserror::Error;

use crate::update::UpdateError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Update(#[from] UpdateError),

    #[error("rollout {rollout} failed: {reason}")]
    RolloutFailed { rollout: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
