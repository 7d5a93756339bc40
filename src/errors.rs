// src/errors.rs

//! Crate-wide error type and `Result` alias.

use thiserror::Error;

use crate::cron::CronError;
use crate::schedule::ValidationError;
use crate::types::{ScheduleId, StepId};

#[derive(Error, Debug)]
pub enum CronchainError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Schedule not found: {0}")]
    NotFound(ScheduleId),

    #[error("Step not found: {0}")]
    StepNotFound(StepId),

    #[error("Step {step} has {len} workflow(s); index {index} is out of range")]
    WorkflowIndexOutOfRange { step: StepId, index: usize, len: usize },

    #[error("Unknown workflow: {0}")]
    UnknownWorkflow(String),

    /// Not a failure: the draft has unsaved edits and the caller must
    /// confirm before it is discarded.
    #[error("Unsaved changes to '{name}' would be discarded")]
    DiscardConfirmation { name: String },

    #[error("Cron error: {0}")]
    Cron(#[from] CronError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerError(#[from] toml::ser::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CronchainError>;
