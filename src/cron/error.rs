// src/cron/error.rs

use thiserror::Error;

/// Problems with a cron expression or with the structured form it maps to.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CronError {
    #[error("cron expression must have 5 fields, found {found}")]
    FieldCount { found: usize },

    #[error("invalid {field} field: '{value}'")]
    InvalidField { field: &'static str, value: String },

    #[error("{field} value {value} out of range {min}-{max}")]
    OutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    #[error("weekly schedule needs at least one weekday")]
    EmptyWeekdays,

    #[error("invalid time of day '{0}' (expected HH:MM)")]
    InvalidTime(String),

    #[error("{field} field '{value}' cannot be edited as a single value")]
    NotEditable { field: &'static str, value: String },
}
