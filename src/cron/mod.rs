// src/cron/mod.rs

//! Cron expressions and the structured schedule editor form.
//!
//! - [`expression`] parses, validates and evaluates five-field expressions.
//! - [`builder`] maps between the editor's frequency-based form and the
//!   cron string.
//! - [`error`] holds the shared error type.

pub mod builder;
pub mod error;
pub mod expression;

pub use builder::{CronBuilder, CronSchedule, DayOfMonth, Frequency, TimeOfDay, WeekdaySet};
pub use error::CronError;
pub use expression::{CronExpression, CronField};
