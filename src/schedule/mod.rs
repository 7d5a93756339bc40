// src/schedule/mod.rs

//! Schedule data model.
//!
//! - [`step`] defines steps (sequential or parallel) and the editable chain.
//! - [`draft`] holds uncommitted edits and the editor session.
//! - [`validate`] checks a draft before it is committed.

pub mod draft;
pub mod step;
pub mod validate;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chain::ChainView;
use crate::cron::CronExpression;
use crate::types::{ScheduleId, ScheduleStatus, WorkflowKind};

pub use draft::{DraftSession, ScheduleDraft};
pub use step::{ParallelGroup, ParallelGroupTooSmall, Step, StepChain};
pub use validate::{ValidationError, ValidationIssue, validate_draft};

/// Reference to a workflow from the registry catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkflowInfo {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: WorkflowKind,
}

impl WorkflowInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: WorkflowKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
        }
    }
}

/// A committed, named, cron-triggered chain of steps.
///
/// `next_run` and `last_run` belong to the trigger; user edits never set
/// them directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub cron: CronExpression,
    pub enabled: bool,
    #[serde(default)]
    pub status: ScheduleStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_run: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<DateTime<Utc>>,
    #[serde(rename = "step")]
    pub steps: Vec<Step>,
}

impl Schedule {
    /// Enabled and its `next_run` has arrived.
    pub fn is_due(&self, now: &DateTime<Utc>) -> bool {
        self.enabled && self.next_run.is_some_and(|next| next <= *now)
    }

    pub fn chain(&self) -> ChainView<'_> {
        ChainView::new(&self.steps)
    }

    pub fn workflow_count(&self) -> usize {
        self.steps.iter().map(Step::workflow_count).sum()
    }
}
