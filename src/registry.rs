// src/registry.rs

//! Workflow catalog offered to the schedule editor.

use std::fmt::Debug;

use crate::errors::{CronchainError, Result};
use crate::schedule::WorkflowInfo;
use crate::types::WorkflowKind;

/// Read-only source of the workflows a step may reference.
pub trait WorkflowRegistry: Send + Sync + Debug {
    fn catalog(&self) -> &[WorkflowInfo];

    fn find(&self, id: &str) -> Option<&WorkflowInfo> {
        self.catalog().iter().find(|wf| wf.id == id)
    }

    /// Like [`find`](Self::find), but an unknown id is an error.
    fn resolve(&self, id: &str) -> Result<WorkflowInfo> {
        self.find(id)
            .cloned()
            .ok_or_else(|| CronchainError::UnknownWorkflow(id.to_string()))
    }
}

/// Fixed, in-process catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticRegistry {
    workflows: Vec<WorkflowInfo>,
}

impl StaticRegistry {
    pub fn new(workflows: Vec<WorkflowInfo>) -> Self {
        Self { workflows }
    }

    /// One workflow per kind, with ids `wf-<kind>`.
    pub fn builtin() -> Self {
        let workflows = WorkflowKind::ALL
            .into_iter()
            .map(|kind| WorkflowInfo::new(format!("wf-{kind}"), builtin_name(kind), kind))
            .collect();
        Self { workflows }
    }
}

impl Default for StaticRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl WorkflowRegistry for StaticRegistry {
    fn catalog(&self) -> &[WorkflowInfo] {
        &self.workflows
    }
}

fn builtin_name(kind: WorkflowKind) -> &'static str {
    match kind {
        WorkflowKind::Backpopulate => "Backpopulate Historical Data",
        WorkflowKind::Sync => "Sync Market Data",
        WorkflowKind::Cleanup => "Cleanup Stale Records",
        WorkflowKind::Validation => "Validate Data Integrity",
        WorkflowKind::Migration => "Migrate Schema",
        WorkflowKind::Audit => "Audit Trail Review",
        WorkflowKind::Reconciliation => "Reconcile Positions",
    }
}
