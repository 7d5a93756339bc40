// src/types.rs

//! Small shared value types: identifiers and status enums.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier of a committed schedule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScheduleId(String);

impl ScheduleId {
    /// Fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ScheduleId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ScheduleId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ScheduleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a step, unique within its schedule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(String);

impl StepId {
    /// Short random identifier (`step-` + first UUID group).
    pub fn generate() -> Self {
        let uuid = Uuid::new_v4().simple().to_string();
        Self(format!("step-{}", &uuid[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StepId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Last observed execution state of a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    #[default]
    Active,
    Paused,
    Error,
}

impl ScheduleStatus {
    /// Status implied by the `enabled` flag after a user toggle.
    pub fn for_enabled(enabled: bool) -> Self {
        if enabled {
            ScheduleStatus::Active
        } else {
            ScheduleStatus::Paused
        }
    }
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScheduleStatus::Active => "active",
            ScheduleStatus::Paused => "paused",
            ScheduleStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// The fixed catalog of workflow kinds a step can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowKind {
    Backpopulate,
    Sync,
    Cleanup,
    Validation,
    Migration,
    Audit,
    Reconciliation,
}

impl WorkflowKind {
    pub const ALL: [WorkflowKind; 7] = [
        WorkflowKind::Backpopulate,
        WorkflowKind::Sync,
        WorkflowKind::Cleanup,
        WorkflowKind::Validation,
        WorkflowKind::Migration,
        WorkflowKind::Audit,
        WorkflowKind::Reconciliation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowKind::Backpopulate => "backpopulate",
            WorkflowKind::Sync => "sync",
            WorkflowKind::Cleanup => "cleanup",
            WorkflowKind::Validation => "validation",
            WorkflowKind::Migration => "migration",
            WorkflowKind::Audit => "audit",
            WorkflowKind::Reconciliation => "reconciliation",
        }
    }

    /// Name of the execution-service operation that runs this kind.
    pub fn operation(&self) -> &'static str {
        match self {
            WorkflowKind::Backpopulate => "backpopulate",
            WorkflowKind::Sync => "sync",
            WorkflowKind::Cleanup => "cleanup",
            WorkflowKind::Validation => "validate",
            WorkflowKind::Migration => "migrate",
            WorkflowKind::Audit => "audit",
            WorkflowKind::Reconciliation => "reconcile",
        }
    }
}

impl fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        WorkflowKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted || kind.operation() == wanted)
            .ok_or_else(|| format!("invalid workflow type: {wanted}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_kind_parses_type_and_operation_names() {
        assert_eq!("validation".parse::<WorkflowKind>(), Ok(WorkflowKind::Validation));
        assert_eq!("validate".parse::<WorkflowKind>(), Ok(WorkflowKind::Validation));
        assert_eq!(" Reconcile ".parse::<WorkflowKind>(), Ok(WorkflowKind::Reconciliation));
        assert!("deploy".parse::<WorkflowKind>().is_err());
    }

    #[test]
    fn status_follows_enabled_flag() {
        assert_eq!(ScheduleStatus::for_enabled(true), ScheduleStatus::Active);
        assert_eq!(ScheduleStatus::for_enabled(false), ScheduleStatus::Paused);
    }

    #[test]
    fn step_ids_are_prefixed() {
        let id = StepId::generate();
        assert!(id.as_str().starts_with("step-"));
        assert_eq!(id.as_str().len(), "step-".len() + 8);
    }
}
