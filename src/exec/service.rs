// src/exec/service.rs

//! Workflow execution service seam.
//!
//! The scheduler never runs workflow logic itself. Every workflow in a chain
//! is handed to a [`WorkflowService`], which answers with an
//! [`ExecutionResponse`] envelope. Production adapters would talk to a real
//! pipeline runner; [`super::simulated`] fakes one in-process.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::Result;
use crate::types::WorkflowKind;

/// Loosely typed parameter bag passed to every operation.
pub type WorkflowParams = serde_json::Map<String, Value>;

/// Boxed future returned by [`WorkflowService`] methods.
pub type ServiceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Identifier of one running or finished workflow instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(Uuid);

impl InstanceId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for InstanceId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| format!("invalid instance id {s:?}: {e}"))
    }
}

/// Response envelope shared by every operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<InstanceId>,
}

impl ExecutionResponse {
    pub fn ok(message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
            error: None,
            instance_id: None,
        }
    }

    pub fn failed(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error: Some(error.into()),
            instance_id: None,
        }
    }

    pub fn with_instance(mut self, id: InstanceId) -> Self {
        self.instance_id = Some(id);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceState {
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl InstanceState {
    pub fn is_finished(&self) -> bool {
        !matches!(self, InstanceState::Running)
    }
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InstanceState::Running => "running",
            InstanceState::Completed => "completed",
            InstanceState::Failed => "failed",
            InstanceState::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// What the service knows about one instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub id: InstanceId,
    pub kind: WorkflowKind,
    pub state: InstanceState,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub params: WorkflowParams,
    #[serde(default)]
    pub message: String,
}

impl InstanceRecord {
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|end| end - self.started_at)
    }
}

/// Aggregate counters over every instance the service has seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceMetrics {
    pub total: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
    /// Mean wall time of finished instances.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_duration_ms: Option<i64>,
}

impl ServiceMetrics {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a InstanceRecord>) -> Self {
        let mut metrics = ServiceMetrics::default();
        let mut total_ms = 0i64;
        let mut finished = 0i64;

        for record in records {
            metrics.total += 1;
            match record.state {
                InstanceState::Running => metrics.running += 1,
                InstanceState::Completed => metrics.completed += 1,
                InstanceState::Failed => metrics.failed += 1,
                InstanceState::Cancelled => metrics.cancelled += 1,
            }
            if let Some(duration) = record.duration() {
                total_ms += duration.num_milliseconds();
                finished += 1;
            }
        }

        if finished > 0 {
            metrics.average_duration_ms = Some(total_ms / finished);
        }
        metrics
    }
}

/// Execution collaborator.
///
/// Implementations must be shareable across tasks; the chain runner calls
/// `execute` concurrently for the workflows of a parallel step.
pub trait WorkflowService: Send + Sync {
    /// Run one workflow of the given kind to completion.
    ///
    /// A workflow that ran and failed is `Ok` with `success == false`. `Err`
    /// is reserved for the service itself being unreachable or broken.
    fn execute(&self, kind: WorkflowKind, params: WorkflowParams)
    -> ServiceFuture<'_, ExecutionResponse>;

    fn status(&self, id: InstanceId) -> ServiceFuture<'_, Option<InstanceRecord>>;

    /// Ask a running instance to stop.
    fn cancel(&self, id: InstanceId) -> ServiceFuture<'_, ExecutionResponse>;

    /// Most recent instances first.
    fn history(&self, limit: usize) -> ServiceFuture<'_, Vec<InstanceRecord>>;

    fn metrics(&self) -> ServiceFuture<'_, ServiceMetrics>;

    fn backpopulate(&self, params: WorkflowParams) -> ServiceFuture<'_, ExecutionResponse> {
        self.execute(WorkflowKind::Backpopulate, params)
    }

    fn sync(&self, params: WorkflowParams) -> ServiceFuture<'_, ExecutionResponse> {
        self.execute(WorkflowKind::Sync, params)
    }

    fn cleanup(&self, params: WorkflowParams) -> ServiceFuture<'_, ExecutionResponse> {
        self.execute(WorkflowKind::Cleanup, params)
    }

    fn validate(&self, params: WorkflowParams) -> ServiceFuture<'_, ExecutionResponse> {
        self.execute(WorkflowKind::Validation, params)
    }

    fn migrate(&self, params: WorkflowParams) -> ServiceFuture<'_, ExecutionResponse> {
        self.execute(WorkflowKind::Migration, params)
    }

    fn audit(&self, params: WorkflowParams) -> ServiceFuture<'_, ExecutionResponse> {
        self.execute(WorkflowKind::Audit, params)
    }

    fn reconcile(&self, params: WorkflowParams) -> ServiceFuture<'_, ExecutionResponse> {
        self.execute(WorkflowKind::Reconciliation, params)
    }
}
