use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use parking_lot::Mutex;

use cronchain::errors::CronchainError;
use cronchain::exec::{
    ExecutionResponse, InstanceId, InstanceRecord, ServiceFuture, ServiceMetrics, WorkflowParams,
    WorkflowService,
};
use cronchain::types::WorkflowKind;

/// What the fake service saw, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceEvent {
    Started(String),
    Finished(String),
}

/// A fake workflow service that:
/// - records when each workflow (by `workflow_id` param) starts and finishes
/// - sleeps for a fixed delay in between
/// - fails or errors for chosen workflow ids
#[derive(Debug, Clone, Default)]
pub struct RecordingWorkflowService {
    delay: Duration,
    failing: HashSet<String>,
    erroring: HashSet<String>,
    events: Arc<Mutex<Vec<ServiceEvent>>>,
}

impl RecordingWorkflowService {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    /// Report `success = false` for this workflow id.
    pub fn failing(mut self, workflow_id: &str) -> Self {
        self.failing.insert(workflow_id.to_string());
        self
    }

    /// Return `Err` from `execute` for this workflow id.
    pub fn erroring(mut self, workflow_id: &str) -> Self {
        self.erroring.insert(workflow_id.to_string());
        self
    }

    pub fn events(&self) -> Vec<ServiceEvent> {
        self.events.lock().clone()
    }

    /// Workflow ids in start order.
    pub fn started(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                ServiceEvent::Started(id) => Some(id.clone()),
                ServiceEvent::Finished(_) => None,
            })
            .collect()
    }
}

impl WorkflowService for RecordingWorkflowService {
    fn execute(
        &self,
        kind: WorkflowKind,
        params: WorkflowParams,
    ) -> ServiceFuture<'_, ExecutionResponse> {
        let id = params
            .get("workflow_id")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("wf-{kind}"));
        let events = Arc::clone(&self.events);
        let delay = self.delay;

        Box::pin(async move {
            events.lock().push(ServiceEvent::Started(id.clone()));
            tokio::time::sleep(delay).await;
            events.lock().push(ServiceEvent::Finished(id.clone()));

            if self.erroring.contains(&id) {
                return Err(CronchainError::Other(anyhow!("service unavailable")));
            }
            if self.failing.contains(&id) {
                return Ok(ExecutionResponse::failed(format!("{id} failed"), "boom"));
            }
            Ok(ExecutionResponse::ok(format!("{id} done"), None))
        })
    }

    fn status(&self, _id: InstanceId) -> ServiceFuture<'_, Option<InstanceRecord>> {
        Box::pin(async { Ok(None) })
    }

    fn cancel(&self, id: InstanceId) -> ServiceFuture<'_, ExecutionResponse> {
        Box::pin(async move {
            Ok(ExecutionResponse::failed("cannot cancel", "not tracked").with_instance(id))
        })
    }

    fn history(&self, _limit: usize) -> ServiceFuture<'_, Vec<InstanceRecord>> {
        Box::pin(async { Ok(Vec::new()) })
    }

    fn metrics(&self) -> ServiceFuture<'_, ServiceMetrics> {
        Box::pin(async { Ok(ServiceMetrics::default()) })
    }
}
