// src/exec/simulated.rs

//! In-process stand-in for a workflow runner.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::service::{
    ExecutionResponse, InstanceId, InstanceRecord, InstanceState, ServiceFuture, ServiceMetrics,
    WorkflowParams, WorkflowService,
};
use crate::types::WorkflowKind;

/// Fake [`WorkflowService`]: every workflow "runs" for a fixed delay and
/// then succeeds, unless its kind was marked as failing.
///
/// Instances are recorded, so `status`, `history` and `metrics` report what
/// actually happened. `cancel` interrupts a running instance.
///
/// At most `history_limit` records are kept; the oldest finished ones are
/// evicted first. Running instances are never evicted.
#[derive(Debug)]
pub struct SimulatedWorkflowService {
    delay: Duration,
    failing: HashSet<WorkflowKind>,
    history_limit: usize,
    started: AtomicUsize,
    instances: Mutex<VecDeque<InstanceRecord>>,
    running: Mutex<HashMap<InstanceId, CancellationToken>>,
}

pub const DEFAULT_HISTORY_LIMIT: usize = 1000;

impl Default for SimulatedWorkflowService {
    fn default() -> Self {
        Self {
            delay: Duration::ZERO,
            failing: HashSet::new(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            started: AtomicUsize::new(0),
            instances: Mutex::new(VecDeque::new()),
            running: Mutex::new(HashMap::new()),
        }
    }
}

impl SimulatedWorkflowService {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    /// Keep at most `limit` instance records (at least one).
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    /// Make every workflow of `kind` report failure.
    pub fn failing(mut self, kind: WorkflowKind) -> Self {
        self.failing.insert(kind);
        self
    }

    fn start(&self, kind: WorkflowKind, params: WorkflowParams) -> (InstanceId, CancellationToken) {
        let id = InstanceId::generate();
        let token = CancellationToken::new();
        self.started.fetch_add(1, Ordering::Relaxed);
        let mut instances = self.instances.lock();
        while instances.len() >= self.history_limit {
            let Some(oldest) = instances.iter().position(|r| r.state.is_finished()) else {
                break;
            };
            instances.remove(oldest);
        }
        instances.push_back(InstanceRecord {
            id,
            kind,
            state: InstanceState::Running,
            started_at: Utc::now(),
            finished_at: None,
            params,
            message: String::new(),
        });
        drop(instances);
        self.running.lock().insert(id, token.clone());
        (id, token)
    }

    fn finish(&self, id: InstanceId, state: InstanceState, message: &str) {
        self.running.lock().remove(&id);
        let mut instances = self.instances.lock();
        if let Some(record) = instances.iter_mut().find(|r| r.id == id) {
            if record.state.is_finished() {
                return;
            }
            record.state = state;
            record.finished_at = Some(Utc::now());
            record.message = message.to_string();
        }
    }

    fn placeholder_data(&self, kind: WorkflowKind, params: &WorkflowParams) -> serde_json::Value {
        let sequence = self.started.load(Ordering::Relaxed);
        json!({
            "operation": kind.operation(),
            "records_processed": sequence * 100 + params.len() * 10,
            "duration_ms": self.delay.as_millis() as u64,
        })
    }
}

/// Marks the instance cancelled if the `execute` future is dropped before
/// it finishes.
struct InstanceGuard<'a> {
    service: &'a SimulatedWorkflowService,
    id: InstanceId,
    done: bool,
}

impl Drop for InstanceGuard<'_> {
    fn drop(&mut self) {
        if !self.done {
            debug!(instance = %self.id, "workflow abandoned by caller");
            self.service
                .finish(self.id, InstanceState::Cancelled, "abandoned");
        }
    }
}

impl WorkflowService for SimulatedWorkflowService {
    fn execute(
        &self,
        kind: WorkflowKind,
        params: WorkflowParams,
    ) -> ServiceFuture<'_, ExecutionResponse> {
        Box::pin(async move {
            let (id, token) = self.start(kind, params.clone());
            let mut guard = InstanceGuard {
                service: self,
                id,
                done: false,
            };
            info!(instance = %id, operation = kind.operation(), "workflow started");

            let cancelled = tokio::select! {
                _ = tokio::time::sleep(self.delay) => false,
                _ = token.cancelled() => true,
            };

            let (state, response) = if cancelled {
                (
                    InstanceState::Cancelled,
                    ExecutionResponse::failed(
                        format!("{} cancelled", kind.operation()),
                        "cancelled",
                    ),
                )
            } else if self.failing.contains(&kind) {
                (
                    InstanceState::Failed,
                    ExecutionResponse::failed(
                        format!("{} failed", kind.operation()),
                        "simulated failure",
                    ),
                )
            } else {
                let data = self.placeholder_data(kind, &params);
                (
                    InstanceState::Completed,
                    ExecutionResponse::ok(format!("{} completed", kind.operation()), Some(data)),
                )
            };

            self.finish(id, state, &response.message);
            guard.done = true;

            if response.success {
                info!(instance = %id, operation = kind.operation(), "workflow completed");
            } else {
                warn!(instance = %id, operation = kind.operation(), state = %state, "workflow did not complete");
            }
            Ok(response.with_instance(id))
        })
    }

    fn status(&self, id: InstanceId) -> ServiceFuture<'_, Option<InstanceRecord>> {
        Box::pin(async move { Ok(self.instances.lock().iter().find(|r| r.id == id).cloned()) })
    }

    fn cancel(&self, id: InstanceId) -> ServiceFuture<'_, ExecutionResponse> {
        Box::pin(async move {
            let token = self.running.lock().get(&id).cloned();
            let response = match token {
                Some(token) => {
                    token.cancel();
                    info!(instance = %id, "cancellation requested");
                    ExecutionResponse::ok("cancellation requested", None)
                }
                None => ExecutionResponse::failed("cannot cancel", "instance is not running"),
            };
            Ok(response.with_instance(id))
        })
    }

    fn history(&self, limit: usize) -> ServiceFuture<'_, Vec<InstanceRecord>> {
        Box::pin(async move {
            Ok(self
                .instances
                .lock()
                .iter()
                .rev()
                .take(limit)
                .cloned()
                .collect())
        })
    }

    fn metrics(&self) -> ServiceFuture<'_, ServiceMetrics> {
        Box::pin(async move { Ok(ServiceMetrics::from_records(self.instances.lock().iter())) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn execute_records_a_completed_instance() {
        let service = SimulatedWorkflowService::new(Duration::from_millis(5));
        let response = service.sync(WorkflowParams::new()).await.unwrap();

        assert!(response.success);
        assert_eq!(response.message, "sync completed");
        assert_eq!(response.data.as_ref().unwrap()["operation"], "sync");

        let id = response.instance_id.unwrap();
        let record = service.status(id).await.unwrap().unwrap();
        assert_eq!(record.state, InstanceState::Completed);
        assert!(record.finished_at.is_some());
    }

    #[tokio::test]
    async fn failing_kind_reports_failure() {
        let service =
            SimulatedWorkflowService::new(Duration::from_millis(1)).failing(WorkflowKind::Audit);
        let response = service.audit(WorkflowParams::new()).await.unwrap();
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("simulated failure"));

        let metrics = service.metrics().await.unwrap();
        assert_eq!(metrics.failed, 1);
        assert_eq!(metrics.total, 1);
    }

    #[tokio::test]
    async fn cancel_interrupts_a_running_instance() {
        let service = Arc::new(SimulatedWorkflowService::new(Duration::from_secs(30)));
        let runner = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.cleanup(WorkflowParams::new()).await })
        };

        let id = loop {
            if let Some(record) = service.history(1).await.unwrap().first() {
                break record.id;
            }
            tokio::task::yield_now().await;
        };

        let ack = service.cancel(id).await.unwrap();
        assert!(ack.success);

        let response = runner.await.unwrap().unwrap();
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("cancelled"));

        let record = service.status(id).await.unwrap().unwrap();
        assert_eq!(record.state, InstanceState::Cancelled);
    }

    #[tokio::test]
    async fn dropped_future_marks_instance_cancelled() {
        let service = SimulatedWorkflowService::new(Duration::from_secs(30));
        let abandoned = tokio::time::timeout(
            Duration::from_millis(10),
            service.migrate(WorkflowParams::new()),
        )
        .await;
        assert!(abandoned.is_err());

        let history = service.history(10).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].state, InstanceState::Cancelled);
        assert_eq!(service.metrics().await.unwrap().running, 0);
    }

    #[tokio::test]
    async fn history_is_newest_first_and_limited() {
        let service = SimulatedWorkflowService::new(Duration::ZERO);
        service.sync(WorkflowParams::new()).await.unwrap();
        service.audit(WorkflowParams::new()).await.unwrap();
        service.cleanup(WorkflowParams::new()).await.unwrap();

        let history = service.history(2).await.unwrap();
        let kinds: Vec<_> = history.iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![WorkflowKind::Cleanup, WorkflowKind::Audit]);
    }

    #[tokio::test]
    async fn history_is_capped_at_the_limit() {
        let service = SimulatedWorkflowService::new(Duration::ZERO).with_history_limit(2);
        service.sync(WorkflowParams::new()).await.unwrap();
        service.audit(WorkflowParams::new()).await.unwrap();
        service.cleanup(WorkflowParams::new()).await.unwrap();

        let kinds: Vec<_> = service
            .history(10)
            .await
            .unwrap()
            .iter()
            .map(|r| r.kind)
            .collect();
        assert_eq!(kinds, vec![WorkflowKind::Cleanup, WorkflowKind::Audit]);
        assert_eq!(service.metrics().await.unwrap().total, 2);
    }

    #[tokio::test]
    async fn running_instances_are_not_evicted() {
        let service = Arc::new(
            SimulatedWorkflowService::new(Duration::from_secs(30)).with_history_limit(1),
        );
        let first = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.sync(WorkflowParams::new()).await })
        };
        while service.history(1).await.unwrap().is_empty() {
            tokio::task::yield_now().await;
        }
        let second = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.audit(WorkflowParams::new()).await })
        };
        while service.history(10).await.unwrap().len() < 2 {
            tokio::task::yield_now().await;
        }

        assert_eq!(service.metrics().await.unwrap().running, 2);
        first.abort();
        second.abort();
    }
}
