// src/exec/chain_runner.rs

//! Runs a schedule's step chain through a [`WorkflowService`].
//!
//! Steps run strictly in order. The workflows of a parallel step are started
//! together and the step finishes when all of them have. The first step with
//! a failed workflow ends the chain; later steps are never started.

use std::fmt;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::service::{ExecutionResponse, WorkflowParams, WorkflowService};
use crate::schedule::{Schedule, Step, WorkflowInfo};
use crate::types::{ScheduleId, ScheduleStatus, StepId};

/// How a chain run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ChainStatus {
    Completed,
    Failed { step: StepId },
    Cancelled { step: StepId },
}

impl ChainStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ChainStatus::Completed)
    }

    /// Schedule status to record after this run. A cancelled run says
    /// nothing about the schedule's health.
    pub fn schedule_status(&self) -> Option<ScheduleStatus> {
        match self {
            ChainStatus::Completed => Some(ScheduleStatus::Active),
            ChainStatus::Failed { .. } => Some(ScheduleStatus::Error),
            ChainStatus::Cancelled { .. } => None,
        }
    }
}

impl fmt::Display for ChainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainStatus::Completed => f.write_str("completed"),
            ChainStatus::Failed { step } => write!(f, "failed at {step}"),
            ChainStatus::Cancelled { step } => write!(f, "cancelled at {step}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowOutcome {
    pub workflow: WorkflowInfo,
    pub response: ExecutionResponse,
}

impl WorkflowOutcome {
    pub fn succeeded(&self) -> bool {
        self.response.success
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepReport {
    pub step: StepId,
    pub index: usize,
    pub parallel: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<WorkflowOutcome>,
}

impl StepReport {
    pub fn succeeded(&self) -> bool {
        self.outcomes.iter().all(WorkflowOutcome::succeeded)
    }
}

/// Execution log of one chain run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainReport {
    pub schedule: ScheduleId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub steps: Vec<StepReport>,
    pub status: ChainStatus,
}

impl fmt::Display for ChainReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "run of {} started {}: {}",
            self.schedule,
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.status
        )?;
        for step in &self.steps {
            let mode = if step.parallel { "parallel" } else { "sequential" };
            writeln!(f, "  step {} ({}, {mode})", step.index + 1, step.step)?;
            for outcome in &step.outcomes {
                let mark = if outcome.succeeded() { "ok" } else { "FAILED" };
                write!(f, "    [{mark}] {}: {}", outcome.workflow.name, outcome.response.message)?;
                if let Some(error) = &outcome.response.error {
                    write!(f, " ({error})")?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// Run `schedule`'s chain. Never fails: service errors become failed
/// workflow outcomes in the report.
///
/// If `cancel` fires, the in-flight step is dropped and the report ends with
/// [`ChainStatus::Cancelled`].
pub async fn run_chain<S>(
    service: &S,
    schedule: &Schedule,
    params: &WorkflowParams,
    cancel: &CancellationToken,
) -> ChainReport
where
    S: WorkflowService + ?Sized,
{
    let started_at = Utc::now();
    let mut steps = Vec::with_capacity(schedule.steps.len());
    let mut status = ChainStatus::Completed;

    info!(
        schedule = %schedule.id,
        name = %schedule.name,
        steps = schedule.steps.len(),
        "chain run started"
    );

    for (index, step) in schedule.steps.iter().enumerate() {
        if cancel.is_cancelled() {
            status = ChainStatus::Cancelled {
                step: step.id().clone(),
            };
            break;
        }

        let step_started = Utc::now();
        let outcomes = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            outcomes = run_step(service, schedule, step, params) => Some(outcomes),
        };

        let Some(outcomes) = outcomes else {
            warn!(schedule = %schedule.id, step = %step.id(), "chain run cancelled");
            status = ChainStatus::Cancelled {
                step: step.id().clone(),
            };
            break;
        };

        let report = StepReport {
            step: step.id().clone(),
            index,
            parallel: step.is_parallel(),
            started_at: step_started,
            finished_at: Utc::now(),
            outcomes,
        };
        let succeeded = report.succeeded();
        steps.push(report);

        if !succeeded {
            warn!(schedule = %schedule.id, step = %step.id(), "step failed; stopping chain");
            status = ChainStatus::Failed {
                step: step.id().clone(),
            };
            break;
        }
        debug!(schedule = %schedule.id, step = %step.id(), "step completed");
    }

    info!(schedule = %schedule.id, status = %status, "chain run finished");
    ChainReport {
        schedule: schedule.id.clone(),
        started_at,
        finished_at: Utc::now(),
        steps,
        status,
    }
}

async fn run_step<S>(
    service: &S,
    schedule: &Schedule,
    step: &Step,
    params: &WorkflowParams,
) -> Vec<WorkflowOutcome>
where
    S: WorkflowService + ?Sized,
{
    let runs = step.workflows().iter().map(|workflow| {
        let mut params = params.clone();
        params.insert("schedule_id".into(), Value::from(schedule.id.as_str()));
        params.insert("step_id".into(), Value::from(step.id().as_str()));
        params.insert("workflow_id".into(), Value::from(workflow.id.as_str()));

        async move {
            let response = match service.execute(workflow.kind, params).await {
                Ok(response) => response,
                Err(err) => ExecutionResponse::failed(
                    format!("{} could not be executed", workflow.kind.operation()),
                    err.to_string(),
                ),
            };
            WorkflowOutcome {
                workflow: workflow.clone(),
                response,
            }
        }
    });

    join_all(runs).await
}
