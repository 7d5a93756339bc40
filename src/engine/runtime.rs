// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::errors::{CronchainError, Result};
use crate::exec::{ChainReport, WorkflowParams, WorkflowService, run_chain};
use crate::store::{ScheduleRepository, ScheduleStore};

use super::core::plan_tick;

/// Knobs for [`TriggerRuntime`].
#[derive(Debug, Clone)]
pub struct TriggerOptions {
    pub poll_interval: Duration,
    /// Base parameters handed to every workflow run.
    pub params: WorkflowParams,
}

impl Default for TriggerOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            params: WorkflowParams::new(),
        }
    }
}

/// Polls the store, runs due chains and records their results.
///
/// The trigger rules live in [`plan_tick`]; this type only performs the IO:
/// reading and writing the store and calling the workflow service.
pub struct TriggerRuntime<R: ScheduleRepository> {
    store: ScheduleStore<R>,
    service: Arc<dyn WorkflowService>,
    options: TriggerOptions,
}

impl<R: ScheduleRepository> fmt::Debug for TriggerRuntime<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerRuntime")
            .field("store", &self.store)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<R: ScheduleRepository> TriggerRuntime<R> {
    pub fn new(
        store: ScheduleStore<R>,
        service: Arc<dyn WorkflowService>,
        options: TriggerOptions,
    ) -> Self {
        Self {
            store,
            service,
            options,
        }
    }

    pub fn store(&self) -> &ScheduleStore<R> {
        &self.store
    }

    /// Poll until `cancel` fires. Tick errors are logged and the loop keeps
    /// going; the store is handed back on exit.
    pub async fn run(mut self, cancel: CancellationToken) -> ScheduleStore<R> {
        info!(
            poll_interval_ms = self.options.poll_interval.as_millis() as u64,
            "trigger runtime started"
        );

        let mut interval = tokio::time::interval(self.options.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("cancellation requested; stopping trigger runtime");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(err) = self.run_once(&cancel).await {
                        error!(error = %err, "trigger tick failed");
                    }
                }
            }
        }

        info!("trigger runtime exiting");
        self.store
    }

    /// One tick at the current time.
    pub async fn run_once(&mut self, cancel: &CancellationToken) -> Result<Vec<ChainReport>> {
        self.tick(Utc::now(), cancel).await
    }

    /// One tick at `now`: apply the plan, then run the due chains one after
    /// another.
    pub async fn tick(
        &mut self,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<Vec<ChainReport>> {
        self.store.reload()?;
        let schedules = self.store.list()?;
        let plan = plan_tick(&schedules, now);

        if plan.is_empty() {
            debug!(schedules = schedules.len(), "nothing to do this tick");
            return Ok(Vec::new());
        }

        for change in &plan.reschedule {
            self.store.set_next_run(&change.schedule, change.next_run)?;
            if let Some(next) = change.next_run {
                debug!(schedule = %change.schedule, next_run = %next, "next run scheduled");
            }
        }

        let mut reports = Vec::with_capacity(plan.due.len());
        for id in &plan.due {
            if cancel.is_cancelled() {
                break;
            }
            let Some(schedule) = schedules.iter().find(|s| &s.id == id) else {
                continue;
            };

            info!(schedule = %id, name = %schedule.name, "schedule due");
            let report = run_chain(&*self.service, schedule, &self.options.params, cancel).await;

            match self.store.record_run(id, &report) {
                Ok(_) => {}
                Err(CronchainError::NotFound(_)) => {
                    warn!(schedule = %id, "schedule removed while its chain was running");
                }
                Err(err) => return Err(err),
            }
            reports.push(report);
        }

        Ok(reports)
    }
}
