// src/store/mod.rs

//! Schedule persistence and the CRUD service on top of it.
//!
//! - [`ScheduleRepository`] is the storage seam. [`memory`] keeps schedules
//!   in a `Vec`; [`file`] persists them to a TOML file.
//! - [`ScheduleStore`] validates drafts and applies the editing rules
//!   (status follows `enabled`, delete is idempotent, and so on).

pub mod file;
pub mod memory;

use std::fmt::Debug;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::errors::{CronchainError, Result};
use crate::exec::ChainReport;
use crate::schedule::{Schedule, ScheduleDraft};
use crate::types::{ScheduleId, ScheduleStatus};

pub use file::TomlScheduleRepository;
pub use memory::InMemoryScheduleRepository;

/// Storage for committed schedules, keyed by `Schedule::id`.
pub trait ScheduleRepository: Send + Debug {
    /// All schedules in insertion order.
    fn list(&self) -> Result<Vec<Schedule>>;

    fn get(&self, id: &ScheduleId) -> Result<Option<Schedule>>;

    /// Insert, or replace an existing entry in place.
    fn save(&mut self, schedule: Schedule) -> Result<()>;

    /// Returns whether an entry was removed.
    fn remove(&mut self, id: &ScheduleId) -> Result<bool>;

    /// Pick up changes made outside this process. No-op by default.
    fn refresh(&mut self) -> Result<()> {
        Ok(())
    }
}

/// The committed schedule collection.
#[derive(Debug)]
pub struct ScheduleStore<R: ScheduleRepository> {
    repo: R,
}

impl<R: ScheduleRepository> ScheduleStore<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn list(&self) -> Result<Vec<Schedule>> {
        self.repo.list()
    }

    /// Re-read the backing storage.
    pub fn reload(&mut self) -> Result<()> {
        self.repo.refresh()
    }

    pub fn find(&self, id: &ScheduleId) -> Result<Option<Schedule>> {
        self.repo.get(id)
    }

    pub fn get(&self, id: &ScheduleId) -> Result<Schedule> {
        self.repo
            .get(id)?
            .ok_or_else(|| CronchainError::NotFound(id.clone()))
    }

    /// Validate and commit a new schedule.
    pub fn create(&mut self, draft: &ScheduleDraft) -> Result<Schedule> {
        let cron = draft.validate()?;

        let schedule = Schedule {
            id: ScheduleId::generate(),
            name: draft.name.trim().to_string(),
            description: draft.description.clone(),
            cron,
            enabled: draft.enabled,
            status: ScheduleStatus::for_enabled(draft.enabled),
            next_run: None,
            last_run: None,
            steps: draft.steps.as_slice().to_vec(),
        };

        self.repo.save(schedule.clone())?;
        info!(
            schedule = %schedule.id,
            name = %schedule.name,
            cron = %schedule.cron,
            steps = schedule.steps.len(),
            "schedule created"
        );
        Ok(schedule)
    }

    /// Validate and replace the schedule with the given id.
    ///
    /// Keeps `last_run`. A changed cron expression clears `next_run` so the
    /// trigger recomputes it; a changed `enabled` flag resets `status`.
    pub fn update(&mut self, id: &ScheduleId, draft: &ScheduleDraft) -> Result<Schedule> {
        let cron = draft.validate()?;
        let existing = self.get(id)?;

        let next_run = if existing.cron == cron {
            existing.next_run
        } else {
            debug!(schedule = %id, old = %existing.cron, new = %cron, "cron changed; clearing next_run");
            None
        };
        let status = if existing.enabled == draft.enabled {
            existing.status
        } else {
            ScheduleStatus::for_enabled(draft.enabled)
        };

        let updated = Schedule {
            id: existing.id,
            name: draft.name.trim().to_string(),
            description: draft.description.clone(),
            cron,
            enabled: draft.enabled,
            status,
            next_run,
            last_run: existing.last_run,
            steps: draft.steps.as_slice().to_vec(),
        };

        self.repo.save(updated.clone())?;
        info!(schedule = %updated.id, name = %updated.name, "schedule updated");
        Ok(updated)
    }

    /// Remove a schedule. Deleting an unknown id is a no-op returning
    /// `false`.
    pub fn delete(&mut self, id: &ScheduleId) -> Result<bool> {
        let removed = self.repo.remove(id)?;
        if removed {
            info!(schedule = %id, "schedule deleted");
        } else {
            debug!(schedule = %id, "delete of unknown schedule ignored");
        }
        Ok(removed)
    }

    /// Set `enabled`; status becomes `active` or `paused` to match. Run
    /// timestamps are left alone.
    pub fn toggle_enabled(&mut self, id: &ScheduleId, enabled: bool) -> Result<Schedule> {
        let mut schedule = self.get(id)?;
        schedule.enabled = enabled;
        schedule.status = ScheduleStatus::for_enabled(enabled);
        self.repo.save(schedule.clone())?;
        info!(schedule = %id, enabled, status = %schedule.status, "schedule toggled");
        Ok(schedule)
    }

    /// Trigger bookkeeping: when the schedule should fire next.
    pub fn set_next_run(&mut self, id: &ScheduleId, next_run: Option<DateTime<Utc>>) -> Result<()> {
        self.repo.refresh()?;
        let mut schedule = self.get(id)?;
        if schedule.next_run == next_run {
            return Ok(());
        }
        if next_run.is_none() && schedule.enabled {
            warn!(schedule = %id, cron = %schedule.cron, "cron expression never fires");
        }
        schedule.next_run = next_run;
        self.repo.save(schedule)
    }

    /// Trigger bookkeeping: record a finished chain run.
    ///
    /// Re-reads the backing storage first; a chain can run for a long time
    /// and the schedule may have been edited meanwhile.
    pub fn record_run(&mut self, id: &ScheduleId, report: &ChainReport) -> Result<Schedule> {
        self.repo.refresh()?;
        let mut schedule = self.get(id)?;
        schedule.last_run = Some(report.started_at);
        // A schedule disabled mid-run stays paused.
        if let Some(status) = report.status.schedule_status().filter(|_| schedule.enabled) {
            schedule.status = status;
        }
        self.repo.save(schedule.clone())?;
        debug!(schedule = %id, status = %schedule.status, "recorded chain run");
        Ok(schedule)
    }
}
