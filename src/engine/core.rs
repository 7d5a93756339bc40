// src/engine/core.rs

//! Pure trigger planning.
//!
//! [`plan_tick`] looks at a snapshot of the schedule collection and a clock
//! reading, and decides:
//! - which schedules are due to run now
//! - what each schedule's `next_run` should become
//!
//! It performs no IO and holds no state, so the trigger rules can be unit
//! tested with fixed timestamps. The async shell in [`super::runtime`]
//! applies the plan.

use chrono::{DateTime, Utc};

use crate::schedule::Schedule;
use crate::types::ScheduleId;

/// A `next_run` assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reschedule {
    pub schedule: ScheduleId,
    /// `None` when the expression can never fire again.
    pub next_run: Option<DateTime<Utc>>,
}

/// Outcome of one planning pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickPlan {
    /// Schedules to run now, in collection order.
    pub due: Vec<ScheduleId>,
    pub reschedule: Vec<Reschedule>,
}

impl TickPlan {
    pub fn is_empty(&self) -> bool {
        self.due.is_empty() && self.reschedule.is_empty()
    }
}

/// Decide what the trigger does at `now`.
///
/// - Disabled schedules are skipped entirely.
/// - An enabled schedule without `next_run` is only scheduled, never run.
/// - An enabled schedule whose `next_run` has arrived is due, and its
///   `next_run` moves to the first match after `now`. Missed firings
///   collapse into this one run.
pub fn plan_tick(schedules: &[Schedule], now: DateTime<Utc>) -> TickPlan {
    let mut plan = TickPlan::default();

    for schedule in schedules.iter().filter(|s| s.enabled) {
        match schedule.next_run {
            None => plan.reschedule.push(Reschedule {
                schedule: schedule.id.clone(),
                next_run: schedule.cron.next_after(&now),
            }),
            Some(next) if next <= now => {
                plan.due.push(schedule.id.clone());
                plan.reschedule.push(Reschedule {
                    schedule: schedule.id.clone(),
                    next_run: schedule.cron.next_after(&now),
                });
            }
            Some(_) => {}
        }
    }

    plan
}
