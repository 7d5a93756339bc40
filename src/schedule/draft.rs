// src/schedule/draft.rs

//! Drafts and the editing session around them.
//!
//! Edits accumulate in a [`ScheduleDraft`] that is separate from the
//! committed schedule. A [`DraftSession`] remembers what the draft looked
//! like when editing started (or when it was last saved) so it can tell
//! whether closing would throw work away.

use tracing::{debug, info};

use crate::cron::{CronBuilder, CronError, CronExpression, CronSchedule};
use crate::errors::{CronchainError, Result};
use crate::schedule::validate::{ValidationError, validate_draft};
use crate::schedule::{Schedule, StepChain};
use crate::store::{ScheduleRepository, ScheduleStore};
use crate::types::ScheduleId;

/// Uncommitted form of a schedule. May be invalid until saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleDraft {
    pub name: String,
    pub description: String,
    pub cron: String,
    pub enabled: bool,
    pub steps: StepChain,
}

impl Default for ScheduleDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            cron: CronBuilder::default().expression(),
            enabled: true,
            steps: StepChain::new(),
        }
    }
}

impl ScheduleDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Editable copy of a committed schedule.
    pub fn from_schedule(schedule: &Schedule) -> Self {
        Self {
            name: schedule.name.clone(),
            description: schedule.description.clone(),
            cron: schedule.cron.to_string(),
            enabled: schedule.enabled,
            steps: StepChain::from_steps(schedule.steps.clone()),
        }
    }

    pub fn validate(&self) -> std::result::Result<CronExpression, ValidationError> {
        validate_draft(self)
    }

    /// Editor form for the current cron text.
    pub fn cron_builder(&self) -> std::result::Result<CronBuilder, CronError> {
        CronBuilder::from_expression(&self.cron)
    }

    pub fn set_schedule(&mut self, schedule: &CronSchedule) {
        self.cron = schedule.encode();
    }
}

/// An open editor: the draft plus the state it started from.
#[derive(Debug, Clone)]
pub struct DraftSession {
    committed: Option<ScheduleId>,
    baseline: ScheduleDraft,
    draft: ScheduleDraft,
}

impl Default for DraftSession {
    fn default() -> Self {
        Self::new()
    }
}

impl DraftSession {
    /// Session for a brand-new schedule.
    pub fn new() -> Self {
        let draft = ScheduleDraft::new();
        Self {
            committed: None,
            baseline: draft.clone(),
            draft,
        }
    }

    /// Session editing a committed schedule. The schedule itself is left
    /// untouched until [`DraftSession::save`].
    pub fn edit(schedule: &Schedule) -> Self {
        let draft = ScheduleDraft::from_schedule(schedule);
        debug!(schedule = %schedule.id, "opened draft for existing schedule");
        Self {
            committed: Some(schedule.id.clone()),
            baseline: draft.clone(),
            draft,
        }
    }

    /// Id of the committed schedule being edited, if any.
    pub fn schedule_id(&self) -> Option<&ScheduleId> {
        self.committed.as_ref()
    }

    pub fn draft(&self) -> &ScheduleDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut ScheduleDraft {
        &mut self.draft
    }

    pub fn is_dirty(&self) -> bool {
        self.draft != self.baseline
    }

    /// Commit the draft: create on first save, update afterwards.
    ///
    /// On failure the session stays open with the draft unchanged.
    pub fn save<R: ScheduleRepository>(&mut self, store: &mut ScheduleStore<R>) -> Result<Schedule> {
        let saved = match &self.committed {
            Some(id) => store.update(id, &self.draft)?,
            None => store.create(&self.draft)?,
        };

        info!(schedule = %saved.id, name = %saved.name, "draft saved");
        self.committed = Some(saved.id.clone());
        self.baseline = ScheduleDraft::from_schedule(&saved);
        self.draft = self.baseline.clone();
        Ok(saved)
    }

    /// Close the editor. Fails with `DiscardConfirmation` while there are
    /// unsaved edits; call [`DraftSession::discard`] once confirmed.
    pub fn close(&self) -> Result<()> {
        if self.is_dirty() {
            return Err(CronchainError::DiscardConfirmation {
                name: self.draft.name.clone(),
            });
        }
        Ok(())
    }

    /// Drop the draft without saving.
    pub fn discard(self) {
        if self.is_dirty() {
            info!(name = %self.draft.name, "discarding unsaved draft");
        }
    }
}
