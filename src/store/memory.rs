// src/store/memory.rs

use crate::errors::Result;
use crate::schedule::Schedule;
use crate::store::ScheduleRepository;
use crate::types::ScheduleId;

/// Process-local repository. Nothing survives a restart.
#[derive(Debug, Clone, Default)]
pub struct InMemoryScheduleRepository {
    schedules: Vec<Schedule>,
}

impl InMemoryScheduleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeded repository.
    pub fn with_schedules(schedules: Vec<Schedule>) -> Self {
        Self { schedules }
    }
}

impl ScheduleRepository for InMemoryScheduleRepository {
    fn list(&self) -> Result<Vec<Schedule>> {
        Ok(self.schedules.clone())
    }

    fn get(&self, id: &ScheduleId) -> Result<Option<Schedule>> {
        Ok(self.schedules.iter().find(|s| &s.id == id).cloned())
    }

    fn save(&mut self, schedule: Schedule) -> Result<()> {
        upsert(&mut self.schedules, schedule);
        Ok(())
    }

    fn remove(&mut self, id: &ScheduleId) -> Result<bool> {
        let before = self.schedules.len();
        self.schedules.retain(|s| &s.id != id);
        Ok(self.schedules.len() != before)
    }
}

/// Replace the entry with the same id in place, or append.
pub(crate) fn upsert(schedules: &mut Vec<Schedule>, schedule: Schedule) {
    match schedules.iter_mut().find(|s| s.id == schedule.id) {
        Some(slot) => *slot = schedule,
        None => schedules.push(schedule),
    }
}
