// src/store/file.rs

//! TOML-file schedule repository.
//!
//! File layout:
//!
//! ```toml
//! [[schedule]]
//! id = "5d0c..."
//! name = "Nightly sync"
//! cron = "0 2 * * *"
//! enabled = true
//! status = "active"
//!
//! [[schedule.step]]
//! mode = "sequential"
//! id = "step-1a2b3c4d"
//! workflow = { id = "wf-sync", name = "Sync Market Data", type = "sync" }
//!
//! [[schedule.step]]
//! mode = "parallel"
//! id = "step-5e6f7a8b"
//! workflows = [
//!   { id = "wf-audit", name = "Audit Trail Review", type = "audit" },
//!   { id = "wf-cleanup", name = "Cleanup Stale Records", type = "cleanup" },
//! ]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::Result;
use crate::fs::FileSystem;
use crate::schedule::Schedule;
use crate::store::ScheduleRepository;
use crate::store::memory::upsert;
use crate::types::ScheduleId;

#[derive(Debug, Default, Deserialize)]
struct ScheduleFile {
    #[serde(default, rename = "schedule")]
    schedules: Vec<Schedule>,
}

#[derive(Debug, Serialize)]
struct ScheduleFileRef<'a> {
    #[serde(rename = "schedule")]
    schedules: &'a [Schedule],
}

/// Parse the contents of a schedule file.
pub fn parse_schedule_file(contents: &str) -> Result<Vec<Schedule>> {
    let file: ScheduleFile = toml::from_str(contents)?;
    Ok(file.schedules)
}

/// Render schedules in the on-disk format.
pub fn render_schedule_file(schedules: &[Schedule]) -> Result<String> {
    Ok(toml::to_string(&ScheduleFileRef { schedules })?)
}

/// Durable repository: the whole collection lives in one TOML file that is
/// rewritten after every mutation.
///
/// Several processes may share the file. Every mutation re-reads it first,
/// so entries written elsewhere since the last read are kept.
#[derive(Debug)]
pub struct TomlScheduleRepository<F: FileSystem> {
    fs: F,
    path: PathBuf,
    schedules: Vec<Schedule>,
}

impl<F: FileSystem> TomlScheduleRepository<F> {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(fs: F, path: impl Into<PathBuf>) -> Result<Self> {
        let mut repo = Self {
            fs,
            path: path.into(),
            schedules: Vec::new(),
        };
        repo.reload()?;
        Ok(repo)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the file, picking up changes made by other processes.
    pub fn reload(&mut self) -> Result<()> {
        self.schedules = if self.fs.exists(&self.path) {
            let contents = self.fs.read_to_string(&self.path)?;
            parse_schedule_file(&contents)?
        } else {
            debug!(path = ?self.path, "schedule file missing; starting empty");
            Vec::new()
        };
        debug!(path = ?self.path, schedules = self.schedules.len(), "loaded schedule file");
        Ok(())
    }

    /// Write `next` to disk and adopt it only once the write succeeded.
    fn commit(&mut self, next: Vec<Schedule>) -> Result<()> {
        let rendered = render_schedule_file(&next)?;
        self.fs.write(&self.path, rendered.as_bytes())?;
        self.schedules = next;
        Ok(())
    }
}

impl<F: FileSystem> ScheduleRepository for TomlScheduleRepository<F> {
    fn list(&self) -> Result<Vec<Schedule>> {
        Ok(self.schedules.clone())
    }

    fn get(&self, id: &ScheduleId) -> Result<Option<Schedule>> {
        Ok(self.schedules.iter().find(|s| &s.id == id).cloned())
    }

    fn save(&mut self, schedule: Schedule) -> Result<()> {
        self.reload()?;
        let mut next = self.schedules.clone();
        upsert(&mut next, schedule);
        self.commit(next)
    }

    fn remove(&mut self, id: &ScheduleId) -> Result<bool> {
        self.reload()?;
        if !self.schedules.iter().any(|s| &s.id == id) {
            return Ok(false);
        }
        let next = self
            .schedules
            .iter()
            .filter(|s| &s.id != id)
            .cloned()
            .collect();
        self.commit(next)?;
        Ok(true)
    }

    fn refresh(&mut self) -> Result<()> {
        self.reload()
    }
}
