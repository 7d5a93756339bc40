// src/config/model.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::exec::SimulatedWorkflowService;
use crate::exec::simulated::DEFAULT_HISTORY_LIMIT;
use crate::registry::StaticRegistry;
use crate::schedule::WorkflowInfo;

/// Configuration as read from `Cronchain.toml`, before validation.
///
/// ```toml
/// [config]
/// store = "schedules.toml"
/// poll_interval_secs = 30
/// refresh_interval_secs = 5
/// simulated_delay_ms = 250
/// history_limit = 1000
///
/// [[workflow]]
/// id = "wf-sync"
/// name = "Sync Market Data"
/// type = "sync"
/// ```
///
/// Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// Replaces the built-in workflow catalog when non-empty.
    #[serde(default)]
    pub workflow: Vec<WorkflowInfo>,
}

/// `[config]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConfigSection {
    /// Schedule store file. Relative paths are resolved against the
    /// directory holding the config file.
    #[serde(default = "default_store")]
    pub store: PathBuf,

    /// How often the trigger daemon polls the store.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// How often `watch` redraws its board.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    /// How long each simulated workflow takes.
    #[serde(default = "default_simulated_delay_ms")]
    pub simulated_delay_ms: u64,

    /// Instance records the simulated service keeps.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_store() -> PathBuf {
    PathBuf::from("schedules.toml")
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_refresh_interval_secs() -> u64 {
    5
}

fn default_simulated_delay_ms() -> u64 {
    250
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            store: default_store(),
            poll_interval_secs: default_poll_interval_secs(),
            refresh_interval_secs: default_refresh_interval_secs(),
            simulated_delay_ms: default_simulated_delay_ms(),
            history_limit: default_history_limit(),
        }
    }
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub workflows: Vec<WorkflowInfo>,
    base_dir: PathBuf,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(config: ConfigSection, workflows: Vec<WorkflowInfo>) -> Self {
        Self {
            config,
            workflows,
            base_dir: PathBuf::new(),
        }
    }

    /// Directory that relative paths in the file are resolved against.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn store_path(&self) -> PathBuf {
        if self.config.store.is_absolute() {
            self.config.store.clone()
        } else {
            self.base_dir.join(&self.config.store)
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.config.poll_interval_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.config.refresh_interval_secs)
    }

    pub fn simulated_delay(&self) -> Duration {
        Duration::from_millis(self.config.simulated_delay_ms)
    }

    /// The workflow service the CLI runs chains against.
    pub fn simulated_service(&self) -> SimulatedWorkflowService {
        SimulatedWorkflowService::new(self.simulated_delay())
            .with_history_limit(self.config.history_limit)
    }

    /// The configured catalog, or the built-in one if none was given.
    pub fn registry(&self) -> StaticRegistry {
        if self.workflows.is_empty() {
            StaticRegistry::builtin()
        } else {
            StaticRegistry::new(self.workflows.clone())
        }
    }
}
