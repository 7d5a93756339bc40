#![allow(dead_code)]

use chrono::{DateTime, Utc};
use cronchain::config::{ConfigFile, RawConfigFile};
use cronchain::cron::CronExpression;
use cronchain::registry::{StaticRegistry, WorkflowRegistry};
use cronchain::schedule::{Schedule, ScheduleDraft, Step, StepChain, WorkflowInfo};
use cronchain::types::{ScheduleId, ScheduleStatus, WorkflowKind};

/// The built-in catalog entry for `kind`.
pub fn workflow(kind: WorkflowKind) -> WorkflowInfo {
    StaticRegistry::builtin()
        .resolve(&format!("wf-{kind}"))
        .expect("builtin catalog covers every kind")
}

/// Builder for `ScheduleDraft` to simplify test setup.
pub struct ScheduleDraftBuilder {
    draft: ScheduleDraft,
}

impl ScheduleDraftBuilder {
    pub fn new(name: &str) -> Self {
        let mut draft = ScheduleDraft::new();
        draft.name = name.to_string();
        Self { draft }
    }

    pub fn description(mut self, text: &str) -> Self {
        self.draft.description = text.to_string();
        self
    }

    pub fn cron(mut self, expr: &str) -> Self {
        self.draft.cron = expr.to_string();
        self
    }

    pub fn disabled(mut self) -> Self {
        self.draft.enabled = false;
        self
    }

    /// Append a sequential step.
    pub fn step(mut self, kind: WorkflowKind) -> Self {
        self.draft.steps.add_step(workflow(kind));
        self
    }

    /// Append a step running all `kinds` together.
    pub fn parallel(mut self, kinds: &[WorkflowKind]) -> Self {
        let (first, rest) = kinds.split_first().expect("parallel step needs workflows");
        let id = self.draft.steps.add_step(workflow(*first));
        for kind in rest {
            self.draft
                .steps
                .add_workflow_to_step(&id, workflow(*kind))
                .expect("step was just added");
        }
        self
    }

    pub fn build(self) -> ScheduleDraft {
        self.draft
    }
}

/// A committed-looking schedule without going through a store.
pub fn schedule(
    id: &str,
    cron: &str,
    kinds: &[WorkflowKind],
    next_run: Option<DateTime<Utc>>,
) -> Schedule {
    let mut steps = StepChain::new();
    for kind in kinds {
        steps.add_step(workflow(*kind));
    }
    Schedule {
        id: ScheduleId::from(id),
        name: id.to_string(),
        description: String::new(),
        cron: CronExpression::parse(cron).expect("valid cron in test"),
        enabled: true,
        status: ScheduleStatus::Active,
        next_run,
        last_run: None,
        steps: steps.into_steps(),
    }
}

/// Steps of a schedule, for assertions.
pub fn step_kinds(steps: &[Step]) -> Vec<Vec<WorkflowKind>> {
    steps
        .iter()
        .map(|step| step.workflows().iter().map(|wf| wf.kind).collect())
        .collect()
}

/// Builder for `ConfigFile`.
pub struct ConfigFileBuilder {
    raw: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            raw: RawConfigFile::default(),
        }
    }

    pub fn poll_interval_secs(mut self, secs: u64) -> Self {
        self.raw.config.poll_interval_secs = secs;
        self
    }

    pub fn with_workflow(mut self, id: &str, name: &str, kind: WorkflowKind) -> Self {
        self.raw.workflow.push(WorkflowInfo::new(id, name, kind));
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.raw).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
