// src/schedule/step.rs

//! Steps and the editable step chain.
//!
//! A step is either a single workflow or a parallel group of two or more.
//! A step with no workflows cannot exist: removing the last workflow removes
//! the step itself.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::errors::{CronchainError, Result};
use crate::schedule::WorkflowInfo;
use crate::types::StepId;

/// Two or more workflows started together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<WorkflowInfo>", into = "Vec<WorkflowInfo>")]
pub struct ParallelGroup(Vec<WorkflowInfo>);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("a parallel step needs at least 2 workflows, got {0}")]
pub struct ParallelGroupTooSmall(pub usize);

impl ParallelGroup {
    pub fn as_slice(&self) -> &[WorkflowInfo] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with slices.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<WorkflowInfo>> for ParallelGroup {
    type Error = ParallelGroupTooSmall;

    fn try_from(workflows: Vec<WorkflowInfo>) -> std::result::Result<Self, Self::Error> {
        if workflows.len() < 2 {
            return Err(ParallelGroupTooSmall(workflows.len()));
        }
        Ok(Self(workflows))
    }
}

impl From<ParallelGroup> for Vec<WorkflowInfo> {
    fn from(group: ParallelGroup) -> Self {
        group.0
    }
}

/// One stage of a schedule's chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Step {
    Sequential { id: StepId, workflow: WorkflowInfo },
    Parallel { id: StepId, workflows: ParallelGroup },
}

impl Step {
    /// New single-workflow step with a fresh id.
    pub fn sequential(workflow: WorkflowInfo) -> Self {
        Step::Sequential {
            id: StepId::generate(),
            workflow,
        }
    }

    /// Build the step shape that fits `workflows`: none gives `None`, one
    /// gives a sequential step, more gives a parallel one.
    pub fn from_workflows(id: StepId, mut workflows: Vec<WorkflowInfo>) -> Option<Self> {
        match workflows.len() {
            0 => None,
            1 => workflows.pop().map(|workflow| Step::Sequential { id, workflow }),
            _ => Some(Step::Parallel {
                id,
                workflows: ParallelGroup(workflows),
            }),
        }
    }

    pub fn id(&self) -> &StepId {
        match self {
            Step::Sequential { id, .. } | Step::Parallel { id, .. } => id,
        }
    }

    /// Workflows in display order.
    pub fn workflows(&self) -> &[WorkflowInfo] {
        match self {
            Step::Sequential { workflow, .. } => std::slice::from_ref(workflow),
            Step::Parallel { workflows, .. } => workflows.as_slice(),
        }
    }

    pub fn is_parallel(&self) -> bool {
        matches!(self, Step::Parallel { .. })
    }

    pub fn workflow_count(&self) -> usize {
        self.workflows().len()
    }

    fn with_workflow(self, workflow: WorkflowInfo) -> Step {
        match self {
            Step::Sequential {
                id,
                workflow: existing,
            } => Step::Parallel {
                id,
                workflows: ParallelGroup(vec![existing, workflow]),
            },
            Step::Parallel { id, workflows } => {
                let mut all = workflows.0;
                all.push(workflow);
                Step::Parallel {
                    id,
                    workflows: ParallelGroup(all),
                }
            }
        }
    }

    /// Remove the workflow at `index` (caller checks the bound). Returns the
    /// remaining step, if any, and the removed workflow.
    fn without_workflow(self, index: usize) -> (Option<Step>, WorkflowInfo) {
        match self {
            Step::Sequential { workflow, .. } => (None, workflow),
            Step::Parallel { id, workflows } => {
                let mut remaining = workflows.0;
                let removed = remaining.remove(index);
                (Step::from_workflows(id, remaining), removed)
            }
        }
    }
}

/// Ordered, editable list of steps held by a draft.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StepChain {
    steps: Vec<Step>,
}

impl StepChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_steps(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn as_slice(&self) -> &[Step] {
        &self.steps
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Step> {
        self.steps.iter()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, step_id: &StepId) -> Option<&Step> {
        self.steps.iter().find(|s| s.id() == step_id)
    }

    pub fn into_steps(self) -> Vec<Step> {
        self.steps
    }

    /// Append a single-workflow step and return its id.
    pub fn add_step(&mut self, workflow: WorkflowInfo) -> StepId {
        let step = Step::sequential(workflow);
        let id = step.id().clone();
        debug!(step = %id, position = self.steps.len(), "added step to chain");
        self.steps.push(step);
        id
    }

    pub fn remove_step(&mut self, step_id: &StepId) -> Result<Step> {
        let pos = self.position(step_id)?;
        debug!(step = %step_id, position = pos, "removed step from chain");
        Ok(self.steps.remove(pos))
    }

    /// Add a workflow to an existing step; a single-workflow step becomes
    /// parallel.
    pub fn add_workflow_to_step(&mut self, step_id: &StepId, workflow: WorkflowInfo) -> Result<()> {
        let pos = self.position(step_id)?;
        let current = self.steps[pos].clone();
        self.steps[pos] = current.with_workflow(workflow);
        debug!(
            step = %step_id,
            workflows = self.steps[pos].workflow_count(),
            "added workflow to step"
        );
        Ok(())
    }

    /// Remove the workflow at `index` from a step.
    ///
    /// Removing the last workflow removes the whole step; dropping a parallel
    /// step to one workflow turns it back into a sequential step.
    pub fn remove_workflow_from_step(&mut self, step_id: &StepId, index: usize) -> Result<WorkflowInfo> {
        let pos = self.position(step_id)?;
        let len = self.steps[pos].workflow_count();
        if index >= len {
            return Err(CronchainError::WorkflowIndexOutOfRange {
                step: step_id.clone(),
                index,
                len,
            });
        }

        let (remaining, removed) = self.steps[pos].clone().without_workflow(index);
        match remaining {
            Some(step) => self.steps[pos] = step,
            None => {
                self.steps.remove(pos);
                debug!(step = %step_id, "last workflow removed; step dropped from chain");
            }
        }
        Ok(removed)
    }

    /// Move a step to `new_index` (clamped to the end of the chain).
    pub fn move_step(&mut self, step_id: &StepId, new_index: usize) -> Result<()> {
        let pos = self.position(step_id)?;
        let step = self.steps.remove(pos);
        let target = new_index.min(self.steps.len());
        self.steps.insert(target, step);
        Ok(())
    }

    fn position(&self, step_id: &StepId) -> Result<usize> {
        self.steps
            .iter()
            .position(|s| s.id() == step_id)
            .ok_or_else(|| CronchainError::StepNotFound(step_id.clone()))
    }
}

impl From<Vec<Step>> for StepChain {
    fn from(steps: Vec<Step>) -> Self {
        Self::from_steps(steps)
    }
}

impl<'a> IntoIterator for &'a StepChain {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WorkflowKind;

    fn wf(kind: WorkflowKind) -> WorkflowInfo {
        WorkflowInfo::new(format!("wf-{kind}"), kind.as_str(), kind)
    }

    #[test]
    fn removing_only_workflow_removes_step() {
        let mut chain = StepChain::new();
        let first = chain.add_step(wf(WorkflowKind::Sync));
        let second = chain.add_step(wf(WorkflowKind::Audit));

        let removed = chain.remove_workflow_from_step(&first, 0).unwrap();
        assert_eq!(removed.kind, WorkflowKind::Sync);
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.as_slice()[0].id(), &second);
    }

    #[test]
    fn removing_from_pair_leaves_sequential_step() {
        let mut chain = StepChain::new();
        let id = chain.add_step(wf(WorkflowKind::Sync));
        chain.add_workflow_to_step(&id, wf(WorkflowKind::Cleanup)).unwrap();
        assert!(chain.get(&id).unwrap().is_parallel());

        chain.remove_workflow_from_step(&id, 0).unwrap();
        let step = chain.get(&id).unwrap();
        assert!(!step.is_parallel());
        assert_eq!(step.workflow_count(), 1);
        assert_eq!(step.workflows()[0].kind, WorkflowKind::Cleanup);
    }

    #[test]
    fn parallel_group_shrinks_but_stays_parallel() {
        let mut chain = StepChain::new();
        let id = chain.add_step(wf(WorkflowKind::Sync));
        chain.add_workflow_to_step(&id, wf(WorkflowKind::Audit)).unwrap();
        chain.add_workflow_to_step(&id, wf(WorkflowKind::Audit)).unwrap();

        chain.remove_workflow_from_step(&id, 1).unwrap();
        let step = chain.get(&id).unwrap();
        assert!(step.is_parallel());
        assert_eq!(step.workflow_count(), 2);
    }

    #[test]
    fn bad_step_or_index_is_reported() {
        let mut chain = StepChain::new();
        let id = chain.add_step(wf(WorkflowKind::Sync));

        assert!(matches!(
            chain.remove_workflow_from_step(&id, 3),
            Err(CronchainError::WorkflowIndexOutOfRange { index: 3, len: 1, .. })
        ));
        assert!(matches!(
            chain.remove_step(&StepId::from("missing")),
            Err(CronchainError::StepNotFound(_))
        ));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn move_step_reorders_chain() {
        let mut chain = StepChain::new();
        let a = chain.add_step(wf(WorkflowKind::Sync));
        let b = chain.add_step(wf(WorkflowKind::Audit));
        let c = chain.add_step(wf(WorkflowKind::Cleanup));

        chain.move_step(&c, 0).unwrap();
        let order: Vec<_> = chain.iter().map(|s| s.id().clone()).collect();
        assert_eq!(order, vec![c.clone(), a.clone(), b.clone()]);

        chain.move_step(&c, 99).unwrap();
        let order: Vec<_> = chain.iter().map(|s| s.id().clone()).collect();
        assert_eq!(order, vec![a, b, c]);
    }

    #[test]
    fn parallel_group_rejects_fewer_than_two() {
        assert_eq!(
            ParallelGroup::try_from(vec![wf(WorkflowKind::Sync)]),
            Err(ParallelGroupTooSmall(1))
        );
    }
}
