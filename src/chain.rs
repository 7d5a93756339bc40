// src/chain.rs

//! Read-only projection of a step chain for display.
//!
//! ```text
//! [1] Sync Market Data
//!  |
//! [2] Audit Trail Review + Cleanup Stale Records
//!  |
//! [3] Reconcile Positions
//! ```

use std::fmt;

use crate::schedule::{Step, WorkflowInfo};
use crate::types::StepId;

/// One stage of the rendered chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageView<'a> {
    /// Zero-based execution position.
    pub index: usize,
    pub step_id: &'a StepId,
    pub parallel: bool,
    pub workflows: &'a [WorkflowInfo],
}

impl StageView<'_> {
    /// `index` counted from one, as shown to users.
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

impl fmt::Display for StageView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.number())?;
        for (i, workflow) in self.workflows.iter().enumerate() {
            if i > 0 {
                f.write_str(" + ")?;
            }
            f.write_str(&workflow.name)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ChainView<'a> {
    steps: &'a [Step],
}

impl<'a> ChainView<'a> {
    pub fn new(steps: &'a [Step]) -> Self {
        Self { steps }
    }

    pub fn stages(&self) -> impl Iterator<Item = StageView<'a>> + 'a {
        self.steps.iter().enumerate().map(|(index, step)| StageView {
            index,
            step_id: step.id(),
            parallel: step.is_parallel(),
            workflows: step.workflows(),
        })
    }

    /// Workflows grouped by stage, in execution order.
    pub fn execution_order(&self) -> Vec<Vec<&'a WorkflowInfo>> {
        self.steps
            .iter()
            .map(|step| step.workflows().iter().collect())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for ChainView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("(no steps)");
        }
        for stage in self.stages() {
            if stage.index > 0 {
                f.write_str("\n |\n")?;
            }
            write!(f, "{stage}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WorkflowKind;

    fn wf(kind: WorkflowKind, name: &str) -> WorkflowInfo {
        WorkflowInfo::new(format!("wf-{kind}"), name, kind)
    }

    fn sample_steps() -> Vec<Step> {
        vec![
            Step::sequential(wf(WorkflowKind::Sync, "Sync")),
            Step::from_workflows(
                StepId::from("step-par"),
                vec![wf(WorkflowKind::Audit, "Audit"), wf(WorkflowKind::Cleanup, "Cleanup")],
            )
            .unwrap(),
        ]
    }

    #[test]
    fn stages_follow_execution_order() {
        let steps = sample_steps();
        let view = ChainView::new(&steps);
        let stages: Vec<_> = view.stages().collect();

        assert_eq!(stages.len(), 2);
        assert!(!stages[0].parallel);
        assert!(stages[1].parallel);
        assert_eq!(stages[1].step_id.as_str(), "step-par");
        assert_eq!(stages[1].number(), 2);

        let order = view.execution_order();
        let names: Vec<Vec<&str>> = order
            .iter()
            .map(|stage| stage.iter().map(|wf| wf.name.as_str()).collect())
            .collect();
        assert_eq!(names, vec![vec!["Sync"], vec!["Audit", "Cleanup"]]);
    }

    #[test]
    fn renders_connectors_and_parallel_joins() {
        let steps = sample_steps();
        let rendered = ChainView::new(&steps).to_string();
        assert_eq!(rendered, "[1] Sync\n |\n[2] Audit + Cleanup");
    }

    #[test]
    fn empty_chain_renders_placeholder() {
        assert_eq!(ChainView::new(&[]).to_string(), "(no steps)");
    }
}
