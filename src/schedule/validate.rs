// src/schedule/validate.rs

use std::collections::HashSet;

use thiserror::Error;

use crate::cron::{CronError, CronExpression};
use crate::schedule::ScheduleDraft;
use crate::types::StepId;

/// A single reason a draft cannot be saved.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    #[error("name must not be empty")]
    EmptyName,

    #[error("schedule must contain at least one step")]
    NoSteps,

    #[error("invalid cron expression: {0}")]
    InvalidCron(CronError),

    #[error("step id '{0}' is used more than once")]
    DuplicateStepId(StepId),
}

/// Every issue found in a draft, in a stable order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", join_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub fn contains(&self, issue: &ValidationIssue) -> bool {
        self.issues.contains(issue)
    }
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Check a draft before it is committed and return its parsed cron
/// expression.
pub fn validate_draft(draft: &ScheduleDraft) -> Result<CronExpression, ValidationError> {
    let mut issues = Vec::new();

    if draft.name.trim().is_empty() {
        issues.push(ValidationIssue::EmptyName);
    }

    if draft.steps.is_empty() {
        issues.push(ValidationIssue::NoSteps);
    }

    let mut seen = HashSet::new();
    for step in &draft.steps {
        if !seen.insert(step.id()) {
            issues.push(ValidationIssue::DuplicateStepId(step.id().clone()));
        }
    }

    let cron = match CronExpression::parse(&draft.cron) {
        Ok(cron) => Some(cron),
        Err(err) => {
            issues.push(ValidationIssue::InvalidCron(err));
            None
        }
    };

    match cron {
        Some(cron) if issues.is_empty() => Ok(cron),
        _ => Err(ValidationError { issues }),
    }
}
