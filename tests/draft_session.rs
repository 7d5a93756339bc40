// tests/draft_session.rs

use std::error::Error;

use cronchain::cron::{CronSchedule, TimeOfDay};
use cronchain::errors::CronchainError;
use cronchain::schedule::DraftSession;
use cronchain::store::{InMemoryScheduleRepository, ScheduleStore};
use cronchain::types::WorkflowKind;
use cronchain_test_utils::builders::{ScheduleDraftBuilder, step_kinds, workflow};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn new_session_saves_then_updates() -> TestResult {
    let mut store = ScheduleStore::new(InMemoryScheduleRepository::new());
    let mut session = DraftSession::new();
    assert!(!session.is_dirty());

    session.draft_mut().name = "Morning".to_string();
    session.draft_mut().steps.add_step(workflow(WorkflowKind::Sync));
    assert!(session.is_dirty());
    assert!(matches!(
        session.close(),
        Err(CronchainError::DiscardConfirmation { .. })
    ));

    let first = session.save(&mut store)?;
    assert!(!session.is_dirty());
    assert_eq!(session.schedule_id(), Some(&first.id));
    session.close()?;

    session
        .draft_mut()
        .set_schedule(&CronSchedule::Daily { at: TimeOfDay::new(6, 15)? });
    let second = session.save(&mut store)?;
    assert_eq!(second.id, first.id);
    assert_eq!(second.cron.to_string(), "15 6 * * *");
    assert_eq!(store.list()?.len(), 1);
    Ok(())
}

#[test]
fn failed_save_keeps_the_draft_open() -> TestResult {
    let mut store = ScheduleStore::new(InMemoryScheduleRepository::new());
    let mut session = DraftSession::new();
    session.draft_mut().name = "No steps yet".to_string();

    assert!(session.save(&mut store).is_err());
    assert!(session.is_dirty());
    assert_eq!(session.draft().name, "No steps yet");
    assert!(store.list()?.is_empty());
    Ok(())
}

#[test]
fn editing_does_not_touch_the_committed_schedule() -> TestResult {
    let mut store = ScheduleStore::new(InMemoryScheduleRepository::new());
    let committed = store.create(
        &ScheduleDraftBuilder::new("Chain")
            .step(WorkflowKind::Sync)
            .parallel(&[WorkflowKind::Audit, WorkflowKind::Cleanup])
            .build(),
    )?;

    let mut session = DraftSession::edit(&committed);
    let parallel = committed.steps[1].id().clone();
    session.draft_mut().steps.remove_workflow_from_step(&parallel, 0)?;
    assert!(session.is_dirty());

    // Still two parallel workflows in the store.
    let stored = store.get(&committed.id)?;
    assert_eq!(
        step_kinds(&stored.steps),
        vec![vec![WorkflowKind::Sync], vec![WorkflowKind::Audit, WorkflowKind::Cleanup]]
    );

    session.discard();
    assert_eq!(store.get(&committed.id)?, committed);
    Ok(())
}
