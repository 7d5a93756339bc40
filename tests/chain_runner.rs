// tests/chain_runner.rs

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use cronchain::exec::{ChainStatus, WorkflowParams, run_chain};
use cronchain::types::WorkflowKind;
use cronchain_test_utils::builders::{ScheduleDraftBuilder, schedule};
use cronchain_test_utils::recording_service::{RecordingWorkflowService, ServiceEvent};
use cronchain_test_utils::{init_tracing, with_timeout};

use cronchain::store::{InMemoryScheduleRepository, ScheduleStore};

fn started(id: &str) -> ServiceEvent {
    ServiceEvent::Started(id.to_string())
}

fn finished(id: &str) -> ServiceEvent {
    ServiceEvent::Finished(id.to_string())
}

#[tokio::test]
async fn sequential_steps_do_not_overlap_and_parallel_ones_do() {
    init_tracing();
    let mut store = ScheduleStore::new(InMemoryScheduleRepository::new());
    let committed = store
        .create(
            &ScheduleDraftBuilder::new("Chain")
                .step(WorkflowKind::Sync)
                .parallel(&[WorkflowKind::Audit, WorkflowKind::Cleanup])
                .step(WorkflowKind::Reconciliation)
                .build(),
        )
        .unwrap();

    let service = RecordingWorkflowService::new(Duration::from_millis(20));
    let report = with_timeout(run_chain(
        &service,
        &committed,
        &WorkflowParams::new(),
        &CancellationToken::new(),
    ))
    .await;

    assert_eq!(report.status, ChainStatus::Completed);
    assert_eq!(report.steps.len(), 3);
    assert!(report.steps[1].parallel);

    let events = service.events();
    assert_eq!(
        events,
        vec![
            started("wf-sync"),
            finished("wf-sync"),
            started("wf-audit"),
            started("wf-cleanup"),
            finished("wf-audit"),
            finished("wf-cleanup"),
            started("wf-reconciliation"),
            finished("wf-reconciliation"),
        ]
    );
}

#[tokio::test]
async fn failed_step_stops_the_chain() {
    init_tracing();
    let chain = schedule(
        "failing",
        "0 * * * *",
        &[WorkflowKind::Sync, WorkflowKind::Validation, WorkflowKind::Migration],
        None,
    );
    let service = RecordingWorkflowService::new(Duration::from_millis(1)).failing("wf-validation");

    let report = with_timeout(run_chain(
        &service,
        &chain,
        &WorkflowParams::new(),
        &CancellationToken::new(),
    ))
    .await;

    assert_eq!(
        report.status,
        ChainStatus::Failed {
            step: chain.steps[1].id().clone()
        }
    );
    assert_eq!(report.steps.len(), 2);
    assert!(!report.steps[1].succeeded());
    assert_eq!(service.started(), vec!["wf-sync", "wf-validation"]);

    let rendered = report.to_string();
    assert!(rendered.contains("[FAILED]"));
    assert!(rendered.contains("(boom)"));
}

#[tokio::test]
async fn service_errors_become_failed_outcomes() {
    let chain = schedule("erroring", "0 * * * *", &[WorkflowKind::Audit], None);
    let service = RecordingWorkflowService::new(Duration::ZERO).erroring("wf-audit");

    let report = run_chain(&service, &chain, &WorkflowParams::new(), &CancellationToken::new()).await;

    assert!(matches!(report.status, ChainStatus::Failed { .. }));
    let outcome = &report.steps[0].outcomes[0];
    assert!(!outcome.succeeded());
    assert!(outcome.response.error.as_deref().unwrap().contains("service unavailable"));
}

#[tokio::test]
async fn cancellation_abandons_the_running_step() {
    init_tracing();
    let chain = schedule(
        "slow",
        "0 * * * *",
        &[WorkflowKind::Sync, WorkflowKind::Cleanup],
        None,
    );
    let service = RecordingWorkflowService::new(Duration::from_secs(30));
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let report = with_timeout(run_chain(&service, &chain, &WorkflowParams::new(), &cancel)).await;

    assert_eq!(
        report.status,
        ChainStatus::Cancelled {
            step: chain.steps[0].id().clone()
        }
    );
    assert!(report.steps.is_empty());
    assert_eq!(service.events(), vec![started("wf-sync")]);
}

#[tokio::test]
async fn empty_chain_completes_immediately() {
    let mut chain = schedule("empty", "0 * * * *", &[WorkflowKind::Sync], None);
    chain.steps.clear();
    let service = RecordingWorkflowService::new(Duration::ZERO);

    let report = run_chain(&service, &chain, &WorkflowParams::new(), &CancellationToken::new()).await;
    assert_eq!(report.status, ChainStatus::Completed);
    assert!(service.events().is_empty());
}
