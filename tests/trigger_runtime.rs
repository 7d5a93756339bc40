// tests/trigger_runtime.rs

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use tokio_util::sync::CancellationToken;

use cronchain::engine::{TriggerOptions, TriggerRuntime};
use cronchain::fs::mock::MockFileSystem;
use cronchain::store::{
    InMemoryScheduleRepository, ScheduleRepository, ScheduleStore, TomlScheduleRepository,
};
use cronchain::types::{ScheduleId, ScheduleStatus, WorkflowKind};
use cronchain_test_utils::builders::{ScheduleDraftBuilder, schedule};
use cronchain_test_utils::recording_service::RecordingWorkflowService;
use cronchain_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn at(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, h, m, 0).unwrap()
}

fn runtime(
    service: RecordingWorkflowService,
    schedules: Vec<cronchain::schedule::Schedule>,
) -> TriggerRuntime<InMemoryScheduleRepository> {
    let store = ScheduleStore::new(InMemoryScheduleRepository::with_schedules(schedules));
    TriggerRuntime::new(store, Arc::new(service), TriggerOptions::default())
}

#[tokio::test]
async fn first_tick_schedules_and_later_tick_runs() -> TestResult {
    init_tracing();
    let service = RecordingWorkflowService::new(Duration::ZERO);
    let mut runtime = runtime(
        service.clone(),
        vec![schedule("hourly", "0 * * * *", &[WorkflowKind::Sync], None)],
    );
    let cancel = CancellationToken::new();
    let id = ScheduleId::from("hourly");

    let reports = runtime.tick(at(8, 30), &cancel).await?;
    assert!(reports.is_empty());
    assert_eq!(runtime.store().get(&id)?.next_run, Some(at(9, 0)));

    let reports = runtime.tick(at(9, 0), &cancel).await?;
    assert_eq!(reports.len(), 1);
    assert!(reports[0].status.is_success());

    let stored = runtime.store().get(&id)?;
    assert_eq!(stored.next_run, Some(at(10, 0)));
    assert_eq!(stored.last_run, Some(reports[0].started_at));
    assert_eq!(stored.status, ScheduleStatus::Active);
    assert_eq!(service.started(), vec!["wf-sync"]);
    Ok(())
}

#[tokio::test]
async fn failed_chain_marks_schedule_error() -> TestResult {
    let service = RecordingWorkflowService::new(Duration::ZERO).failing("wf-audit");
    let mut runtime = runtime(
        service,
        vec![schedule("audit", "0 * * * *", &[WorkflowKind::Audit], Some(at(9, 0)))],
    );

    let reports = runtime.tick(at(9, 5), &CancellationToken::new()).await?;
    assert_eq!(reports.len(), 1);
    let stored = runtime.store().get(&ScheduleId::from("audit"))?;
    assert_eq!(stored.status, ScheduleStatus::Error);
    Ok(())
}

#[tokio::test]
async fn disabled_schedules_never_run() -> TestResult {
    let service = RecordingWorkflowService::new(Duration::ZERO);
    let mut off = schedule("off", "* * * * *", &[WorkflowKind::Sync], Some(at(8, 0)));
    off.enabled = false;
    off.status = ScheduleStatus::Paused;
    let mut runtime = runtime(service.clone(), vec![off.clone()]);

    let reports = runtime.tick(at(9, 0), &CancellationToken::new()).await?;
    assert!(reports.is_empty());
    assert_eq!(runtime.store().get(&off.id)?, off);
    assert!(service.events().is_empty());
    Ok(())
}

#[tokio::test]
async fn run_exits_when_cancelled() {
    init_tracing();
    let service = RecordingWorkflowService::new(Duration::ZERO);
    let store = ScheduleStore::new(InMemoryScheduleRepository::new());
    let options = TriggerOptions {
        poll_interval: Duration::from_millis(10),
        ..TriggerOptions::default()
    };
    let runtime = TriggerRuntime::new(store, Arc::new(service), options);

    let cancel = CancellationToken::new();
    let handle = tokio::spawn(runtime.run(cancel.clone()));
    tokio::time::sleep(Duration::from_millis(30)).await;
    cancel.cancel();

    let store = with_timeout(handle).await.unwrap();
    assert!(store.list().unwrap().is_empty());
}

#[tokio::test]
async fn edits_made_during_a_run_survive_the_bookkeeping() -> TestResult {
    init_tracing();
    const STORE: &str = "/data/schedules.toml";
    let fs = MockFileSystem::new();
    let id = ScheduleId::from("nightly");
    TomlScheduleRepository::open(fs.clone(), STORE)?.save(schedule(
        "nightly",
        "0 * * * *",
        &[WorkflowKind::Sync],
        Some(at(9, 0)),
    ))?;

    let daemon_store = ScheduleStore::new(TomlScheduleRepository::open(fs.clone(), STORE)?);
    let service = RecordingWorkflowService::new(Duration::from_millis(200));
    let mut runtime = TriggerRuntime::new(daemon_store, Arc::new(service), TriggerOptions::default());
    let cancel = CancellationToken::new();

    let edit_during_run = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let mut cli_store = ScheduleStore::new(TomlScheduleRepository::open(fs.clone(), STORE)?);
        let draft = ScheduleDraftBuilder::new("Added meanwhile")
            .step(WorkflowKind::Audit)
            .build();
        cli_store.create(&draft)?;
        cli_store.toggle_enabled(&id, false)?;
        Ok::<_, cronchain::errors::CronchainError>(())
    };
    let (reports, edited) =
        with_timeout(async { tokio::join!(runtime.tick(at(9, 5), &cancel), edit_during_run) })
            .await;
    edited?;
    assert_eq!(reports?.len(), 1);

    let on_disk = TomlScheduleRepository::open(fs, STORE)?.list()?;
    let names: Vec<&str> = on_disk.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["nightly", "Added meanwhile"]);

    let nightly = &on_disk[0];
    assert!(!nightly.enabled);
    assert_eq!(nightly.status, ScheduleStatus::Paused);
    assert_eq!(nightly.next_run, Some(at(10, 0)));
    assert!(nightly.last_run.is_some());
    Ok(())
}
