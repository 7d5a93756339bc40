// tests/cli_parse.rs

use std::path::PathBuf;

use clap::Parser;

use cronchain::cli::{CliArgs, Command, CronCommand};
use cronchain::cron::Frequency;

#[test]
fn create_collects_repeated_steps() {
    let args = CliArgs::try_parse_from([
        "cronchain",
        "create",
        "--name",
        "Nightly",
        "--frequency",
        "weekly",
        "--at",
        "02:30",
        "--days",
        "1,3,5",
        "--step",
        "wf-sync",
        "--step",
        "wf-audit,wf-cleanup",
    ])
    .unwrap();

    let Command::Create(schedule) = args.command else {
        panic!("expected create");
    };
    assert_eq!(schedule.name.as_deref(), Some("Nightly"));
    assert_eq!(schedule.fields.frequency, Some(Frequency::Weekly));
    assert_eq!(schedule.fields.at.map(|t| t.to_string()), Some("02:30".to_string()));
    assert_eq!(schedule.fields.days, vec![1, 3, 5]);
    assert_eq!(schedule.steps, vec!["wf-sync", "wf-audit,wf-cleanup"]);
    assert!(!schedule.disabled);
}

#[test]
fn cron_conflicts_with_structured_fields() {
    let result = CliArgs::try_parse_from([
        "cronchain", "create", "--name", "X", "--cron", "0 9 * * *", "--at", "10:00",
    ]);
    assert!(result.is_err());
}

#[test]
fn global_options_work_after_the_subcommand() {
    let args = CliArgs::try_parse_from([
        "cronchain",
        "list",
        "--store",
        "/tmp/schedules.toml",
        "--log-level",
        "debug",
    ])
    .unwrap();
    assert!(matches!(args.command, Command::List));
    assert_eq!(args.config, PathBuf::from("Cronchain.toml"));
    assert_eq!(args.store.unwrap().to_str(), Some("/tmp/schedules.toml"));
    assert!(args.log_level.is_some());
}

#[test]
fn cron_next_defaults_to_five() {
    let args = CliArgs::try_parse_from(["cronchain", "cron", "next", "*/5 * * * *"]).unwrap();
    let Command::Cron(CronCommand::Next { expr, count }) = args.command else {
        panic!("expected cron next");
    };
    assert_eq!(expr, "*/5 * * * *");
    assert_eq!(count, 5);
}

#[test]
fn bad_time_is_rejected_at_parse_time() {
    assert!(CliArgs::try_parse_from(["cronchain", "cron", "encode", "--at", "25:00"]).is_err());
}

#[test]
fn daemon_once_flag() {
    let args = CliArgs::try_parse_from(["cronchain", "daemon", "--once"]).unwrap();
    assert!(matches!(args.command, Command::Daemon { once: true }));
}
