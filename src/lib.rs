// src/lib.rs

pub mod chain;
pub mod cli;
pub mod commands;
pub mod config;
pub mod cron;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod refresh;
pub mod registry;
pub mod schedule;
pub mod store;
pub mod types;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Result, bail};
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::cli::{CliArgs, Command};
use crate::config::ConfigFile;
use crate::config::loader::load_or_default;
use crate::engine::{TriggerOptions, TriggerRuntime};
use crate::fs::RealFileSystem;
use crate::refresh::RefreshTask;
use crate::store::{ScheduleStore, TomlScheduleRepository};

type FileStore = ScheduleStore<TomlScheduleRepository<RealFileSystem>>;

/// High-level entry point used by `main.rs`.
///
/// Loads the config, opens the schedule store and dispatches the
/// subcommand.
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = &args.config;
    let cfg = load_or_default(config_path)?;
    let store_path = args.store.clone().unwrap_or_else(|| cfg.store_path());
    debug!(config = ?config_path, store = ?store_path, "resolved paths");

    let registry = cfg.registry();
    let mut store = open_store(&store_path)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match &args.command {
        Command::List => commands::list(&store, &mut out),
        Command::Show { id } => commands::show(&store, id, Utc::now(), &mut out),
        Command::Catalog => commands::catalog(&registry, &mut out),
        Command::Create(schedule) => {
            commands::create(&mut store, &registry, schedule, &mut out).map(|_| ())
        }
        Command::Update { id, args } => {
            commands::update(&mut store, &registry, id, args, &mut out).map(|_| ())
        }
        Command::Enable { id } => commands::set_enabled(&mut store, id, true, &mut out),
        Command::Disable { id } => commands::set_enabled(&mut store, id, false, &mut out),
        Command::Delete { id, yes } => commands::delete(&mut store, id, *yes, &mut out),
        Command::Cron(command) => commands::cron(command, Utc::now(), &mut out),
        Command::Run { id } => {
            let service = cfg.simulated_service();
            let cancel = cancel_on_ctrl_c();
            let report = commands::run(&mut store, &service, id, &cancel, &mut out).await?;
            if !report.status.is_success() {
                bail!("chain {}", report.status);
            }
            Ok(())
        }
        Command::Watch => {
            drop(out);
            watch(&cfg, store).await
        }
        Command::Daemon { once } => {
            drop(out);
            daemon(&cfg, store, *once).await
        }
    }
}

fn open_store(path: &std::path::Path) -> Result<FileStore> {
    let repo = TomlScheduleRepository::open(RealFileSystem, path)?;
    Ok(ScheduleStore::new(repo))
}

/// Redraw the upcoming-runs board every refresh interval until Ctrl-C.
async fn watch(cfg: &ConfigFile, mut store: FileStore) -> Result<()> {
    let cancel = cancel_on_ctrl_c();
    let task = RefreshTask::spawn(cfg.refresh_interval(), &cancel, move || {
        let mut out = io::stdout().lock();
        if let Err(err) = commands::redraw_board(&mut store, Utc::now(), &mut out) {
            error!(error = %err, "failed to redraw board");
        }
    });

    cancel.cancelled().await;
    task.shutdown().await;
    Ok(())
}

async fn daemon(cfg: &ConfigFile, store: FileStore, once: bool) -> Result<()> {
    let service = Arc::new(cfg.simulated_service());
    let options = TriggerOptions {
        poll_interval: cfg.poll_interval(),
        ..TriggerOptions::default()
    };
    let mut runtime = TriggerRuntime::new(store, service, options);
    let cancel = cancel_on_ctrl_c();

    if once {
        let reports = runtime.run_once(&cancel).await?;
        let mut out = io::stdout().lock();
        for report in &reports {
            write!(out, "{report}")?;
        }
        info!(runs = reports.len(), "single tick complete");
        return Ok(());
    }

    runtime.run(cancel).await;
    Ok(())
}

/// Token that is cancelled on Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            return;
        }
        info!("Ctrl+C received; shutting down");
        trigger.cancel();
    });
    token
}
