// src/commands.rs

//! Handlers behind the CLI subcommands.
//!
//! Handlers write their output to the given writer so they can be driven
//! from tests; `run` in `lib.rs` hands them stdout.

use std::io::Write;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::cli::{CronCommand, CronFields, ScheduleArgs};
use crate::cron::{CronBuilder, CronError, CronExpression, CronSchedule, DayOfMonth, Frequency, WeekdaySet};
use crate::exec::{ChainReport, WorkflowParams, WorkflowService, run_chain};
use crate::registry::WorkflowRegistry;
use crate::schedule::{DraftSession, Schedule, ScheduleDraft, StepChain};
use crate::store::{ScheduleRepository, ScheduleStore};
use crate::types::ScheduleId;

const UPCOMING_IN_SHOW: usize = 3;

pub fn list<R: ScheduleRepository>(store: &ScheduleStore<R>, out: &mut dyn Write) -> Result<()> {
    let schedules = store.list()?;
    if schedules.is_empty() {
        writeln!(out, "no schedules")?;
        return Ok(());
    }

    writeln!(
        out,
        "{:<36}  {:<24}  {:<7}  {:<16}  {:<20}  {}",
        "ID", "NAME", "STATUS", "CRON", "NEXT RUN", "STEPS"
    )?;
    for schedule in &schedules {
        writeln!(
            out,
            "{:<36}  {:<24}  {:<7}  {:<16}  {:<20}  {}",
            schedule.id,
            schedule.name,
            schedule.status,
            schedule.cron,
            format_time(schedule.next_run),
            schedule.steps.len()
        )?;
    }
    Ok(())
}

pub fn show<R: ScheduleRepository>(
    store: &ScheduleStore<R>,
    id: &str,
    now: DateTime<Utc>,
    out: &mut dyn Write,
) -> Result<()> {
    let schedule = store.get(&ScheduleId::from(id))?;
    let enabled = if schedule.enabled { "enabled" } else { "disabled" };

    writeln!(out, "id:          {}", schedule.id)?;
    writeln!(out, "name:        {}", schedule.name)?;
    if !schedule.description.is_empty() {
        writeln!(out, "description: {}", schedule.description)?;
    }
    writeln!(out, "status:      {} ({enabled})", schedule.status)?;
    writeln!(out, "cron:        {} ({})", schedule.cron, describe_cron(&schedule.cron))?;
    writeln!(out, "next run:    {}", format_time(schedule.next_run))?;
    writeln!(out, "last run:    {}", format_time(schedule.last_run))?;
    writeln!(out)?;
    writeln!(out, "chain:")?;
    writeln!(out, "{}", schedule.chain())?;
    writeln!(out)?;
    writeln!(out, "upcoming:")?;
    let upcoming = schedule.cron.upcoming(&now, UPCOMING_IN_SHOW);
    if upcoming.is_empty() {
        writeln!(out, "  never fires")?;
    }
    for at in upcoming {
        writeln!(out, "  {}", format_time(Some(at)))?;
    }
    Ok(())
}

pub fn catalog(registry: &dyn WorkflowRegistry, out: &mut dyn Write) -> Result<()> {
    for workflow in registry.catalog() {
        writeln!(out, "{:<20}  {:<15}  {}", workflow.id, workflow.kind, workflow.name)?;
    }
    Ok(())
}

pub fn create<R: ScheduleRepository>(
    store: &mut ScheduleStore<R>,
    registry: &dyn WorkflowRegistry,
    args: &ScheduleArgs,
    out: &mut dyn Write,
) -> Result<Schedule> {
    let mut session = DraftSession::new();
    apply_schedule_args(session.draft_mut(), args, registry)?;
    let saved = session.save(store)?;
    writeln!(out, "created {} ({})", saved.id, saved.name)?;
    Ok(saved)
}

/// Apply `args` to the stored schedule. Nothing is written when the
/// options change nothing.
pub fn update<R: ScheduleRepository>(
    store: &mut ScheduleStore<R>,
    registry: &dyn WorkflowRegistry,
    id: &str,
    args: &ScheduleArgs,
    out: &mut dyn Write,
) -> Result<Schedule> {
    let schedule = store.get(&ScheduleId::from(id))?;
    let mut session = DraftSession::edit(&schedule);
    apply_schedule_args(session.draft_mut(), args, registry)?;

    if !session.is_dirty() {
        writeln!(out, "no changes to {}", schedule.id)?;
        return Ok(schedule);
    }

    let saved = session.save(store)?;
    session.close()?;
    writeln!(out, "updated {} ({})", saved.id, saved.name)?;
    Ok(saved)
}

pub fn set_enabled<R: ScheduleRepository>(
    store: &mut ScheduleStore<R>,
    id: &str,
    enabled: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let schedule = store.toggle_enabled(&ScheduleId::from(id), enabled)?;
    writeln!(out, "{} is now {}", schedule.id, schedule.status)?;
    Ok(())
}

pub fn delete<R: ScheduleRepository>(
    store: &mut ScheduleStore<R>,
    id: &str,
    confirmed: bool,
    out: &mut dyn Write,
) -> Result<()> {
    if !confirmed {
        bail!("refusing to delete schedule {id} without --yes");
    }
    if store.delete(&ScheduleId::from(id))? {
        writeln!(out, "deleted {id}")?;
    } else {
        writeln!(out, "no schedule {id}; nothing deleted")?;
    }
    Ok(())
}

/// Run one chain now and record the result on the schedule.
pub async fn run<R, S>(
    store: &mut ScheduleStore<R>,
    service: &S,
    id: &str,
    cancel: &CancellationToken,
    out: &mut dyn Write,
) -> Result<ChainReport>
where
    R: ScheduleRepository,
    S: WorkflowService + ?Sized,
{
    let schedule = store.get(&ScheduleId::from(id))?;
    let report = run_chain(service, &schedule, &WorkflowParams::new(), cancel).await;
    store.record_run(&schedule.id, &report)?;
    write!(out, "{report}")?;
    Ok(report)
}

pub fn cron(command: &CronCommand, now: DateTime<Utc>, out: &mut dyn Write) -> Result<()> {
    match command {
        CronCommand::Encode(fields) => {
            let builder = builder_from_fields(CronBuilder::default(), fields)?;
            let schedule = builder.build();
            writeln!(out, "{}", schedule.encode())?;
            writeln!(out, "# {schedule}")?;
        }
        CronCommand::Decode { expr } => {
            let schedule = CronSchedule::decode(expr)?;
            writeln!(out, "frequency: {}", schedule.frequency())?;
            writeln!(out, "{schedule}")?;
        }
        CronCommand::Next { expr, count } => {
            let expr = CronExpression::parse(expr)?;
            let upcoming = expr.upcoming(&now, *count);
            if upcoming.is_empty() {
                writeln!(out, "{expr} never fires")?;
            }
            for at in upcoming {
                writeln!(out, "{}", format_time(Some(at)))?;
            }
        }
    }
    Ok(())
}

/// Board shown by `watch`: enabled schedules by next fire time.
pub fn render_board(schedules: &[Schedule], now: DateTime<Utc>) -> String {
    let mut upcoming: Vec<(Option<DateTime<Utc>>, &Schedule)> = schedules
        .iter()
        .filter(|s| s.enabled)
        .map(|s| (s.next_run.or_else(|| s.cron.next_after(&now)), s))
        .collect();
    upcoming.sort_by_key(|(at, s)| (at.is_none(), *at, s.name.clone()));

    let mut board = format!("upcoming runs as of {}\n", format_time(Some(now)));
    if upcoming.is_empty() {
        board.push_str("  no enabled schedules\n");
    }
    for (at, schedule) in upcoming {
        board.push_str(&format!(
            "  {:<20}  {:<24}  {} workflow(s)\n",
            format_time(at),
            schedule.name,
            schedule.workflow_count()
        ));
    }
    board
}

/// One `watch` refresh: reload the store and print the board.
pub fn redraw_board<R: ScheduleRepository>(
    store: &mut ScheduleStore<R>,
    now: DateTime<Utc>,
    out: &mut dyn Write,
) -> Result<()> {
    store.reload().context("reloading schedules")?;
    let schedules = store.list()?;
    writeln!(out, "{}", render_board(&schedules, now)).context("writing board")?;
    Ok(())
}

/// Fold CLI options into a draft. Only the options that were given change
/// the draft.
pub fn apply_schedule_args(
    draft: &mut ScheduleDraft,
    args: &ScheduleArgs,
    registry: &dyn WorkflowRegistry,
) -> Result<()> {
    if let Some(name) = &args.name {
        draft.name = name.clone();
    }
    if let Some(description) = &args.description {
        draft.description = description.clone();
    }

    if let Some(cron) = &args.cron {
        draft.cron = cron.trim().to_string();
    } else if !args.fields.is_empty() {
        // A hand-written expression the editor cannot represent starts over
        // from the editor defaults.
        let base = draft.cron_builder().unwrap_or_default();
        let builder = builder_from_fields(base, &args.fields)?;
        draft.set_schedule(&builder.build());
    }

    if !args.steps.is_empty() {
        draft.steps = parse_steps(&args.steps, registry)?;
    }
    if args.disabled {
        draft.enabled = false;
    }
    Ok(())
}

/// Build a chain from `--step` values: `"wf-a"` is a sequential step,
/// `"wf-a,wf-b"` a parallel one.
pub fn parse_steps(specs: &[String], registry: &dyn WorkflowRegistry) -> Result<StepChain> {
    let mut chain = StepChain::new();
    for spec in specs {
        let ids: Vec<&str> = spec
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .collect();
        let Some((first, rest)) = ids.split_first() else {
            bail!("empty --step value {spec:?}");
        };

        let step = chain.add_step(registry.resolve(first)?);
        for id in rest {
            chain
                .add_workflow_to_step(&step, registry.resolve(id)?)
                .with_context(|| format!("adding {id} to step {step}"))?;
        }
    }
    Ok(chain)
}

/// Overlay structured fields on `base`. Giving weekdays or a day of month
/// without `--frequency` selects weekly or monthly.
pub fn builder_from_fields(base: CronBuilder, fields: &CronFields) -> Result<CronBuilder, CronError> {
    let mut builder = base;
    if let Some(at) = fields.at {
        builder.at = at;
    }
    if !fields.days.is_empty() {
        builder.weekdays = WeekdaySet::new(fields.days.iter().copied())?;
        builder.frequency = Frequency::Weekly;
    }
    if let Some(day) = fields.day {
        builder.day_of_month = DayOfMonth::new(day)?;
        builder.frequency = Frequency::Monthly;
    }
    if let Some(frequency) = fields.frequency {
        builder.frequency = frequency;
    }
    Ok(builder)
}

fn describe_cron(expr: &CronExpression) -> String {
    match CronSchedule::from_expression(expr) {
        Ok(schedule) => schedule.to_string(),
        Err(_) => "custom expression".to_string(),
    }
}

fn format_time(at: Option<DateTime<Utc>>) -> String {
    match at {
        Some(at) => at.format("%Y-%m-%d %H:%M UTC").to_string(),
        None => "-".to_string(),
    }
}
