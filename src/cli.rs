// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::default_config_path;
use crate::cron::{Frequency, TimeOfDay};

/// Command-line arguments for `cronchain`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "cronchain",
    version,
    about = "Compose cron-triggered chains of workflows and run them.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Cronchain.toml` in the current working directory. Defaults
    /// apply when the file does not exist.
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path(), global = true)]
    pub config: PathBuf,

    /// Schedule store file; overrides `[config].store`.
    #[arg(long, value_name = "PATH", global = true)]
    pub store: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CRONCHAIN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List all schedules.
    List,

    /// Show one schedule with its chain and upcoming runs.
    Show { id: String },

    /// List the workflows steps can reference.
    Catalog,

    /// Create a schedule.
    Create(ScheduleArgs),

    /// Edit a schedule. Omitted options keep their current values; `--step`
    /// replaces the whole chain.
    Update {
        id: String,
        #[command(flatten)]
        args: ScheduleArgs,
    },

    /// Enable a schedule.
    Enable { id: String },

    /// Disable a schedule.
    Disable { id: String },

    /// Delete a schedule.
    Delete {
        id: String,
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },

    /// Run a schedule's chain once, now.
    Run { id: String },

    /// Cron expression utilities.
    #[command(subcommand)]
    Cron(CronCommand),

    /// Show upcoming runs, refreshed periodically, until Ctrl-C.
    Watch,

    /// Trigger due schedules until Ctrl-C.
    Daemon {
        /// Perform a single tick and exit.
        #[arg(long)]
        once: bool,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum CronCommand {
    /// Build an expression from structured fields.
    Encode(CronFields),

    /// Describe an expression in structured terms.
    Decode { expr: String },

    /// Print the next fire times of an expression.
    Next {
        expr: String,
        #[arg(short = 'n', long, default_value_t = 5)]
        count: usize,
    },
}

/// Structured schedule fields, as offered by the editor.
#[derive(Debug, Clone, Default, Args)]
pub struct CronFields {
    /// hourly, daily, weekly or monthly.
    #[arg(long, value_name = "FREQ")]
    pub frequency: Option<Frequency>,

    /// Time of day for daily, weekly and monthly schedules.
    #[arg(long, value_name = "HH:MM")]
    pub at: Option<TimeOfDay>,

    /// Weekdays for weekly schedules, 0 = Sunday.
    #[arg(long, value_name = "DAYS", value_delimiter = ',')]
    pub days: Vec<u32>,

    /// Day of month for monthly schedules.
    #[arg(long, value_name = "DAY")]
    pub day: Option<u32>,
}

impl CronFields {
    pub fn is_empty(&self) -> bool {
        self.frequency.is_none() && self.at.is_none() && self.days.is_empty() && self.day.is_none()
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct ScheduleArgs {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// Raw cron expression.
    #[arg(long, value_name = "EXPR", conflicts_with_all = ["frequency", "at", "days", "day"])]
    pub cron: Option<String>,

    #[command(flatten)]
    pub fields: CronFields,

    /// One step; several comma-separated workflow ids make a parallel step.
    /// Repeat for each step, in execution order.
    #[arg(long = "step", value_name = "WF[,WF...]")]
    pub steps: Vec<String>,

    /// Save the schedule disabled.
    #[arg(long)]
    pub disabled: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
