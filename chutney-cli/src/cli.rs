//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Chutney -- scenario execution history and live reports.
///
/// Use `chutney <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "chutney", version, about, long_about = None)]
pub struct Cli {
    /// Path to the chutney.toml configuration file.
    #[arg(short, long, default_value = "chutney.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Override the execution engine base URL.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List and filter the execution history of a scenario.
    Executions(ExecutionsArgs),

    /// Show the summary of one execution.
    Summary(SummaryArgs),

    /// Poll the report of one execution.
    Report(ExecutionRef),

    /// Follow the live report of a running execution.
    Watch(ExecutionRef),

    /// Start a scenario execution.
    Run(RunArgs),

    /// Stop a running execution.
    Stop(ExecutionRef),

    /// Pause a running execution.
    Pause(ExecutionRef),

    /// Resume a paused execution.
    Resume(ExecutionRef),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- executions ----

/// Filter options use the same syntax as the history view's URL query parameters.
/// Explicit flags take precedence over `--query`.
#[derive(Args, Debug, Default)]
pub struct ExecutionsArgs {
    /// Scenario identifier.
    pub scenario_id: String,

    /// Case-insensitive full-text keyword.
    #[arg(long)]
    pub keyword: Option<String>,

    /// Execution day (YYYY-MM-DD, local time).
    #[arg(long)]
    pub date: Option<String>,

    /// Comma-separated statuses (e.g. SUCCESS,FAILURE).
    #[arg(long)]
    pub status: Option<String>,

    /// Comma-separated environments.
    #[arg(long)]
    pub env: Option<String>,

    /// Comma-separated datasets.
    #[arg(long)]
    pub datasets: Option<String>,

    /// Comma-separated executors.
    #[arg(long)]
    pub exec: Option<String>,

    /// Comma-separated campaign names.
    #[arg(long)]
    pub camp: Option<String>,

    /// Comma-separated tags (an execution matches if it has any of them).
    #[arg(long)]
    pub tags: Option<String>,

    /// Raw query string, e.g. 'status=FAILURE&env=QA'.
    #[arg(long)]
    pub query: Option<String>,

    /// Also print the available filter options.
    #[arg(long)]
    pub facets: bool,
}

// ---- summary ----

#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Execution identifier.
    pub execution_id: i64,
}

// ---- report / watch / stop / pause / resume ----

/// A single execution of a scenario.
#[derive(Args, Debug, Clone)]
pub struct ExecutionRef {
    /// Scenario identifier.
    pub scenario_id: String,

    /// Execution identifier.
    pub execution_id: i64,
}

// ---- run ----

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Scenario identifier.
    pub scenario_id: String,

    /// Target environment.
    #[arg(long)]
    pub env: Option<String>,

    /// Dataset identifier.
    #[arg(long)]
    pub dataset: Option<String>,

    /// Reuse the environment and dataset of a past execution.
    #[arg(long, value_name = "EXECUTION_ID")]
    pub replay: Option<i64>,

    /// Follow the live report after starting.
    #[arg(short, long)]
    pub watch: bool,
}

// ---- config ----

/// Manage chutney configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, server, stream, history).
        #[arg(long)]
        section: Option<String>,
    },
}
