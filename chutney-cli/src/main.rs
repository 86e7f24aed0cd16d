//! Chutney CLI entry point.
//!
//! Parses arguments, loads configuration, initializes logging and
//! dispatches to the subcommand handlers in [`chutney_cli::commands`].

use clap::Parser;
use colored::Colorize;

use chutney_cli::cli::{Cli, Commands};
use chutney_cli::commands::control::ControlAction;
use chutney_cli::commands::{
    ConfigOverrides, build_client, config, control, executions, load_config, report, run, summary,
    watch,
};
use chutney_cli::error::CliError;
use chutney_cli::logging::init_tracing;
use chutney_cli::output::OutputWriter;
use chutney_core::config::GeneralConfig;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run_command(cli).await {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(e.exit_code());
    }
}

async fn run_command(cli: Cli) -> Result<(), CliError> {
    let writer = OutputWriter::new(cli.output);
    let overrides = ConfigOverrides {
        log_level: cli.log_level.clone(),
        base_url: cli.base_url.clone(),
    };

    // `config` must work even when the file is broken
    if let Commands::Config(args) = cli.command {
        let general = GeneralConfig {
            log_level: overrides
                .log_level
                .clone()
                .unwrap_or_else(|| GeneralConfig::default().log_level),
            ..GeneralConfig::default()
        };
        init_tracing(&general).map_err(|e| CliError::Config(e.to_string()))?;
        return config::execute(args, &cli.config, &overrides, &writer).await;
    }

    let config = load_config(&cli.config, &overrides).await?;
    init_tracing(&config.general).map_err(|e| CliError::Config(e.to_string()))?;
    chutney_core::metrics::describe_all();
    tracing::debug!(
        config = %cli.config.display(),
        base_url = %config.server.base_url,
        "chutney starting"
    );

    let client = build_client(&config)?;

    match cli.command {
        Commands::Executions(args) => executions::execute(args, &client, &writer).await,
        Commands::Summary(args) => summary::execute(args, &client, &writer).await,
        Commands::Report(target) => report::execute(target, &client, &writer).await,
        Commands::Watch(target) => watch::execute(target, &client, &writer).await,
        Commands::Run(args) => run::execute(args, &client, &writer).await,
        Commands::Stop(target) => {
            control::execute(ControlAction::Stop, target, &client, &writer).await
        }
        Commands::Pause(target) => {
            control::execute(ControlAction::Pause, target, &client, &writer).await
        }
        Commands::Resume(target) => {
            control::execute(ControlAction::Resume, target, &client, &writer).await
        }
        // handled above
        Commands::Config(_) => Ok(()),
    }
}
