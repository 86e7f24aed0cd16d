//! Command handlers -- one module per subcommand

pub mod config;
pub mod control;
pub mod executions;
pub mod report;
pub mod run;
pub mod summary;
pub mod watch;

use std::path::Path;
use std::sync::Arc;

use colored::{ColoredString, Colorize};
use tracing::debug;

use chutney_core::config::ChutneyConfig;
use chutney_core::notify::TracingSink;
use chutney_core::types::ExecutionStatus;
use chutney_execution_report::ScenarioExecutionClient;

use crate::error::CliError;

/// Overrides given on the command line. They win over env and file values.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub base_url: Option<String>,
}

impl ConfigOverrides {
    fn apply(&self, config: &mut ChutneyConfig) {
        if let Some(level) = &self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(url) = &self.base_url {
            config.server.base_url = url.clone();
        }
    }
}

/// Load the effective configuration.
///
/// A missing configuration file is not an error here: defaults plus
/// environment overrides are used instead. `config validate` is the
/// command that insists on the file.
pub async fn load_config(
    path: &Path,
    overrides: &ConfigOverrides,
) -> Result<ChutneyConfig, CliError> {
    let mut config = if path.exists() {
        ChutneyConfig::load(path).await?
    } else {
        debug!(path = %path.display(), "config file not found, using defaults");
        let mut config = ChutneyConfig::default();
        config.apply_env_overrides();
        config
    };

    overrides.apply(&mut config);
    config.validate()?;
    Ok(config)
}

/// Build the execution engine client from configuration.
pub fn build_client(config: &ChutneyConfig) -> Result<ScenarioExecutionClient, CliError> {
    let client = ScenarioExecutionClient::new(
        &config.server,
        config.stream.channel_capacity,
        Arc::new(TracingSink),
    )?;
    Ok(client)
}

/// Colorize a status label for text output.
pub(crate) fn paint_status(status: ExecutionStatus, label: &str) -> ColoredString {
    match status {
        ExecutionStatus::Success => label.green(),
        ExecutionStatus::Warn => label.yellow(),
        ExecutionStatus::Failure => label.red().bold(),
        ExecutionStatus::Running => label.cyan(),
        ExecutionStatus::Paused => label.blue(),
        ExecutionStatus::Stopped | ExecutionStatus::NotExecuted | ExecutionStatus::Unknown => {
            label.dimmed()
        }
    }
}
