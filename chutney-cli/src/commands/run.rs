//! `chutney run` command handler

use std::io::Write;

use serde::Serialize;
use tracing::info;

use chutney_execution_history::ReplayRequest;
use chutney_execution_report::ScenarioExecutionClient;

use crate::cli::RunArgs;
use crate::commands::watch;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `run` command.
///
/// With `--replay`, the environment and dataset of the given past execution are
/// reused unless `--env` / `--dataset` are also given.
pub async fn execute(
    args: RunArgs,
    client: &ScenarioExecutionClient,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let mut environment = args.env.clone().filter(|e| !e.is_empty());
    let mut dataset = args.dataset.clone().filter(|d| !d.is_empty());

    if let Some(replay_id) = args.replay {
        let past = client.find_execution_summary(replay_id).await?;
        let replay = ReplayRequest::from(&past);
        info!(
            replay_of = replay_id,
            environment = ?replay.environment,
            dataset = ?replay.dataset,
            "replaying past execution"
        );
        environment = environment.or(replay.environment);
        dataset = dataset.or(replay.dataset);
    }

    let execution_id = client
        .execute_scenario_async(&args.scenario_id, environment.as_deref(), dataset.as_deref())
        .await?;

    writer.render(&RunReport {
        scenario_id: args.scenario_id.clone(),
        execution_id: execution_id.clone(),
        environment,
        dataset,
        replay_of: args.replay,
    })?;

    if args.watch {
        let id = execution_id.trim().parse::<i64>().map_err(|_| {
            CliError::Command(format!(
                "server returned a non-numeric execution id '{execution_id}'"
            ))
        })?;
        watch::execute(
            crate::cli::ExecutionRef {
                scenario_id: args.scenario_id,
                execution_id: id,
            },
            client,
            writer,
        )
        .await?;
    }

    Ok(())
}

/// Started execution.
#[derive(Serialize)]
pub struct RunReport {
    pub scenario_id: String,
    pub execution_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replay_of: Option<i64>,
}

impl Render for RunReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        write!(
            w,
            "{} Started execution {} of {}",
            "✓".green(),
            self.execution_id.bold(),
            self.scenario_id
        )?;
        if let Some(environment) = &self.environment {
            write!(w, " on {}", environment)?;
        }
        if let Some(dataset) = &self.dataset {
            write!(w, " with dataset {}", dataset)?;
        }
        if let Some(replay_of) = self.replay_of {
            write!(w, " (replay of {})", replay_of)?;
        }
        writeln!(w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_report_text() {
        let report = RunReport {
            scenario_id: "sc".to_owned(),
            execution_id: "101".to_owned(),
            environment: Some("QA".to_owned()),
            dataset: None,
            replay_of: Some(99),
        };
        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("render should succeed");
        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("of sc on QA (replay of 99)"));
        assert!(!output.contains("dataset"));
    }
}
