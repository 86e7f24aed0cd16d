//! `chutney stop|pause|resume` command handlers

use std::io::Write;

use serde::Serialize;
use tracing::info;

use chutney_execution_report::ScenarioExecutionClient;

use crate::cli::ExecutionRef;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execution control action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlAction {
    Stop,
    Pause,
    Resume,
}

impl ControlAction {
    fn outcome(self) -> &'static str {
        match self {
            Self::Stop => "stop requested",
            Self::Pause => "pause requested",
            Self::Resume => "resume requested",
        }
    }
}

/// Execute a control command.
///
/// A server-side failure is also published as a notification by the client.
pub async fn execute(
    action: ControlAction,
    target: ExecutionRef,
    client: &ScenarioExecutionClient,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let ExecutionRef {
        scenario_id,
        execution_id,
    } = target;

    match action {
        ControlAction::Stop => client.stop_scenario(&scenario_id, execution_id).await?,
        ControlAction::Pause => client.pause_scenario(&scenario_id, execution_id).await?,
        ControlAction::Resume => client.resume_scenario(&scenario_id, execution_id).await?,
    }
    info!(scenario_id = %scenario_id, execution_id, action = ?action, "control request accepted");

    writer.render(&ControlReport {
        action,
        scenario_id,
        execution_id,
    })?;
    Ok(())
}

/// Result of a control request.
#[derive(Serialize)]
pub struct ControlReport {
    pub action: ControlAction,
    pub scenario_id: String,
    pub execution_id: i64,
}

impl Render for ControlReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(
            w,
            "{} Execution {} of {}: {}",
            "✓".green(),
            self.execution_id,
            self.scenario_id,
            self.action.outcome()
        )
    }
}
