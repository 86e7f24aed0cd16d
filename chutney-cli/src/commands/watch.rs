//! `chutney watch` command handler
//!
//! Follows the live report of one execution until the server sends `last`,
//! the stream fails, or the user presses Ctrl-C. In every case the
//! transport is closed before the command returns.

use std::future::Future;
use std::io::Write;

use serde::Serialize;
use tracing::{info, warn};

use chutney_core::types::{ExecutionStatus, ScenarioExecutionReport};
use chutney_execution_report::{ReportView, ScenarioExecutionClient, ViewUpdate};

use crate::cli::ExecutionRef;
use crate::commands::report::status_text;
use crate::error::CliError;
use crate::output::{OutputWriter, Render, format_duration_ms};

/// Execute the `watch` command.
pub async fn execute(
    target: ExecutionRef,
    client: &ScenarioExecutionClient,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    follow(
        client,
        &target.scenario_id,
        target.execution_id,
        writer,
        shutdown_signal(),
    )
    .await
}

/// Follow a live report until completion, failure, or `interrupt` resolves.
///
/// Returns `CliError::ExecutionFailed` when the last snapshot reports a failure.
pub async fn follow(
    client: &ScenarioExecutionClient,
    scenario_id: &str,
    execution_id: i64,
    writer: &OutputWriter,
    interrupt: impl Future<Output = ()>,
) -> Result<(), CliError> {
    let stream = client.observe_scenario_execution(scenario_id, execution_id)?;
    let mut view = ReportView::new();
    view.open(execution_id, stream).await;

    tokio::pin!(interrupt);
    let outcome = loop {
        let update = tokio::select! {
            _ = &mut interrupt => None,
            update = view.advance() => Some(update),
        };

        match update {
            None => {
                info!(execution_id, "interrupted, closing live report");
                break WatchOutcome::Interrupted;
            }
            Some(ViewUpdate::Snapshot) => {
                if let Some(report) = view.latest() {
                    writer.render_line(&Snapshot(report))?;
                }
            }
            Some(ViewUpdate::Completed) | Some(ViewUpdate::Idle) => break WatchOutcome::Completed,
            Some(ViewUpdate::Failed(failure)) => {
                warn!(execution_id, reason = %failure.reason(), "live report failed");
                view.close().await;
                return Err(CliError::Command(failure.to_string()));
            }
        }
    };

    let last_status = view.latest().and_then(|report| report.status);
    let last_error = view.latest().and_then(|report| report.error.clone());
    view.close().await;

    writer.render_line(&WatchEnd {
        execution_id,
        outcome,
        status: last_status,
    })?;

    if outcome == WatchOutcome::Completed && last_status == Some(ExecutionStatus::Failure) {
        let detail = last_error.unwrap_or_else(|| "no error message".to_owned());
        return Err(CliError::ExecutionFailed(format!(
            "execution {execution_id} ended with FAILURE: {detail}"
        )));
    }
    Ok(())
}

/// Resolves on Ctrl-C. If the handler cannot be installed it never resolves.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

/// One live snapshot.
#[derive(Serialize)]
#[serde(transparent)]
pub struct Snapshot<'a>(pub &'a ScenarioExecutionReport);

impl Render for Snapshot<'_> {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        let report = self.0;
        write!(w, "#{} {}", report.execution_id, status_text(report))?;
        if let Some(duration) = report.duration {
            write!(w, "  {}", format_duration_ms(duration))?;
        }
        if let Some(error) = &report.error {
            write!(w, "  {}", error)?;
        }
        writeln!(w)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchOutcome {
    Completed,
    Interrupted,
}

/// Final line of a watch session.
#[derive(Serialize)]
pub struct WatchEnd {
    pub execution_id: i64,
    pub outcome: WatchOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ExecutionStatus>,
}

impl Render for WatchEnd {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        match self.outcome {
            WatchOutcome::Completed => writeln!(
                w,
                "Execution {} finished ({})",
                self.execution_id,
                self.status.map(|s| s.as_str()).unwrap_or("-")
            ),
            WatchOutcome::Interrupted => writeln!(
                w,
                "Stopped watching execution {}; the execution keeps running",
                self.execution_id
            ),
        }
    }
}
