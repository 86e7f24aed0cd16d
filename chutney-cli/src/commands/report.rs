//! `chutney report` command handler

use std::io::Write;

use serde::Serialize;
use tracing::info;

use chutney_core::types::{EnglishStatusLabels, ScenarioExecutionReport, StatusLabels};
use chutney_execution_report::ScenarioExecutionClient;

use crate::cli::ExecutionRef;
use crate::commands::paint_status;
use crate::error::CliError;
use crate::output::{OutputWriter, Render, format_duration_ms};

/// Execute the `report` command.
///
/// An empty payload is not an error: the report is simply not available yet.
pub async fn execute(
    target: ExecutionRef,
    client: &ScenarioExecutionClient,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let report = client
        .find_execution_report(&target.scenario_id, target.execution_id)
        .await?;
    info!(
        scenario_id = %target.scenario_id,
        execution_id = target.execution_id,
        available = report.is_some(),
        "execution report polled"
    );

    writer.render(&ReportOutput {
        scenario_id: target.scenario_id,
        execution_id: target.execution_id,
        available: report.is_some(),
        report,
    })?;
    Ok(())
}

/// Polled report of one execution.
#[derive(Serialize)]
pub struct ReportOutput {
    pub scenario_id: String,
    pub execution_id: i64,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ScenarioExecutionReport>,
}

impl Render for ReportOutput {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        match &self.report {
            Some(report) => render_report(report, w),
            None => writeln!(
                w,
                "No report yet for execution {} of {}",
                self.execution_id, self.scenario_id
            ),
        }
    }
}

/// Render a report snapshot with its dataset constants and table.
pub(crate) fn render_report(report: &ScenarioExecutionReport, w: &mut dyn Write) -> std::io::Result<()> {
    use colored::Colorize;

    writeln!(w, "Execution {}  {}", report.execution_id.to_string().bold(), status_text(report))?;
    if let Some(title) = &report.test_case_title {
        writeln!(w, "  Scenario:    {}", title)?;
    }
    if let Some(start) = report.start_time {
        writeln!(w, "  Started:     {}", start.to_rfc3339())?;
    }
    if let Some(duration) = report.duration {
        writeln!(w, "  Duration:    {}", format_duration_ms(duration))?;
    }
    if let Some(environment) = &report.environment {
        writeln!(w, "  Environment: {}", environment)?;
    }
    if let Some(user) = &report.user {
        writeln!(w, "  Executor:    {}", user)?;
    }
    if let Some(error) = &report.error {
        writeln!(w, "  Error:       {}", error.red())?;
    }

    if let Some(constants) = report.constants.as_ref().filter(|c| !c.is_empty()) {
        writeln!(w, "  Constants:")?;
        for pair in constants {
            writeln!(w, "    {} = {}", pair.key, pair.value)?;
        }
    }

    if let Some(rows) = report.datatable.as_ref().filter(|t| !t.is_empty()) {
        writeln!(w, "  Datatable:")?;
        if let Some(header) = rows.first() {
            let columns: Vec<&str> = header.iter().map(|c| c.key.as_str()).collect();
            writeln!(w, "    {}", columns.join(" | ").bold())?;
        }
        for row in rows {
            let values: Vec<&str> = row.iter().map(|c| c.value.as_str()).collect();
            writeln!(w, "    {}", values.join(" | "))?;
        }
    }

    Ok(())
}

/// Colored status label of a report, `-` when the status is not known yet.
pub(crate) fn status_text(report: &ScenarioExecutionReport) -> String {
    match report.status {
        Some(status) => paint_status(status, &EnglishStatusLabels.label(status)).to_string(),
        None => "-".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chutney_core::types::{ExecutionStatus, KeyValue};

    fn report() -> ScenarioExecutionReport {
        ScenarioExecutionReport {
            execution_id: 5,
            status: Some(ExecutionStatus::Success),
            duration: Some(12),
            start_time: None,
            report: None,
            environment: Some("QA".to_owned()),
            user: Some("alice".to_owned()),
            test_case_title: Some("Checkout".to_owned()),
            error: None,
            context_variables: None,
            constants: Some(vec![KeyValue::new("zeta", "1"), KeyValue::new("alpha", "2")]),
            datatable: Some(vec![
                vec![KeyValue::new("login", "u1"), KeyValue::new("password", "p1")],
                vec![KeyValue::new("login", "u2"), KeyValue::new("password", "p2")],
            ]),
        }
    }

    fn render(output: &ReportOutput) -> String {
        let mut buffer = Vec::new();
        output.render_text(&mut buffer).expect("render should succeed");
        String::from_utf8(buffer).expect("valid UTF-8")
    }

    #[test]
    fn test_render_missing_report() {
        let text = render(&ReportOutput {
            scenario_id: "sc".to_owned(),
            execution_id: 5,
            available: false,
            report: None,
        });
        assert_eq!(text.trim(), "No report yet for execution 5 of sc");
    }

    #[test]
    fn test_render_keeps_constant_and_column_order() {
        let text = render(&ReportOutput {
            scenario_id: "sc".to_owned(),
            execution_id: 5,
            available: true,
            report: Some(report()),
        });

        let zeta = text.find("zeta = 1").expect("zeta rendered");
        let alpha = text.find("alpha = 2").expect("alpha rendered");
        assert!(zeta < alpha, "constants must keep source order");
        assert!(text.contains("u1 | p1"));
        assert!(text.contains("u2 | p2"));
        assert!(text.contains("12ms"));
    }

    #[test]
    fn test_json_has_available_flag() {
        let json = serde_json::to_value(ReportOutput {
            scenario_id: "sc".to_owned(),
            execution_id: 5,
            available: false,
            report: None,
        })
        .expect("serializable");
        assert_eq!(json["available"], false);
        assert!(json.get("report").is_none());
    }
}
