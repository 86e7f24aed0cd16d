//! `chutney summary` command handler

use std::io::Write;

use serde::Serialize;
use tracing::debug;

use chutney_core::types::{EnglishStatusLabels, Execution, StatusLabels};
use chutney_execution_history::ExecutionMatcher;
use chutney_execution_report::ScenarioExecutionClient;

use crate::cli::SummaryArgs;
use crate::commands::paint_status;
use crate::error::CliError;
use crate::output::{OutputWriter, Render, format_duration_ms};

/// Execute the `summary` command.
pub async fn execute(
    args: SummaryArgs,
    client: &ScenarioExecutionClient,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let execution = client.find_execution_summary(args.execution_id).await?;
    debug!(execution_id = args.execution_id, status = %execution.status, "summary fetched");

    writer.render(&SummaryReport::new(execution))?;
    Ok(())
}

/// Summary of one execution.
#[derive(Serialize)]
pub struct SummaryReport {
    #[serde(flatten)]
    pub execution: Execution,
    pub status_label: String,
    /// Local execution time (`DD Mon. YYYY HH:mm`)
    pub local_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign_link: Option<String>,
}

impl SummaryReport {
    pub fn new(execution: Execution) -> Self {
        let matcher = ExecutionMatcher::default();
        Self {
            status_label: EnglishStatusLabels.label(execution.status),
            local_time: matcher.format_time(&execution),
            campaign_link: execution
                .campaign_report
                .as_ref()
                .map(|campaign| campaign.execution_link()),
            execution,
        }
    }
}

impl Render for SummaryReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        let e = &self.execution;
        writeln!(
            w,
            "Execution {}  {}",
            e.execution_id.to_string().bold(),
            paint_status(e.status, &self.status_label)
        )?;
        if let Some(title) = &e.test_case_title {
            writeln!(w, "  Scenario:    {}", title)?;
        }
        writeln!(w, "  Time:        {}", self.local_time)?;
        if let Some(duration) = e.duration {
            writeln!(w, "  Duration:    {}", format_duration_ms(duration))?;
        }
        writeln!(w, "  Environment: {}", e.environment)?;
        if let Some(dataset) = e.dataset.as_deref().filter(|d| !d.is_empty()) {
            writeln!(w, "  Dataset:     {}", dataset)?;
        }
        writeln!(w, "  Executor:    {}", e.user)?;
        if !e.tags.is_empty() {
            writeln!(w, "  Tags:        {}", e.tags.join(", "))?;
        }
        if let (Some(campaign), Some(link)) = (e.campaign_name(), &self.campaign_link) {
            writeln!(w, "  Campaign:    {} ({})", campaign, link)?;
        }
        if let Some(error) = &e.error {
            writeln!(w, "  Error:       {}", error.red())?;
        }
        Ok(())
    }
}
