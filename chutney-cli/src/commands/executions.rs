//! `chutney executions` command handler

use std::io::Write;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use chutney_core::types::{EnglishStatusLabels, Execution, ExecutionStatus, StatusLabels};
use chutney_execution_history::filter::query::{
    KEY_CAMPAIGNS, KEY_DATASETS, KEY_DATE, KEY_ENVIRONMENT, KEY_EXECUTORS, KEY_KEYWORD,
    KEY_STATUS, KEY_TAGS,
};
use chutney_execution_history::{
    ExecutionHistory, ExecutionMatcher, Facets, QueryParams, SelectOption, from_query_params,
    to_query_params,
};
use chutney_execution_report::ScenarioExecutionClient;

use crate::cli::ExecutionsArgs;
use crate::commands::paint_status;
use crate::error::CliError;
use crate::output::{OutputWriter, Render, format_duration_ms};
use crate::query::{format_query_string, parse_query_string};

/// Execute the `executions` command.
pub async fn execute(
    args: ExecutionsArgs,
    client: &ScenarioExecutionClient,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let params = filter_params(&args)?;
    let executions = client.find_scenario_executions(&args.scenario_id).await?;
    info!(
        scenario_id = %args.scenario_id,
        executions = executions.len(),
        "execution history loaded"
    );

    let report = build_report(&args.scenario_id, executions, &params, args.facets);
    writer.render(&report)?;
    Ok(())
}

/// Merge `--query` with the explicit filter flags. Flags win.
pub fn filter_params(args: &ExecutionsArgs) -> Result<QueryParams, CliError> {
    let mut params = match args.query.as_deref() {
        Some(raw) => parse_query_string(raw)?,
        None => QueryParams::new(),
    };

    let flags = [
        (KEY_KEYWORD, &args.keyword),
        (KEY_DATE, &args.date),
        (KEY_STATUS, &args.status),
        (KEY_ENVIRONMENT, &args.env),
        (KEY_DATASETS, &args.datasets),
        (KEY_EXECUTORS, &args.exec),
        (KEY_CAMPAIGNS, &args.camp),
        (KEY_TAGS, &args.tags),
    ];
    for (key, value) in flags {
        if let Some(value) = value {
            params.insert(key.to_owned(), value.clone());
        }
    }

    Ok(params)
}

/// Filter the history and build the output payload.
pub fn build_report(
    scenario_id: &str,
    executions: Vec<Execution>,
    params: &QueryParams,
    with_facets: bool,
) -> ExecutionListReport {
    let labels: Arc<dyn StatusLabels> = Arc::new(EnglishStatusLabels);
    let mut history = ExecutionHistory::new(ExecutionMatcher::new(Arc::clone(&labels)));
    history.replace(executions);

    let filter = from_query_params(params, labels.as_ref());
    let rows: Vec<ExecutionRow> = history
        .filtered(&filter)
        .into_iter()
        .map(|execution| ExecutionRow::new(execution, &history))
        .collect();

    ExecutionListReport {
        scenario_id: scenario_id.to_owned(),
        total: history.len(),
        matched: rows.len(),
        query: format_query_string(&to_query_params(&filter)),
        executions: rows,
        facets: with_facets.then(|| history.facets().clone()),
    }
}

/// Filtered execution history.
#[derive(Serialize)]
pub struct ExecutionListReport {
    pub scenario_id: String,
    /// Number of executions before filtering
    pub total: usize,
    /// Number of executions after filtering
    pub matched: usize,
    /// Canonical query string of the applied filter
    pub query: String,
    pub executions: Vec<ExecutionRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facets: Option<Facets>,
}

/// One execution as displayed in the history table.
#[derive(Serialize)]
pub struct ExecutionRow {
    pub execution_id: i64,
    pub status: ExecutionStatus,
    pub status_label: String,
    /// Local execution time (`DD Mon. YYYY HH:mm`)
    pub time: String,
    pub environment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionRow {
    fn new(execution: &Execution, history: &ExecutionHistory) -> Self {
        let matcher = history.matcher();
        Self {
            execution_id: execution.execution_id,
            status: execution.status,
            status_label: matcher.labels().label(execution.status),
            time: matcher.format_time(execution),
            environment: execution.environment.clone(),
            dataset: execution.dataset.clone().filter(|d| !d.is_empty()),
            user: execution.user.clone(),
            duration_ms: execution.duration,
            tags: execution.tags.clone(),
            campaign: execution.campaign_name().map(str::to_owned),
            campaign_link: history.campaign_link(execution.execution_id),
            error: execution.error.clone(),
        }
    }
}

impl Render for ExecutionListReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(
            w,
            "Executions of {} ({} of {})",
            self.scenario_id.bold(),
            self.matched,
            self.total
        )?;
        if !self.query.is_empty() {
            writeln!(w, "Filter: {}", self.query)?;
        }
        writeln!(w)?;

        if self.executions.is_empty() {
            writeln!(w, "  {}", "No matching executions.".dimmed())?;
        } else {
            writeln!(
                w,
                "{:<8} {:<14} {:<19} {:<12} {:<12} {:<12} {:>9}  {}",
                "ID", "STATUS", "TIME", "ENV", "DATASET", "USER", "DURATION", "TAGS"
            )?;
            writeln!(w, "{}", "-".repeat(100))?;
            for row in &self.executions {
                // pad before coloring, escape codes would skew the column width
                let status = format!("{:<14}", row.status_label);
                writeln!(
                    w,
                    "{:<8} {} {:<19} {:<12} {:<12} {:<12} {:>9}  {}",
                    row.execution_id,
                    paint_status(row.status, &status),
                    row.time,
                    row.environment,
                    row.dataset.as_deref().unwrap_or("-"),
                    row.user,
                    row.duration_ms.map(format_duration_ms).unwrap_or_default(),
                    row.tags.join(",")
                )?;
                if let Some(campaign) = &row.campaign {
                    writeln!(
                        w,
                        "{:<8} campaign: {} ({})",
                        "",
                        campaign,
                        row.campaign_link.as_deref().unwrap_or_default()
                    )?;
                }
                if let Some(error) = &row.error {
                    writeln!(w, "{:<8} {}", "", error.red())?;
                }
            }
        }

        if let Some(facets) = &self.facets {
            writeln!(w)?;
            writeln!(w, "{}", "Filter options".bold())?;
            let dimensions = [
                ("status", &facets.status),
                ("env", &facets.environments),
                ("datasets", &facets.datasets),
                ("exec", &facets.executors),
                ("camp", &facets.campaigns),
                ("tags", &facets.tags),
            ];
            for (key, options) in dimensions {
                writeln!(w, "  {:<9} {}", key, describe_options(options))?;
            }
        }

        Ok(())
    }
}

fn describe_options(options: &[SelectOption]) -> String {
    if options.is_empty() {
        return "-".to_owned();
    }
    options
        .iter()
        .map(|option| {
            if option.id == option.label {
                option.id.clone()
            } else {
                format!("{} ({})", option.id, option.label)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use chutney_core::types::CampaignReportRef;

    fn execution(id: i64, status: ExecutionStatus, env: &str) -> Execution {
        Execution {
            execution_id: id,
            status,
            environment: env.to_owned(),
            dataset: None,
            user: "alice".to_owned(),
            time: Some(Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()),
            duration: Some(1500),
            tags: vec!["smoke".to_owned()],
            campaign_report: None,
            error: None,
            test_case_title: None,
        }
    }

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_flags_override_query() {
        let args = ExecutionsArgs {
            scenario_id: "sc".to_owned(),
            query: Some("status=SUCCESS&env=QA".to_owned()),
            status: Some("FAILURE".to_owned()),
            ..Default::default()
        };

        let merged = filter_params(&args).expect("should merge");
        assert_eq!(merged, params(&[("env", "QA"), ("status", "FAILURE")]));
    }

    #[test]
    fn test_build_report_filters_and_counts() {
        let executions = vec![
            execution(1, ExecutionStatus::Success, "QA"),
            execution(2, ExecutionStatus::Failure, "QA"),
            execution(3, ExecutionStatus::Failure, "PROD"),
        ];

        let report = build_report(
            "sc",
            executions,
            &params(&[("status", "FAILURE"), ("env", "QA")]),
            false,
        );

        assert_eq!(report.total, 3);
        assert_eq!(report.matched, 1);
        assert_eq!(report.executions[0].execution_id, 2);
        assert_eq!(report.executions[0].status_label, "Failure");
        assert_eq!(report.query, "env=QA&status=FAILURE");
        assert!(report.facets.is_none());
    }

    #[test]
    fn test_malformed_params_are_ignored() {
        let report = build_report(
            "sc",
            vec![execution(1, ExecutionStatus::Success, "QA")],
            &params(&[("date", "not-a-date")]),
            true,
        );
        assert_eq!(report.matched, 1);
        assert_eq!(report.query, "");
        assert!(report.facets.is_some());
    }

    #[test]
    fn test_render_text_includes_rows_campaign_and_facets() {
        let mut in_campaign = execution(7, ExecutionStatus::Warn, "QA");
        in_campaign.campaign_report = Some(CampaignReportRef {
            campaign_id: 3,
            campaign_name: "nightly".to_owned(),
            execution_id: 70,
        });
        in_campaign.error = Some("Slow response".to_owned());

        let report = build_report("sc", vec![in_campaign], &QueryParams::new(), true);
        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("render should succeed");
        let output = String::from_utf8(buffer).expect("valid UTF-8");

        assert!(output.contains("(1 of 1)"));
        assert!(output.contains("Warning"));
        assert!(output.contains("/campaign/3/executions?open=70&active=70"));
        assert!(output.contains("Slow response"));
        assert!(output.contains("WARN (Warning)"));
        assert!(output.contains("1.5s"));
    }

    #[test]
    fn test_render_text_empty_result() {
        let report = build_report("sc", Vec::new(), &QueryParams::new(), false);
        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("render should succeed");
        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("No matching executions."));
    }

    #[test]
    fn test_json_omits_absent_fields() {
        let report = build_report(
            "sc",
            vec![execution(1, ExecutionStatus::Success, "QA")],
            &QueryParams::new(),
            false,
        );
        let json = serde_json::to_value(&report).expect("serializable");
        assert_eq!(json["executions"][0]["status"], "SUCCESS");
        assert!(json["executions"][0].get("campaign").is_none());
        assert!(json.get("facets").is_none());
    }
}
