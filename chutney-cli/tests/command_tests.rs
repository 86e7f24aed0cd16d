//! Integration tests for the chutney subcommands.
//!
//! An in-process axum server stands in for the execution engine.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use serde_json::json;

use chutney_cli::cli::{ExecutionRef, OutputFormat, RunArgs};
use chutney_cli::commands::control::{self, ControlAction};
use chutney_cli::commands::executions::build_report;
use chutney_cli::commands::{ConfigOverrides, load_config, run, watch};
use chutney_cli::error::CliError;
use chutney_cli::output::OutputWriter;
use chutney_core::config::ServerConfig;
use chutney_core::notify::NullSink;
use chutney_execution_history::QueryParams;
use chutney_execution_report::ScenarioExecutionClient;

const API: &str = "/api/ui/scenario";

#[derive(Default)]
struct Recorder {
    requests: Mutex<Vec<String>>,
}

impl Recorder {
    fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

fn json_response(status: StatusCode, body: serde_json::Value) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
        .into_response()
}

fn sse(body: Body) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .body(body)
        .expect("valid response")
}

fn partial(execution_id: i64, status: &str) -> String {
    let payload = json!({
        "executionId": execution_id,
        "environment": "QA",
        "user": "alice",
        "report": {"status": status, "duration": 40}
    });
    format!("event: partial\ndata: {payload}\n\n")
}

async fn handle(State(recorder): State<Arc<Recorder>>, method: Method, uri: Uri) -> Response {
    let path = uri.path().to_owned();
    if let Ok(mut requests) = recorder.requests.lock() {
        requests.push(format!("{method} {path}"));
    }
    let Some(rest) = path.strip_prefix(API) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match (method.as_str(), rest) {
        ("GET", "/checkout/execution/v1") => json_response(
            StatusCode::OK,
            json!([
                {"executionId": 3, "status": "FAILURE", "environment": "QA", "user": "alice",
                 "time": "2024-01-15T12:00:00Z", "tags": ["smoke"], "error": "Connection refused",
                 "campaignReport": {"campaignId": 9, "campaignName": "nightly", "executionId": 90}},
                {"executionId": 2, "status": "SUCCESS", "environment": "QA", "user": "bob",
                 "time": "2024-01-14T12:00:00Z", "tags": ["smoke", "api"]},
                {"executionId": 1, "status": "SUCCESS", "environment": "PROD", "user": "alice",
                 "time": "2024-01-13T12:00:00Z", "tags": []}
            ]),
        ),
        ("GET", "/execution/2/summary/v1") => json_response(
            StatusCode::OK,
            json!({"executionId": 2, "status": "SUCCESS", "environment": "QA",
                   "dataset": "users", "user": "bob"}),
        ),
        ("POST", "/executionasync/v1/checkout/QA/users") => (StatusCode::OK, "10").into_response(),
        ("POST", "/executionasync/v1/checkout/PROD/users") => {
            (StatusCode::OK, "11").into_response()
        }
        ("GET", "/executionasync/v1/checkout/execution/10") => sse(Body::from(format!(
            "{}{}event: last\ndata: \n\n",
            partial(10, "RUNNING"),
            partial(10, "SUCCESS")
        ))),
        ("GET", "/executionasync/v1/checkout/execution/12") => sse(Body::from(format!(
            "{}event: last\ndata: \n\n",
            partial(12, "FAILURE")
        ))),
        ("GET", "/executionasync/v1/checkout/execution/13") => {
            let first = futures::stream::iter(vec![Ok::<_, std::io::Error>(partial(
                13, "RUNNING",
            ))]);
            sse(Body::from_stream(first.chain(futures::stream::pending())))
        }
        ("POST", "/executionasync/v1/checkout/execution/3/stop") => json_response(
            StatusCode::CONFLICT,
            json!({"message": "Execution 3 already finished"}),
        ),
        ("POST", "/executionasync/v1/checkout/execution/13/pause") => {
            StatusCode::OK.into_response()
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn start_server() -> (String, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let app = Router::new().fallback(handle).with_state(recorder.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test server");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    (format!("http://{addr}"), recorder)
}

fn client(base_url: &str) -> ScenarioExecutionClient {
    let config = ServerConfig {
        base_url: base_url.to_owned(),
        request_timeout_secs: 5,
        connect_timeout_secs: 2,
        ..ServerConfig::default()
    };
    ScenarioExecutionClient::new(&config, 8, Arc::new(NullSink)).expect("client should build")
}

fn json_writer() -> OutputWriter {
    OutputWriter::new(OutputFormat::Json)
}

fn never() -> impl Future<Output = ()> {
    std::future::pending()
}

fn params(pairs: &[(&str, &str)]) -> QueryParams {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

// ---- executions ----

#[tokio::test]
async fn test_executions_filter_server_history() {
    // Given: a scenario with three executions
    let (base, _recorder) = start_server().await;
    let client = client(&base);
    let executions = client
        .find_scenario_executions("checkout")
        .await
        .expect("history should load");

    // When: filtering on tag and executor
    let report = build_report(
        "checkout",
        executions,
        &params(&[("tags", "smoke"), ("exec", "alice")]),
        true,
    );

    // Then: only the failed campaign execution remains
    assert_eq!(report.total, 3);
    assert_eq!(report.matched, 1);
    let row = &report.executions[0];
    assert_eq!(row.execution_id, 3);
    assert_eq!(row.campaign.as_deref(), Some("nightly"));
    assert_eq!(
        row.campaign_link.as_deref(),
        Some("/campaign/9/executions?open=90&active=90")
    );

    // And: facets are derived from the whole history
    let facets = report.facets.expect("facets requested");
    let envs: Vec<&str> = facets.environments.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(envs, vec!["QA", "PROD"]);
    let tags: Vec<&str> = facets.tags.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(tags, vec!["smoke", "api"]);
}

#[tokio::test]
async fn test_executions_keyword_matches_error_text() {
    let (base, _recorder) = start_server().await;
    let executions = client(&base)
        .find_scenario_executions("checkout")
        .await
        .expect("history should load");

    let report = build_report(
        "checkout",
        executions,
        &params(&[("keyword", "CONNECTION refused")]),
        false,
    );
    assert_eq!(report.matched, 1);
    assert_eq!(report.executions[0].execution_id, 3);
}

// ---- run ----

#[tokio::test]
async fn test_run_replay_reuses_environment_and_dataset() {
    let (base, recorder) = start_server().await;
    let client = client(&base);

    let args = RunArgs {
        scenario_id: "checkout".to_owned(),
        replay: Some(2),
        ..Default::default()
    };
    run::execute(args, &client, &json_writer())
        .await
        .expect("replay should start");

    let requests = recorder.requests();
    assert!(requests.contains(&format!("GET {API}/execution/2/summary/v1")));
    assert!(requests.contains(&format!("POST {API}/executionasync/v1/checkout/QA/users")));
}

#[tokio::test]
async fn test_run_replay_flag_overrides_environment() {
    let (base, recorder) = start_server().await;
    let client = client(&base);

    let args = RunArgs {
        scenario_id: "checkout".to_owned(),
        env: Some("PROD".to_owned()),
        replay: Some(2),
        ..Default::default()
    };
    run::execute(args, &client, &json_writer())
        .await
        .expect("replay should start");

    assert!(
        recorder
            .requests()
            .contains(&format!("POST {API}/executionasync/v1/checkout/PROD/users"))
    );
}

#[tokio::test]
async fn test_run_unknown_environment_is_command_error() {
    let (base, _recorder) = start_server().await;
    let client = client(&base);

    let args = RunArgs {
        scenario_id: "checkout".to_owned(),
        env: Some("STAGING".to_owned()),
        ..Default::default()
    };
    let err = run::execute(args, &client, &json_writer())
        .await
        .expect_err("unknown route should fail");
    assert_eq!(err.exit_code(), 1);
}

// ---- watch ----

#[tokio::test]
async fn test_watch_follows_until_last_event() {
    let (base, _recorder) = start_server().await;
    let client = client(&base);

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        watch::follow(&client, "checkout", 10, &json_writer(), never()),
    )
    .await
    .expect("watch should end on the last event");
    assert!(result.is_ok(), "successful execution: {result:?}");
}

#[tokio::test]
async fn test_watch_failed_execution_maps_to_exit_code_4() {
    let (base, _recorder) = start_server().await;
    let client = client(&base);

    let err = watch::follow(&client, "checkout", 12, &json_writer(), never())
        .await
        .expect_err("failed execution");
    assert!(matches!(err, CliError::ExecutionFailed(_)));
    assert_eq!(err.exit_code(), 4);
}

#[tokio::test]
async fn test_watch_interrupt_returns_without_waiting_for_last() {
    let (base, _recorder) = start_server().await;
    let client = client(&base);

    let interrupt = tokio::time::sleep(Duration::from_millis(300));
    let result = tokio::time::timeout(
        Duration::from_secs(5),
        watch::follow(&client, "checkout", 13, &json_writer(), interrupt),
    )
    .await
    .expect("interrupt should end the watch");
    assert!(result.is_ok(), "interrupt is not an error: {result:?}");
}

#[tokio::test]
async fn test_watch_open_failure_is_reported() {
    let (base, _recorder) = start_server().await;
    let client = client(&base);

    let err = watch::follow(&client, "checkout", 404, &json_writer(), never())
        .await
        .expect_err("missing stream");
    assert_eq!(err.to_string(), "Error creating source event");
}

// ---- control ----

#[tokio::test]
async fn test_stop_conflict_surfaces_server_message() {
    let (base, _recorder) = start_server().await;
    let client = client(&base);

    let target = ExecutionRef {
        scenario_id: "checkout".to_owned(),
        execution_id: 3,
    };
    let err = control::execute(ControlAction::Stop, target, &client, &json_writer())
        .await
        .expect_err("already finished");
    assert_eq!(err.to_string(), "Execution 3 already finished");
}

#[tokio::test]
async fn test_pause_succeeds() {
    let (base, recorder) = start_server().await;
    let client = client(&base);

    let target = ExecutionRef {
        scenario_id: "checkout".to_owned(),
        execution_id: 13,
    };
    control::execute(ControlAction::Pause, target, &client, &json_writer())
        .await
        .expect("pause should succeed");
    assert!(
        recorder
            .requests()
            .contains(&format!("POST {API}/executionasync/v1/checkout/execution/13/pause"))
    );
}

#[tokio::test]
async fn test_unreachable_server_maps_to_exit_code_3() {
    // Nothing listens on the discard port
    let client = client("http://127.0.0.1:9");
    let err: CliError = client
        .find_scenario_executions("checkout")
        .await
        .expect_err("connection refused")
        .into();
    assert_eq!(err.exit_code(), 3);
}

// ---- configuration ----

#[tokio::test]
async fn test_load_config_flags_override_file() {
    let temp_dir = tempfile::TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("chutney.toml");
    std::fs::write(
        &config_path,
        r#"
[general]
log_level = "debug"

[server]
base_url = "http://file.example:8081"

[history]
debounce_ms = 250
"#,
    )
    .expect("should write config");

    let overrides = ConfigOverrides {
        log_level: None,
        base_url: Some("http://flag.example".to_owned()),
    };
    let config = load_config(&config_path, &overrides)
        .await
        .expect("config should load");

    assert_eq!(config.server.base_url, "http://flag.example");
    assert_eq!(config.history.debounce_ms, 250);
}

#[tokio::test]
async fn test_load_config_missing_file_uses_defaults() {
    let temp_dir = tempfile::TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("absent.toml");

    let config = load_config(&config_path, &ConfigOverrides::default())
        .await
        .expect("missing file falls back to defaults");
    assert!(config.history.skip_unchanged_navigation);
}

#[tokio::test]
async fn test_load_config_invalid_override_is_config_error() {
    let temp_dir = tempfile::TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("absent.toml");

    let overrides = ConfigOverrides {
        log_level: Some("verbose".to_owned()),
        base_url: None,
    };
    let err = load_config(&config_path, &overrides)
        .await
        .expect_err("invalid log level");
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn test_load_config_malformed_toml_is_config_error() {
    let temp_dir = tempfile::TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("bad.toml");
    std::fs::write(&config_path, "[general\nlog_level = \"info\"\n").expect("should write");

    let err = load_config(&config_path, &ConfigOverrides::default())
        .await
        .expect_err("malformed TOML");
    assert_eq!(err.exit_code(), 2);
}
