//! 실행 API 클라이언트 — 시나리오 실행 엔드포인트 호출
//!
//! | 작업 | 메서드 | 경로 |
//! |---|---|---|
//! | [`find_scenario_executions`](ScenarioExecutionClient::find_scenario_executions) | GET | `/api/ui/scenario/{scenarioId}/execution/v1` |
//! | [`find_execution_summary`](ScenarioExecutionClient::find_execution_summary) | GET | `/api/ui/scenario/execution/{executionId}/summary/v1` |
//! | [`execute_scenario_async`](ScenarioExecutionClient::execute_scenario_async) | POST | `/api/ui/scenario/executionasync/v1/{scenarioId}[/{env}][/{dataset}]` |
//! | [`find_execution_report`](ScenarioExecutionClient::find_execution_report) | GET | `/api/ui/scenario/{scenarioId}/execution/{executionId}/v1` |
//! | [`observe_scenario_execution`](ScenarioExecutionClient::observe_scenario_execution) | SSE | `/api/ui/scenario/executionasync/v1/{scenarioId}/execution/{executionId}` |
//! | stop / pause / resume | POST | 같은 실행 경로 + `/stop`, `/pause`, `/resume` |
//!
//! 상태를 바꾸는 작업이 실패하면 주입된 [`NotificationSink`]로 알림을 발행한 뒤
//! 호출자에게 에러를 반환합니다.

use std::sync::Arc;
use std::time::Instant;

use chutney_core::config::ServerConfig;
use chutney_core::metrics as m;
use chutney_core::notify::{Notification, NotificationSink};
use chutney_core::types::{Execution, ScenarioExecutionReport};
use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::ExecutionReportError;
use crate::normalize::normalize_polled;
use crate::stream::ReportStream;
use crate::stream::transport::{BasicAuth, EventSourceConnector, HttpConnector};

const RESOURCE: [&str; 3] = ["api", "ui", "scenario"];

/// 시나리오 실행 API 클라이언트
///
/// 커넥터 타입 파라미터로 라이브 리포트 전송 계층을 고릅니다.
/// 기본값은 [`HttpConnector`]입니다.
pub struct ScenarioExecutionClient<C = HttpConnector> {
    http: reqwest::Client,
    base_url: Url,
    auth: Option<BasicAuth>,
    connector: C,
    notifier: Arc<dyn NotificationSink>,
    channel_capacity: usize,
}

impl<C> std::fmt::Debug for ScenarioExecutionClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioExecutionClient")
            .field("base_url", &self.base_url)
            .field("channel_capacity", &self.channel_capacity)
            .finish_non_exhaustive()
    }
}

impl ScenarioExecutionClient<HttpConnector> {
    /// `[server]` 설정 섹션으로 클라이언트를 생성합니다.
    ///
    /// # Errors
    ///
    /// 기본 URL을 해석할 수 없으면 `InvalidBaseUrl`, HTTP 클라이언트를 만들 수 없으면
    /// `Request`를 반환합니다.
    pub fn new(
        server: &ServerConfig,
        channel_capacity: usize,
        notifier: Arc<dyn NotificationSink>,
    ) -> Result<Self, ExecutionReportError> {
        let base_url = parse_base_url(&server.base_url)?;
        let auth = server.username.as_ref().map(|username| BasicAuth {
            username: username.clone(),
            password: server.password.clone(),
        });

        let http = reqwest::Client::builder()
            .timeout(server.request_timeout())
            .connect_timeout(server.connect_timeout())
            .build()
            .map_err(|e| ExecutionReportError::Request {
                operation: "build_client",
                reason: e.to_string(),
            })?;

        let connector = HttpConnector::new(server.connect_timeout())
            .map_err(|e| ExecutionReportError::Request {
                operation: "build_client",
                reason: e.to_string(),
            })?
            .with_auth(auth.clone());

        info!(base_url = %base_url, "scenario execution client created");

        Ok(Self {
            http,
            base_url,
            auth,
            connector,
            notifier,
            channel_capacity: channel_capacity.max(1),
        })
    }
}

impl<C> ScenarioExecutionClient<C>
where
    C: EventSourceConnector + Clone,
{
    /// 라이브 리포트 전송 계층을 교체합니다.
    pub fn with_connector<D>(self, connector: D) -> ScenarioExecutionClient<D>
    where
        D: EventSourceConnector + Clone,
    {
        ScenarioExecutionClient {
            http: self.http,
            base_url: self.base_url,
            auth: self.auth,
            connector,
            notifier: self.notifier,
            channel_capacity: self.channel_capacity,
        }
    }

    /// 서버 기본 URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// 시나리오의 전체 실행 이력을 조회합니다.
    pub async fn find_scenario_executions(
        &self,
        scenario_id: &str,
    ) -> Result<Vec<Execution>, ExecutionReportError> {
        const OP: &str = "find_scenario_executions";
        let url = self.endpoint(&[scenario_id, "execution", "v1"])?;
        debug!(scenario_id, url = %url, "fetching scenario executions");
        let response = self.send(OP, self.http.get(url)).await?;
        decode_json(OP, response).await
    }

    /// 실행 한 건의 요약을 조회합니다.
    pub async fn find_execution_summary(
        &self,
        execution_id: i64,
    ) -> Result<Execution, ExecutionReportError> {
        const OP: &str = "find_execution_summary";
        let id = execution_id.to_string();
        let url = self.endpoint(&["execution", &id, "summary", "v1"])?;
        debug!(execution_id, url = %url, "fetching execution summary");
        let response = self.send(OP, self.http.get(url)).await?;
        decode_json(OP, response).await
    }

    /// 비동기 실행을 시작하고 새 실행 ID를 반환합니다.
    ///
    /// 비어 있는 `environment`/`dataset`은 경로에서 생략합니다.
    pub async fn execute_scenario_async(
        &self,
        scenario_id: &str,
        environment: Option<&str>,
        dataset: Option<&str>,
    ) -> Result<String, ExecutionReportError> {
        const OP: &str = "execute_scenario";
        let mut segments = vec!["executionasync", "v1", scenario_id];
        segments.extend(environment.filter(|e| !e.is_empty()));
        segments.extend(dataset.filter(|d| !d.is_empty()));

        let result: Result<String, ExecutionReportError> = async {
            let url = self.endpoint(&segments)?;
            info!(scenario_id, environment, dataset, "starting scenario execution");
            let response = self.send(OP, self.http.post(url).json(&serde_json::json!({}))).await?;
            let body = response
                .text()
                .await
                .map_err(|e| ExecutionReportError::Decode {
                    operation: OP,
                    reason: e.to_string(),
                })?;
            Ok(parse_execution_id(&body))
        }
        .await;

        self.notify_on_error(OP, result)
    }

    /// 실행의 라이브 리포트 스트림을 엽니다.
    ///
    /// tokio 런타임 안에서 호출해야 합니다. 호출할 때마다 새 연결을 엽니다.
    pub fn observe_scenario_execution(
        &self,
        scenario_id: &str,
        execution_id: i64,
    ) -> Result<ReportStream, ExecutionReportError> {
        let url = self.stream_url(scenario_id, execution_id)?;
        info!(scenario_id, execution_id, url = %url, "observing scenario execution");
        Ok(ReportStream::open(
            self.connector.clone(),
            url.as_str(),
            self.channel_capacity,
        ))
    }

    /// 라이브 리포트 스트림 URL
    pub fn stream_url(
        &self,
        scenario_id: &str,
        execution_id: i64,
    ) -> Result<Url, ExecutionReportError> {
        let id = execution_id.to_string();
        self.endpoint(&["executionasync", "v1", scenario_id, "execution", &id])
    }

    /// 실행 리포트를 폴링합니다. `Ok(None)`은 아직 리포트가 없다는 뜻입니다.
    pub async fn find_execution_report(
        &self,
        scenario_id: &str,
        execution_id: i64,
    ) -> Result<Option<ScenarioExecutionReport>, ExecutionReportError> {
        const OP: &str = "find_execution_report";
        let id = execution_id.to_string();
        let url = self.endpoint(&[scenario_id, "execution", &id, "v1"])?;
        metrics::counter!(m::REPORT_POLLS_TOTAL).increment(1);
        debug!(scenario_id, execution_id, url = %url, "polling execution report");

        let response = self.send(OP, self.http.get(url)).await?;
        let body = response
            .text()
            .await
            .map_err(|e| ExecutionReportError::Decode {
                operation: OP,
                reason: e.to_string(),
            })?;
        normalize_polled(&body)
    }

    /// 실행 중지를 요청합니다.
    pub async fn stop_scenario(
        &self,
        scenario_id: &str,
        execution_id: i64,
    ) -> Result<(), ExecutionReportError> {
        self.control("stop_scenario", scenario_id, execution_id, "stop")
            .await
    }

    /// 실행 일시 정지를 요청합니다.
    pub async fn pause_scenario(
        &self,
        scenario_id: &str,
        execution_id: i64,
    ) -> Result<(), ExecutionReportError> {
        self.control("pause_scenario", scenario_id, execution_id, "pause")
            .await
    }

    /// 일시 정지된 실행의 재개를 요청합니다.
    pub async fn resume_scenario(
        &self,
        scenario_id: &str,
        execution_id: i64,
    ) -> Result<(), ExecutionReportError> {
        self.control("resume_scenario", scenario_id, execution_id, "resume")
            .await
    }

    async fn control(
        &self,
        operation: &'static str,
        scenario_id: &str,
        execution_id: i64,
        action: &str,
    ) -> Result<(), ExecutionReportError> {
        let id = execution_id.to_string();
        let result: Result<(), ExecutionReportError> = async {
            let url = self.endpoint(&["executionasync", "v1", scenario_id, "execution", &id, action])?;
            info!(scenario_id, execution_id, action, "sending execution control request");
            self.send(operation, self.http.post(url).json(&serde_json::json!({})))
                .await
                .map(|_| ())
        }
        .await;

        self.notify_on_error(operation, result)
    }

    /// 각 세그먼트를 퍼센트 인코딩해 `{base}/api/ui/scenario/{segments...}`를 만듭니다.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ExecutionReportError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ExecutionReportError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: "cannot be a base".to_owned(),
            })?
            .pop_if_empty()
            .extend(RESOURCE)
            .extend(segments);
        Ok(url)
    }

    async fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, ExecutionReportError> {
        let request = match &self.auth {
            Some(auth) => request.basic_auth(&auth.username, auth.password.as_ref()),
            None => request,
        };

        let started = Instant::now();
        let result = request.send().await;
        metrics::histogram!(m::CLIENT_REQUEST_DURATION_SECONDS, m::LABEL_OPERATION => operation)
            .record(started.elapsed().as_secs_f64());

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                record_request(operation, false);
                warn!(operation, error = %e, "request failed");
                return Err(ExecutionReportError::Request {
                    operation,
                    reason: e.to_string(),
                });
            }
        };

        let status = response.status();
        if status.is_success() {
            record_request(operation, true);
            return Ok(response);
        }

        record_request(operation, false);
        let body = response.text().await.unwrap_or_default();
        let message = derive_error_message(operation, status.as_u16(), &body);
        warn!(operation, status = status.as_u16(), message = %message, "server returned an error");
        Err(ExecutionReportError::Status {
            operation,
            status: status.as_u16(),
            message,
        })
    }

    fn notify_on_error<T>(
        &self,
        operation: &'static str,
        result: Result<T, ExecutionReportError>,
    ) -> Result<T, ExecutionReportError> {
        if let Err(e) = &result {
            let message = match e {
                ExecutionReportError::Status { message, .. } => message.clone(),
                other => format!("{} failed: {other}", display_operation(operation)),
            };
            metrics::counter!(m::NOTIFICATIONS_PUBLISHED_TOTAL).increment(1);
            self.notifier.publish(Notification::error(message));
        }
        result
    }
}

fn record_request(operation: &'static str, success: bool) {
    let result = if success { "success" } else { "failure" };
    metrics::counter!(
        m::CLIENT_REQUESTS_TOTAL,
        m::LABEL_OPERATION => operation,
        m::LABEL_RESULT => result
    )
    .increment(1);
}

fn parse_base_url(raw: &str) -> Result<Url, ExecutionReportError> {
    let url = Url::parse(raw.trim()).map_err(|e| ExecutionReportError::InvalidBaseUrl {
        url: raw.to_owned(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ExecutionReportError::InvalidBaseUrl {
            url: raw.to_owned(),
            reason: "cannot be a base".to_owned(),
        });
    }
    Ok(url)
}

async fn decode_json<T: DeserializeOwned>(
    operation: &'static str,
    response: Response,
) -> Result<T, ExecutionReportError> {
    response
        .json::<T>()
        .await
        .map_err(|e| ExecutionReportError::Decode {
            operation,
            reason: e.to_string(),
        })
}

/// 실행 ID는 JSON 문자열 또는 일반 텍스트로 옵니다.
fn parse_execution_id(body: &str) -> String {
    let body = body.trim();
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::String(id)) => id,
        Ok(serde_json::Value::Number(n)) => n.to_string(),
        _ => body.to_owned(),
    }
}

/// 실패한 요청에 대해 사용자에게 보여줄 메시지
///
/// JSON 본문의 `message` 필드, 없으면 비어 있지 않은 본문, 그것도 없으면 기본 메시지입니다.
pub fn derive_error_message(operation: &str, status: u16, body: &str) -> String {
    let body = body.trim();
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = map
            .get("message")
            .and_then(|m| m.as_str())
            .filter(|m| !m.trim().is_empty())
        {
            return message.to_owned();
        }
    }
    if !body.is_empty() && !body.starts_with('{') {
        return body.to_owned();
    }
    format!("{} failed (HTTP {status})", display_operation(operation))
}

fn display_operation(operation: &str) -> String {
    let mut words = operation.split('_');
    let mut out = String::new();
    if let Some(first) = words.next() {
        let mut chars = first.chars();
        if let Some(c) = chars.next() {
            out.extend(c.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    for word in words {
        out.push(' ');
        out.push_str(word);
    }
    out
}
