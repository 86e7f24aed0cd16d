//! 리포트 정규화 — 폴링 응답과 스트림 이벤트를 하나의 리포트 형태로 변환
//!
//! 두 가지 입력 형태를 지원합니다.
//!
//! - **폴링** (`GET .../execution/{id}/v1`): 봉투의 `report` 필드가 JSON 문자열입니다.
//!   문자열을 디코딩한 컨테이너가 자체 `report` 객체를 가지면 그것이 단계 리포트이고,
//!   없으면 컨테이너 자체가 단계 리포트입니다. `contextVariables`, `constants`,
//!   `datatable`은 컨테이너에서 읽습니다.
//! - **스트림** (`partial` 이벤트): 봉투의 `report` 필드가 이미 객체입니다.
//!   제목은 `scenarioName`에서 가져옵니다.
//!
//! 필드 해석 순서는 봉투 값, 단계 리포트 값, 없음 순입니다. 병합하지 않습니다.
//! `null`과 빈 문자열은 값이 없는 것으로 취급합니다.

use chutney_core::time::parse_timestamp;
use chutney_core::types::{ExecutionStatus, KeyValue, ScenarioExecutionReport};
use serde_json::{Map, Value};

use crate::error::ExecutionReportError;

/// 폴링 응답 본문을 정규화합니다.
///
/// 본문이 비어 있거나 `null`이면 "아직 리포트 없음"으로 `Ok(None)`을 반환합니다.
///
/// # Errors
///
/// 본문 또는 중첩된 `report` 문자열이 올바른 JSON이 아니면
/// [`ExecutionReportError::MalformedReport`]를 반환합니다.
pub fn normalize_polled(body: &str) -> Result<Option<ScenarioExecutionReport>, ExecutionReportError> {
    let body = body.trim();
    if body.is_empty() {
        return Ok(None);
    }
    let envelope: Value = serde_json::from_str(body)
        .map_err(|e| ExecutionReportError::MalformedReport(format!("envelope: {e}")))?;
    normalize_polled_value(envelope)
}

/// 이미 디코딩된 폴링 봉투를 정규화합니다.
pub fn normalize_polled_value(
    envelope: Value,
) -> Result<Option<ScenarioExecutionReport>, ExecutionReportError> {
    let envelope = match envelope {
        Value::Null => return Ok(None),
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::Object(map) => map,
        other => {
            return Err(ExecutionReportError::MalformedReport(format!(
                "expected an object envelope, got {}",
                kind(&other)
            )));
        }
    };

    let container = match present(envelope.get("report")) {
        Some(Value::String(raw)) => Some(decode_container(raw)?),
        Some(Value::Object(map)) => Some(map.clone()),
        Some(other) => {
            return Err(ExecutionReportError::MalformedReport(format!(
                "report must be a JSON string, got {}",
                kind(other)
            )));
        }
        None => None,
    };

    let step = container.as_ref().map(|c| match present(c.get("report")) {
        Some(inner) => inner.clone(),
        None => Value::Object(c.clone()),
    });

    let execution_id = first_present(&[
        envelope.get("executionId"),
        container.as_ref().and_then(|c| c.get("executionId")),
    ])
    .and_then(as_i64)
    .ok_or(ExecutionReportError::MissingField("executionId"))?;

    let step_field = |name: &str| step.as_ref().and_then(|s| s.get(name));
    let container_field = |name: &str| container.as_ref().and_then(|c| c.get(name));

    Ok(Some(ScenarioExecutionReport {
        execution_id,
        status: first_present(&[envelope.get("status"), step_field("status")]).and_then(as_status),
        duration: first_present(&[nonzero(envelope.get("duration")), step_field("duration")])
            .and_then(as_u64),
        start_time: first_present(&[envelope.get("time"), step_field("startDate")])
            .and_then(parse_timestamp),
        report: step.clone(),
        environment: string_field(&envelope, "environment"),
        user: string_field(&envelope, "user"),
        test_case_title: string_field(&envelope, "testCaseTitle"),
        error: string_field(&envelope, "error"),
        context_variables: present(container_field("contextVariables")).cloned(),
        constants: constants(container_field("constants")),
        datatable: datatable(container_field("datatable")),
    }))
}

/// 스트림 `partial` 이벤트 페이로드를 정규화합니다.
///
/// # Errors
///
/// 페이로드가 객체가 아니거나 `executionId`가 없으면 에러를 반환합니다.
pub fn normalize_streamed(envelope: Value) -> Result<ScenarioExecutionReport, ExecutionReportError> {
    let Value::Object(envelope) = envelope else {
        return Err(ExecutionReportError::MalformedReport(format!(
            "expected an object event payload, got {}",
            kind(&envelope)
        )));
    };

    let step = match present(envelope.get("report")) {
        Some(Value::String(raw)) => Some(Value::Object(decode_container(raw)?)),
        Some(other) => Some(other.clone()),
        None => None,
    };
    let step_field = |name: &str| step.as_ref().and_then(|s| s.get(name));

    let execution_id = first_present(&[envelope.get("executionId"), step_field("executionId")])
        .and_then(as_i64)
        .ok_or(ExecutionReportError::MissingField("executionId"))?;

    Ok(ScenarioExecutionReport {
        execution_id,
        status: first_present(&[envelope.get("status"), step_field("status")]).and_then(as_status),
        duration: first_present(&[nonzero(envelope.get("duration")), step_field("duration")])
            .and_then(as_u64),
        start_time: first_present(&[envelope.get("time"), step_field("startDate")])
            .and_then(parse_timestamp),
        environment: string_field(&envelope, "environment"),
        user: string_field(&envelope, "user"),
        test_case_title: string_field(&envelope, "scenarioName")
            .or_else(|| string_field(&envelope, "testCaseTitle")),
        error: string_field(&envelope, "error"),
        context_variables: present(envelope.get("contextVariables")).cloned(),
        constants: constants(envelope.get("constants")),
        datatable: datatable(envelope.get("datatable")),
        report: step,
    })
}

fn decode_container(raw: &str) -> Result<Map<String, Value>, ExecutionReportError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ExecutionReportError::MalformedReport(format!(
            "nested report must be an object, got {}",
            kind(&other)
        ))),
        Err(e) => Err(ExecutionReportError::MalformedReport(format!(
            "nested report: {e}"
        ))),
    }
}

/// `null`과 빈 문자열을 제외한 값
fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| match v {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    })
}

/// 숫자 `0`은 없는 값으로 취급합니다 (아직 측정되지 않은 `duration`).
fn nonzero(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| v.as_f64() != Some(0.0))
}

fn first_present<'a>(candidates: &[Option<&'a Value>]) -> Option<&'a Value> {
    candidates.iter().find_map(|candidate| present(*candidate))
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_status(value: &Value) -> Option<ExecutionStatus> {
    value
        .as_str()
        .map(|s| s.parse().unwrap_or(ExecutionStatus::Unknown))
}

fn string_field(map: &Map<String, Value>, name: &str) -> Option<String> {
    present(map.get(name)).map(display_value)
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// 매핑을 원본 키 순서대로 key-value 목록으로 변환합니다.
fn to_key_values(map: &Map<String, Value>) -> Vec<KeyValue> {
    map.iter()
        .map(|(key, value)| KeyValue::new(key.as_str(), display_value(value)))
        .collect()
}

fn constants(value: Option<&Value>) -> Option<Vec<KeyValue>> {
    present(value)?.as_object().map(to_key_values)
}

fn datatable(value: Option<&Value>) -> Option<Vec<Vec<KeyValue>>> {
    present(value)?.as_array().map(|rows| {
        rows.iter()
            .filter_map(Value::as_object)
            .map(to_key_values)
            .collect()
    })
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
