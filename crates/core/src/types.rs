//! 도메인 타입 — 실행 이력과 실행 리포트
//!
//! 서버가 내려주는 JSON(camelCase)을 그대로 역직렬화할 수 있도록 정의합니다.
//! [`Execution`]은 한 번 수신하면 불변이며, 이력을 다시 조회하면 통째로 교체됩니다.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 실행 상태
///
/// 알 수 없는 상태 문자열은 [`ExecutionStatus::Unknown`]으로 역직렬화됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    /// 성공
    Success,
    /// 경고와 함께 성공
    Warn,
    /// 실패
    Failure,
    /// 실행되지 않음
    NotExecuted,
    /// 중단됨
    Stopped,
    /// 일시정지됨
    Paused,
    /// 실행 중
    Running,
    /// 서버가 보낸 알 수 없는 상태
    #[serde(other)]
    Unknown,
}

impl ExecutionStatus {
    /// 모든 알려진 상태 목록
    pub const ALL: [ExecutionStatus; 7] = [
        Self::Success,
        Self::Warn,
        Self::Failure,
        Self::NotExecuted,
        Self::Stopped,
        Self::Paused,
        Self::Running,
    ];

    /// 와이어 형식의 식별자를 반환합니다 (예: `"NOT_EXECUTED"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Warn => "WARN",
            Self::Failure => "FAILURE",
            Self::NotExecuted => "NOT_EXECUTED",
            Self::Stopped => "STOPPED",
            Self::Paused => "PAUSED",
            Self::Running => "RUNNING",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// 더 이상 상태가 바뀌지 않는 종료 상태인지 확인합니다.
    pub fn is_final(&self) -> bool {
        !matches!(self, Self::Running | Self::Paused)
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionStatus {
    type Err = ();

    /// 대소문자를 구분하지 않고 식별자를 파싱합니다.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == upper)
            .ok_or(())
    }
}

/// 상태 표시 이름 해석기
///
/// 필터 옵션 레이블과 키워드 검색 대상에 사용됩니다.
/// 다른 언어를 지원하려면 이 trait을 구현합니다.
pub trait StatusLabels: Send + Sync {
    /// 상태의 표시 이름을 반환합니다.
    fn label(&self, status: ExecutionStatus) -> String;
}

/// 기본 영어 레이블
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishStatusLabels;

impl StatusLabels for EnglishStatusLabels {
    fn label(&self, status: ExecutionStatus) -> String {
        match status {
            ExecutionStatus::Success => "Success",
            ExecutionStatus::Warn => "Warning",
            ExecutionStatus::Failure => "Failure",
            ExecutionStatus::NotExecuted => "Not executed",
            ExecutionStatus::Stopped => "Stopped",
            ExecutionStatus::Paused => "Paused",
            ExecutionStatus::Running => "Running",
            ExecutionStatus::Unknown => "Unknown",
        }
        .to_owned()
    }
}

/// 캠페인 실행에 대한 역참조
///
/// 조회 전용이며 캠페인 실행을 소유하지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignReportRef {
    /// 캠페인 ID
    pub campaign_id: i64,
    /// 캠페인 이름
    pub campaign_name: String,
    /// 캠페인 실행 ID
    pub execution_id: i64,
}

impl CampaignReportRef {
    /// 캠페인 실행 화면으로 이동하는 경로를 만듭니다.
    ///
    /// `/campaign/{campaignId}/executions?open={executionId}&active={executionId}`
    pub fn execution_link(&self) -> String {
        format!(
            "/campaign/{}/executions?open={}&active={}",
            self.campaign_id, self.execution_id, self.execution_id
        )
    }
}

/// 시나리오 또는 캠페인의 과거 실행 한 건
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    /// 실행 ID
    pub execution_id: i64,
    /// 실행 상태
    pub status: ExecutionStatus,
    /// 실행 환경
    #[serde(default)]
    pub environment: String,
    /// 데이터셋 ID
    #[serde(default, alias = "datasetId")]
    pub dataset: Option<String>,
    /// 실행자
    #[serde(default)]
    pub user: String,
    /// 실행 시각
    #[serde(default, with = "crate::time::flexible")]
    pub time: Option<DateTime<Utc>>,
    /// 소요 시간 (밀리초)
    #[serde(default)]
    pub duration: Option<u64>,
    /// 태그 (순서 무관)
    #[serde(default)]
    pub tags: Vec<String>,
    /// 캠페인 실행 역참조
    #[serde(default)]
    pub campaign_report: Option<CampaignReportRef>,
    /// 에러 메시지
    #[serde(default)]
    pub error: Option<String>,
    /// 시나리오 제목
    #[serde(default)]
    pub test_case_title: Option<String>,
}

impl Execution {
    /// 실행이 캠페인에 속해 있으면 캠페인 이름을 반환합니다.
    pub fn campaign_name(&self) -> Option<&str> {
        self.campaign_report
            .as_ref()
            .map(|c| c.campaign_name.as_str())
    }
}

impl fmt::Display for Execution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} [{}] env={} user={}",
            self.execution_id, self.status, self.environment, self.user,
        )
    }
}

/// 순서가 보존되는 key-value 쌍
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    /// 키
    pub key: String,
    /// 값
    pub value: String,
}

impl KeyValue {
    /// 새 쌍을 생성합니다.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// 실행 한 건의 시점별 리포트
///
/// 폴링 응답과 스트림 이벤트는 모두 이 형태로 정규화됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioExecutionReport {
    /// 실행 ID
    pub execution_id: i64,
    /// 실행 상태
    pub status: Option<ExecutionStatus>,
    /// 소요 시간 (밀리초)
    pub duration: Option<u64>,
    /// 시작 시각
    pub start_time: Option<DateTime<Utc>>,
    /// 실행 엔진이 소유하는 단계별 리포트 (구조 불투명)
    pub report: Option<serde_json::Value>,
    /// 실행 환경
    pub environment: Option<String>,
    /// 실행자
    pub user: Option<String>,
    /// 시나리오 제목
    pub test_case_title: Option<String>,
    /// 에러 메시지
    pub error: Option<String>,
    /// 컨텍스트 변수
    pub context_variables: Option<serde_json::Value>,
    /// 데이터셋 상수 (원본 키 순서 유지)
    pub constants: Option<Vec<KeyValue>>,
    /// 데이터셋 테이블 (행 순서와 열 순서 유지)
    pub datatable: Option<Vec<Vec<KeyValue>>>,
}

impl fmt::Display for ScenarioExecutionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = self
            .status
            .map(|s| s.as_str())
            .unwrap_or("-");
        write!(f, "#{} [{}]", self.execution_id, status)?;
        if let Some(duration) = self.duration {
            write!(f, " {duration}ms")?;
        }
        Ok(())
    }
}
