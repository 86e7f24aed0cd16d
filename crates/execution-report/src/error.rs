//! 실행 리포트 에러 타입
//!
//! [`ExecutionReportError`]는 API 호출, 리포트 정규화, 라이브 스트림에서 발생하는
//! 모든 에러를 표현합니다. `From<ExecutionReportError> for ChutneyError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 전파할 수 있습니다.

use chutney_core::error::{ChutneyError, ClientError, ConfigError, ParseError, StreamError};

use crate::stream::StreamFailure;

/// 실행 리포트 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum ExecutionReportError {
    /// 요청 전송 실패 (연결 거부, 타임아웃 등)
    #[error("{operation} request failed: {reason}")]
    Request {
        /// 호출 종류
        operation: &'static str,
        /// 실패 사유
        reason: String,
    },

    /// 서버가 오류 상태 코드를 반환함
    #[error("{message}")]
    Status {
        /// 호출 종류
        operation: &'static str,
        /// HTTP 상태 코드
        status: u16,
        /// 응답 본문에서 도출한 메시지
        message: String,
    },

    /// 응답 본문 디코딩 실패
    #[error("failed to decode {operation} response: {reason}")]
    Decode {
        /// 호출 종류
        operation: &'static str,
        /// 실패 사유
        reason: String,
    },

    /// 중첩 리포트가 올바른 JSON이 아님
    #[error("malformed report payload: {0}")]
    MalformedReport(String),

    /// 리포트에 필수 필드가 없음
    #[error("report payload is missing '{0}'")]
    MissingField(&'static str),

    /// 서버 기본 URL이 잘못됨
    #[error("invalid base url '{url}': {reason}")]
    InvalidBaseUrl {
        /// 설정된 URL
        url: String,
        /// 실패 사유
        reason: String,
    },

    /// 라이브 스트림 종료 실패
    #[error(transparent)]
    Stream(#[from] StreamFailure),
}

impl ExecutionReportError {
    /// 서버에 도달하지 못한 에러인지 확인합니다.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Request { .. })
    }

    /// HTTP 상태 코드를 반환합니다 (상태 에러인 경우).
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<ExecutionReportError> for ChutneyError {
    fn from(err: ExecutionReportError) -> Self {
        match err {
            ExecutionReportError::Request { operation, reason } => {
                ChutneyError::Client(ClientError::Request(format!("{operation}: {reason}")))
            }
            ExecutionReportError::Status {
                status, message, ..
            } => ChutneyError::Client(ClientError::Status { status, message }),
            ExecutionReportError::Decode { operation, reason } => {
                ChutneyError::Client(ClientError::Decode(format!("{operation}: {reason}")))
            }
            ExecutionReportError::MalformedReport(reason) => ChutneyError::Parse(ParseError::Json {
                field: "report".to_owned(),
                reason,
            }),
            ExecutionReportError::MissingField(field) => {
                ChutneyError::Parse(ParseError::MissingField(field.to_owned()))
            }
            ExecutionReportError::InvalidBaseUrl { url, reason } => {
                ChutneyError::Config(ConfigError::InvalidValue {
                    field: "server.base_url".to_owned(),
                    reason: format!("{url}: {reason}"),
                })
            }
            ExecutionReportError::Stream(failure) => match failure {
                StreamFailure::Open { reason } => ChutneyError::Stream(StreamError::Open(reason)),
                StreamFailure::Transport { reason } => {
                    ChutneyError::Stream(StreamError::Transport(reason))
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_displays_derived_message() {
        let err = ExecutionReportError::Status {
            operation: "stop",
            status: 409,
            message: "Execution already finished".to_owned(),
        };
        assert_eq!(err.to_string(), "Execution already finished");
        assert_eq!(err.status(), Some(409));
        assert!(!err.is_unreachable());
    }

    #[test]
    fn request_error_is_unreachable() {
        let err = ExecutionReportError::Request {
            operation: "find_scenario_executions",
            reason: "connection refused".to_owned(),
        };
        assert!(err.is_unreachable());
        let top: ChutneyError = err.into();
        assert!(matches!(top, ChutneyError::Client(ClientError::Request(_))));
    }

    #[test]
    fn stream_failure_keeps_user_facing_message() {
        let err: ExecutionReportError = StreamFailure::Transport {
            reason: "connection reset".to_owned(),
        }
        .into();
        assert_eq!(err.to_string(), "Error loading execution");

        let top: ChutneyError = err.into();
        assert!(matches!(top, ChutneyError::Stream(StreamError::Transport(_))));
    }

    #[test]
    fn malformed_report_converts_to_parse_error() {
        let top: ChutneyError = ExecutionReportError::MalformedReport("eof".to_owned()).into();
        assert!(matches!(top, ChutneyError::Parse(ParseError::Json { .. })));
    }
}
