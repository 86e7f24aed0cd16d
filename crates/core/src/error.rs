//! 에러 타입 — 도메인별 에러 정의

/// Chutney 클라이언트 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum ChutneyError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// HTTP 호출 에러
    #[error("client error: {0}")]
    Client(#[from] ClientError),

    /// 라이브 리포트 스트림 에러
    #[error("stream error: {0}")]
    Stream(#[from] StreamError),

    /// 페이로드 파싱 에러
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// HTTP 호출 에러
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// 요청 전송 실패 (연결 거부, 타임아웃 등)
    #[error("request failed: {0}")]
    Request(String),

    /// 서버가 오류 상태 코드를 반환함
    #[error("server returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// 응답 본문 디코딩 실패
    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// 라이브 리포트 스트림 에러
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// 연결 생성 실패
    #[error("failed to open event stream: {0}")]
    Open(String),

    /// 전송 계층 실패
    #[error("event stream transport failed: {0}")]
    Transport(String),
}

/// 페이로드 파싱 에러
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// JSON 디코딩 실패
    #[error("invalid json in '{field}': {reason}")]
    Json { field: String, reason: String },

    /// 필수 필드 누락
    #[error("missing field: {0}")]
    MissingField(String),
}
