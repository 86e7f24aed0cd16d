//! 설정 관리 — chutney.toml 파싱 및 런타임 설정
//!
//! [`ChutneyConfig`]는 모든 크레이트의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`CHUTNEY_SERVER_BASE_URL=https://chutney.example` 형식)
//! 3. 설정 파일 (`chutney.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), chutney_core::error::ChutneyError> {
//! use chutney_core::config::ChutneyConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = ChutneyConfig::load("chutney.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = ChutneyConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ChutneyError, ConfigError};

/// Chutney 클라이언트 통합 설정
///
/// `chutney.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 크레이트는 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChutneyConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 서버 연결 설정
    #[serde(default)]
    pub server: ServerConfig,
    /// 라이브 리포트 스트림 설정
    #[serde(default)]
    pub stream: StreamConfig,
    /// 실행 이력 필터 설정
    #[serde(default)]
    pub history: HistoryConfig,
}

impl ChutneyConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    /// 3. 유효성 검증
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ChutneyError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ChutneyError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ChutneyError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                ChutneyError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, ChutneyError> {
        toml::from_str(toml_str).map_err(|e| {
            ChutneyError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `CHUTNEY_{SECTION}_{FIELD}`
    /// 예: `CHUTNEY_HISTORY_DEBOUNCE_MS=250`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "CHUTNEY_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "CHUTNEY_GENERAL_LOG_FORMAT");

        // Server
        override_string(&mut self.server.base_url, "CHUTNEY_SERVER_BASE_URL");
        override_u64(
            &mut self.server.request_timeout_secs,
            "CHUTNEY_SERVER_REQUEST_TIMEOUT_SECS",
        );
        override_u64(
            &mut self.server.connect_timeout_secs,
            "CHUTNEY_SERVER_CONNECT_TIMEOUT_SECS",
        );
        override_opt_string(&mut self.server.username, "CHUTNEY_SERVER_USERNAME");
        override_opt_string(&mut self.server.password, "CHUTNEY_SERVER_PASSWORD");

        // Stream
        override_usize(
            &mut self.stream.channel_capacity,
            "CHUTNEY_STREAM_CHANNEL_CAPACITY",
        );

        // History
        override_u64(&mut self.history.debounce_ms, "CHUTNEY_HISTORY_DEBOUNCE_MS");
        override_bool(
            &mut self.history.skip_unchanged_navigation,
            "CHUTNEY_HISTORY_SKIP_UNCHANGED_NAVIGATION",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ChutneyError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        // base_url 검증
        let base_url = self.server.base_url.trim();
        if base_url.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "server.base_url".to_owned(),
                reason: "must not be empty".to_owned(),
            }
            .into());
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "server.base_url".to_owned(),
                reason: "must start with http:// or https://".to_owned(),
            }
            .into());
        }

        if self.server.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.request_timeout_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.server.connect_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.connect_timeout_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.server.password.is_some() && self.server.username.is_none() {
            return Err(ConfigError::InvalidValue {
                field: "server.password".to_owned(),
                reason: "password requires a username".to_owned(),
            }
            .into());
        }

        if self.stream.channel_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "stream.channel_capacity".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.history.debounce_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "history.debounce_ms".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 서버 연결 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Chutney 서버 기본 URL
    pub base_url: String,
    /// 요청 타임아웃 (초). 이벤트 스트림에는 적용되지 않습니다.
    pub request_timeout_secs: u64,
    /// 연결 타임아웃 (초)
    pub connect_timeout_secs: u64,
    /// HTTP basic 인증 사용자명
    pub username: Option<String>,
    /// HTTP basic 인증 비밀번호
    pub password: Option<String>,
}

impl ServerConfig {
    /// 요청 타임아웃을 `Duration`으로 반환합니다.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// 연결 타임아웃을 `Duration`으로 반환합니다.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8081".to_owned(),
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            username: None,
            password: None,
        }
    }
}

/// 라이브 리포트 스트림 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// 스냅샷 채널 용량
    pub channel_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
        }
    }
}

/// 실행 이력 필터 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// 필터 변경 후 쿼리 파라미터로 반영하기까지의 대기 시간 (밀리초)
    pub debounce_ms: u64,
    /// 직렬화 결과가 현재 URL 파라미터와 같으면 내비게이션을 생략
    pub skip_unchanged_navigation: bool,
}

impl HistoryConfig {
    /// 디바운스 윈도우를 `Duration`으로 반환합니다.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            skip_unchanged_navigation: true,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_opt_string(target: &mut Option<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = if val.is_empty() { None } else { Some(val) };
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
