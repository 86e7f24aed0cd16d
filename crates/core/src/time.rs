//! 타임스탬프 디코딩
//!
//! 서버는 실행 시각을 여러 형식으로 내려보냅니다.
//! - RFC 3339 (오프셋 포함): `2024-01-15T12:00:00.123Z`
//! - 오프셋 없는 ISO 날짜-시간: `2024-01-15T12:00:00` (브라우저 `Date`와 같이 로컬 시간대로 해석)
//! - epoch 밀리초 숫자: `1705320000000`
//!
//! 해석할 수 없는 값은 에러 대신 `None`이 됩니다.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;

/// 오프셋 없는 ISO 날짜-시간 형식 목록
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// 문자열 타임스탬프를 UTC 시각으로 변환합니다.
pub fn parse_timestamp_str(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            // DST 경계의 모호한 시각은 이른 쪽을 선택합니다
            return Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc));
        }
    }

    None
}

/// epoch 밀리초를 UTC 시각으로 변환합니다.
pub fn from_epoch_millis(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

/// JSON 값에서 타임스탬프를 추출합니다.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp_str(s),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(from_epoch_millis),
        _ => None,
    }
}

/// `Option<DateTime<Utc>>` 필드용 serde 어댑터
///
/// 역직렬화는 [`parse_timestamp`] 규칙을 따르고, 직렬화는 RFC 3339를 사용합니다.
pub mod flexible {
    use super::*;

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(parse_timestamp))
    }
}
