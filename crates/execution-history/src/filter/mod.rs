//! 필터 폼 — 실행 이력에 적용할 조건 집합
//!
//! 각 조건은 독립적이며, 비어 있는 조건은 "제약 없음"을 의미합니다.
//!
//! - [`query`]: URL 쿼리 파라미터와의 상호 변환
//! - [`matcher`]: 실행 한 건에 대한 조건 평가

pub mod matcher;
pub mod query;

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 선택 가능한 필터 옵션
///
/// 상태를 제외한 모든 패싯은 원본 값을 `id`와 `label`로 함께 사용합니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectOption {
    /// 비교와 직렬화에 사용하는 식별자
    pub id: String,
    /// 표시 이름
    pub label: String,
}

impl SelectOption {
    /// 새 옵션을 생성합니다.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }

    /// id와 label이 같은 옵션을 생성합니다.
    pub fn plain(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            id: value,
        }
    }
}

/// 필터 날짜 (연, 월, 일)
///
/// 월과 일은 1부터 시작합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl FilterDate {
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }

    /// 달력상 유효한 날짜로 변환합니다. 존재하지 않는 날짜이면 `None`입니다.
    pub fn to_naive(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }
}

impl From<NaiveDate> for FilterDate {
    fn from(date: NaiveDate) -> Self {
        use chrono::Datelike;
        Self::new(date.year(), date.month(), date.day())
    }
}

impl fmt::Display for FilterDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// 실행 이력 필터 폼
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionFilter {
    /// 전문 검색 키워드
    pub keyword: Option<String>,
    /// 실행 날짜 (로컬 달력 기준)
    pub date: Option<FilterDate>,
    pub status: Vec<SelectOption>,
    pub environments: Vec<SelectOption>,
    pub datasets: Vec<SelectOption>,
    pub executors: Vec<SelectOption>,
    pub campaigns: Vec<SelectOption>,
    pub tags: Vec<SelectOption>,
}

impl ExecutionFilter {
    /// 아무 조건도 설정되지 않았는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.keyword.as_deref().is_none_or(str::is_empty)
            && self.date.is_none()
            && self.status.is_empty()
            && self.environments.is_empty()
            && self.datasets.is_empty()
            && self.executors.is_empty()
            && self.campaigns.is_empty()
            && self.tags.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_is_empty() {
        assert!(ExecutionFilter::default().is_empty());
    }

    #[test]
    fn empty_keyword_counts_as_unset() {
        let filter = ExecutionFilter {
            keyword: Some(String::new()),
            ..Default::default()
        };
        assert!(filter.is_empty());
    }

    #[test]
    fn any_facet_makes_filter_non_empty() {
        let filter = ExecutionFilter {
            tags: vec![SelectOption::plain("smoke")],
            ..Default::default()
        };
        assert!(!filter.is_empty());
    }

    #[test]
    fn filter_date_display_is_zero_padded() {
        assert_eq!(FilterDate::new(2024, 1, 5).to_string(), "2024-01-05");
        assert_eq!(FilterDate::new(2024, 12, 31).to_string(), "2024-12-31");
    }

    #[test]
    fn invalid_calendar_date_has_no_naive_form() {
        assert!(FilterDate::new(2023, 2, 29).to_naive().is_none());
        assert!(FilterDate::new(2024, 2, 29).to_naive().is_some());
        assert!(FilterDate::new(2024, 13, 1).to_naive().is_none());
    }
}
