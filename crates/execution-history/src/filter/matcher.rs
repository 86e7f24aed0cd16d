//! 실행 조건 평가
//!
//! [`ExecutionMatcher::matches`]는 설정된 조건만 AND로 결합합니다.
//! 설정되지 않은 조건은 항상 참입니다.
//!
//! 키워드 검색 대상 문자열은 다음 순서로 공백 연결됩니다.
//!
//! ```text
//! user env "DD Mon. YYYY HH:mm" executionId statusLabel tags... [campaign] [error]
//! ```

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Utc};
use chutney_core::metrics as m;
use chutney_core::types::{EnglishStatusLabels, Execution, StatusLabels};

use super::{ExecutionFilter, FilterDate, SelectOption};

/// 키워드 검색에 쓰이는 실행 시각 형식
pub const SEARCH_TIME_FORMAT: &str = "%d %b. %Y %H:%M";

/// 실행 시각을 달력 날짜로 바꿀 때 사용하는 시간대
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisplayZone {
    /// 시스템 로컬 시간대
    #[default]
    Local,
    /// 고정 오프셋
    Fixed(FixedOffset),
}

impl DisplayZone {
    /// UTC 시각을 이 시간대의 벽시계 시각으로 변환합니다.
    pub fn to_local(&self, time: &DateTime<Utc>) -> NaiveDateTime {
        match self {
            Self::Local => time.with_timezone(&Local).naive_local(),
            Self::Fixed(offset) => time.with_timezone(offset).naive_local(),
        }
    }
}

/// 실행 조건 평가기
#[derive(Clone)]
pub struct ExecutionMatcher {
    labels: Arc<dyn StatusLabels>,
    zone: DisplayZone,
}

impl std::fmt::Debug for ExecutionMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionMatcher")
            .field("zone", &self.zone)
            .finish_non_exhaustive()
    }
}

impl Default for ExecutionMatcher {
    fn default() -> Self {
        Self::new(Arc::new(EnglishStatusLabels))
    }
}

impl ExecutionMatcher {
    /// 로컬 시간대를 사용하는 평가기를 생성합니다.
    pub fn new(labels: Arc<dyn StatusLabels>) -> Self {
        Self {
            labels,
            zone: DisplayZone::Local,
        }
    }

    /// 날짜 비교와 시각 표시에 사용할 시간대를 지정합니다.
    pub fn with_zone(mut self, zone: DisplayZone) -> Self {
        self.zone = zone;
        self
    }

    pub fn labels(&self) -> &dyn StatusLabels {
        self.labels.as_ref()
    }

    pub fn zone(&self) -> DisplayZone {
        self.zone
    }

    /// 실행이 필터의 모든 조건을 만족하는지 평가합니다.
    pub fn matches(&self, execution: &Execution, filter: &ExecutionFilter) -> bool {
        metrics::counter!(m::HISTORY_FILTER_EVALUATIONS_TOTAL).increment(1);

        self.matches_keyword(execution, filter.keyword.as_deref())
            && contains_id(&filter.status, execution.status.as_str())
            && filter
                .date
                .is_none_or(|date| self.matches_date(execution, date))
            && contains_id(&filter.environments, &execution.environment)
            && (filter.datasets.is_empty()
                || execution
                    .dataset
                    .as_deref()
                    .is_some_and(|dataset| has_id(&filter.datasets, dataset)))
            && contains_id(&filter.executors, &execution.user)
            && (filter.campaigns.is_empty()
                || execution
                    .campaign_name()
                    .is_some_and(|name| has_id(&filter.campaigns, name)))
            && (filter.tags.is_empty()
                || execution.tags.iter().any(|tag| has_id(&filter.tags, tag)))
    }

    /// 키워드 검색 대상 문자열을 만듭니다.
    pub fn search_blob(&self, execution: &Execution) -> String {
        let mut blob = format!(
            "{} {} {} {} {} {} ",
            execution.user,
            execution.environment,
            self.format_time(execution),
            execution.execution_id,
            self.labels.label(execution.status),
            execution.tags.join(" "),
        );
        if let Some(campaign) = execution.campaign_name() {
            blob.push(' ');
            blob.push_str(campaign);
        }
        if let Some(error) = execution.error.as_deref() {
            blob.push(' ');
            blob.push_str(error);
        }
        blob
    }

    /// 실행 시각을 `DD Mon. YYYY HH:mm` 형식으로 표시합니다. 시각이 없으면 빈 문자열입니다.
    pub fn format_time(&self, execution: &Execution) -> String {
        execution
            .time
            .map(|time| {
                self.zone
                    .to_local(&time)
                    .format(SEARCH_TIME_FORMAT)
                    .to_string()
            })
            .unwrap_or_default()
    }

    /// 실행의 로컬 달력 날짜
    pub fn local_date(&self, execution: &Execution) -> Option<NaiveDate> {
        execution.time.map(|time| self.zone.to_local(&time).date())
    }

    /// 실행이 주어진 날짜에 수행되었는지 확인합니다.
    ///
    /// 시각이 없는 실행이나 달력에 없는 날짜는 일치하지 않습니다.
    pub fn matches_date(&self, execution: &Execution, date: FilterDate) -> bool {
        match (date.to_naive(), self.local_date(execution)) {
            (Some(wanted), Some(actual)) => wanted == actual,
            _ => false,
        }
    }

    fn matches_keyword(&self, execution: &Execution, keyword: Option<&str>) -> bool {
        match keyword {
            None | Some("") => true,
            Some(keyword) => self
                .search_blob(execution)
                .to_lowercase()
                .contains(&keyword.to_lowercase()),
        }
    }
}

/// 선택이 비어 있으면 참, 아니면 id 포함 여부
fn contains_id(selected: &[SelectOption], value: &str) -> bool {
    selected.is_empty() || has_id(selected, value)
}

fn has_id(selected: &[SelectOption], value: &str) -> bool {
    selected.iter().any(|option| option.id == value)
}
