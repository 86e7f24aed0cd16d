//! 실행 이력 저장소
//!
//! 한 시나리오(또는 캠페인)의 전체 실행 목록을 보관합니다.
//! 목록은 다시 조회할 때마다 통째로 교체되며, 교체 시 패싯을 다시 도출합니다.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use chutney_core::metrics as m;
use chutney_core::types::{Execution, StatusLabels};
use serde::Serialize;
use tracing::debug;

use crate::facet::Facets;
use crate::filter::matcher::ExecutionMatcher;
use crate::filter::{ExecutionFilter, FilterDate};

/// 과거 실행을 같은 조건으로 다시 실행하기 위한 요청
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayRequest {
    /// 원본 실행 ID
    pub execution_id: i64,
    /// 실행 환경 (비어 있으면 서버 기본값)
    pub environment: Option<String>,
    /// 데이터셋 (비어 있으면 없음)
    pub dataset: Option<String>,
}

/// 실행 이력 저장소
#[derive(Debug, Default)]
pub struct ExecutionHistory {
    executions: Vec<Execution>,
    facets: Facets,
    matcher: ExecutionMatcher,
}

impl ExecutionHistory {
    /// 주어진 평가기로 빈 저장소를 생성합니다.
    pub fn new(matcher: ExecutionMatcher) -> Self {
        Self {
            executions: Vec::new(),
            facets: Facets::default(),
            matcher,
        }
    }

    /// 상태 레이블 해석기와 로컬 시간대로 빈 저장소를 생성합니다.
    pub fn with_labels(labels: Arc<dyn StatusLabels>) -> Self {
        Self::new(ExecutionMatcher::new(labels))
    }

    /// 실행 목록을 교체하고 패싯을 다시 도출합니다.
    pub fn replace(&mut self, executions: Vec<Execution>) {
        self.facets = Facets::derive(&executions, self.matcher.labels());
        self.executions = executions;

        metrics::gauge!(m::HISTORY_EXECUTIONS_LOADED).set(self.executions.len() as f64);
        debug!(
            executions = self.executions.len(),
            environments = self.facets.environments.len(),
            tags = self.facets.tags.len(),
            "execution history replaced"
        );
    }

    pub fn executions(&self) -> &[Execution] {
        &self.executions
    }

    pub fn facets(&self) -> &Facets {
        &self.facets
    }

    pub fn matcher(&self) -> &ExecutionMatcher {
        &self.matcher
    }

    pub fn len(&self) -> usize {
        self.executions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executions.is_empty()
    }

    /// 필터를 만족하는 실행을 원래 순서대로 반환합니다.
    pub fn filtered(&self, filter: &ExecutionFilter) -> Vec<&Execution> {
        self.executions
            .iter()
            .filter(|execution| self.matcher.matches(execution, filter))
            .collect()
    }

    /// ID로 실행을 찾습니다.
    pub fn find(&self, execution_id: i64) -> Option<&Execution> {
        self.executions
            .iter()
            .find(|execution| execution.execution_id == execution_id)
    }

    /// 주어진 날짜에 실행이 하나라도 있는지 확인합니다.
    pub fn has_execution_on(&self, date: FilterDate) -> bool {
        self.executions
            .iter()
            .any(|execution| self.matcher.matches_date(execution, date))
    }

    /// 주어진 날짜에 실행이 하나도 없는지 확인합니다. 날짜 선택기의 비활성 날짜 판정에 쓰입니다.
    pub fn no_execution_at(&self, date: FilterDate) -> bool {
        !self.has_execution_on(date)
    }

    /// 실행이 있었던 로컬 날짜 목록
    pub fn execution_dates(&self) -> BTreeSet<NaiveDate> {
        self.executions
            .iter()
            .filter_map(|execution| self.matcher.local_date(execution))
            .collect()
    }

    /// 캠페인에 속한 실행이면 캠페인 실행 화면 경로를 반환합니다.
    pub fn campaign_link(&self, execution_id: i64) -> Option<String> {
        self.find(execution_id)?
            .campaign_report
            .as_ref()
            .map(|campaign| campaign.execution_link())
    }

    /// 과거 실행의 재실행 요청을 만듭니다.
    pub fn replay_request(&self, execution_id: i64) -> Option<ReplayRequest> {
        self.find(execution_id).map(ReplayRequest::from)
    }
}

impl From<&Execution> for ReplayRequest {
    fn from(execution: &Execution) -> Self {
        let non_empty = |value: &str| (!value.is_empty()).then(|| value.to_owned());
        Self {
            execution_id: execution.execution_id,
            environment: non_empty(&execution.environment),
            dataset: execution.dataset.as_deref().and_then(non_empty),
        }
    }
}
