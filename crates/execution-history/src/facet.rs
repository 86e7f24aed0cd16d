//! 패싯 도출
//!
//! 실행 목록에서 필터 차원별로 서로 다른 값을 처음 등장한 순서대로 모읍니다.
//! 같은 목록에서 두 번 도출하면 항상 같은 결과가 나옵니다.

use std::collections::HashSet;

use chutney_core::types::{Execution, StatusLabels};
use serde::Serialize;

use crate::filter::SelectOption;

/// 필터 차원별 선택 가능한 옵션
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Facets {
    pub status: Vec<SelectOption>,
    pub environments: Vec<SelectOption>,
    pub datasets: Vec<SelectOption>,
    pub executors: Vec<SelectOption>,
    pub campaigns: Vec<SelectOption>,
    pub tags: Vec<SelectOption>,
}

impl Facets {
    /// 실행 목록에서 패싯을 도출합니다.
    ///
    /// - 상태: 표시 이름은 `labels`로 해석
    /// - 데이터셋: 비어 있지 않은 값만
    /// - 캠페인: 캠페인에 속한 실행만
    /// - 태그: 모든 실행의 태그를 펼쳐 중복 제거
    pub fn derive(executions: &[Execution], labels: &dyn StatusLabels) -> Self {
        let mut status = Distinct::default();
        let mut environments = Distinct::default();
        let mut datasets = Distinct::default();
        let mut executors = Distinct::default();
        let mut campaigns = Distinct::default();
        let mut tags = Distinct::default();

        for execution in executions {
            if status.insert(execution.status.as_str()) {
                status.options.push(SelectOption::new(
                    execution.status.as_str(),
                    labels.label(execution.status),
                ));
            }
            environments.push_plain(&execution.environment);
            if let Some(dataset) = execution.dataset.as_deref().filter(|d| !d.is_empty()) {
                datasets.push_plain(dataset);
            }
            executors.push_plain(&execution.user);
            if let Some(campaign) = execution.campaign_name() {
                campaigns.push_plain(campaign);
            }
            for tag in &execution.tags {
                tags.push_plain(tag);
            }
        }

        Self {
            status: status.options,
            environments: environments.options,
            datasets: datasets.options,
            executors: executors.options,
            campaigns: campaigns.options,
            tags: tags.options,
        }
    }

    /// 모든 차원이 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.status.is_empty()
            && self.environments.is_empty()
            && self.datasets.is_empty()
            && self.executors.is_empty()
            && self.campaigns.is_empty()
            && self.tags.is_empty()
    }
}

/// 등장 순서를 유지하는 중복 제거 누적기
#[derive(Default)]
struct Distinct {
    seen: HashSet<String>,
    options: Vec<SelectOption>,
}

impl Distinct {
    fn insert(&mut self, id: &str) -> bool {
        if self.seen.contains(id) {
            return false;
        }
        self.seen.insert(id.to_owned())
    }

    fn push_plain(&mut self, value: &str) {
        if self.insert(value) {
            self.options.push(SelectOption::plain(value));
        }
    }
}
