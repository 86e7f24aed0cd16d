//! 단일 리포트 뷰 — 한 번에 하나의 실행만 열어 두는 리포트 보관소
//!
//! 다른 실행을 열면 이전 스트림을 먼저 닫습니다.
//! 뷰를 폐기할 때는 [`ReportView::close`]로 스트림을 명시적으로 해제합니다.

use chutney_core::types::ScenarioExecutionReport;
use futures::StreamExt;
use tracing::debug;

use super::{ReportStream, StreamFailure};

/// 뷰 상태
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    /// 열린 실행 없음
    Idle,
    /// 라이브 스트림 수신 중
    Streaming,
    /// 스트림이 정상 완료됨 (또는 폴링 결과만 표시 중)
    Completed,
    /// 스트림이 실패함
    Failed(StreamFailure),
}

/// [`ReportView::advance`] 결과
#[derive(Debug, Clone, PartialEq)]
pub enum ViewUpdate {
    /// 새 스냅샷이 도착함
    Snapshot,
    /// 스트림이 완료됨
    Completed,
    /// 스트림이 실패함
    Failed(StreamFailure),
    /// 진행 중인 스트림이 없음
    Idle,
}

/// 단일 실행 리포트 뷰
#[derive(Debug)]
pub struct ReportView {
    execution_id: Option<i64>,
    latest: Option<ScenarioExecutionReport>,
    stream: Option<ReportStream>,
    state: ViewState,
}

impl Default for ReportView {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportView {
    /// 빈 뷰를 생성합니다.
    pub fn new() -> Self {
        Self {
            execution_id: None,
            latest: None,
            stream: None,
            state: ViewState::Idle,
        }
    }

    /// 실행의 라이브 스트림을 엽니다. 이전 스트림은 먼저 닫힙니다.
    pub async fn open(&mut self, execution_id: i64, stream: ReportStream) {
        self.close_stream().await;
        debug!(execution_id, url = stream.url(), "report view opened");
        self.execution_id = Some(execution_id);
        self.latest = None;
        self.stream = Some(stream);
        self.state = ViewState::Streaming;
    }

    /// 스트림 없이 폴링 결과를 표시합니다. 이전 스트림은 먼저 닫힙니다.
    pub async fn show(&mut self, report: ScenarioExecutionReport) {
        self.close_stream().await;
        self.execution_id = Some(report.execution_id);
        self.latest = Some(report);
        self.state = ViewState::Completed;
    }

    /// 다음 스트림 항목을 받아 상태를 갱신합니다.
    pub async fn advance(&mut self) -> ViewUpdate {
        let Some(stream) = self.stream.as_mut() else {
            return ViewUpdate::Idle;
        };

        match stream.next().await {
            Some(Ok(report)) => {
                self.latest = Some(report);
                ViewUpdate::Snapshot
            }
            Some(Err(failure)) => {
                self.close_stream().await;
                self.state = ViewState::Failed(failure.clone());
                ViewUpdate::Failed(failure)
            }
            None => {
                self.close_stream().await;
                self.state = ViewState::Completed;
                ViewUpdate::Completed
            }
        }
    }

    /// 열린 실행 ID
    pub fn execution_id(&self) -> Option<i64> {
        self.execution_id
    }

    /// 가장 최근 스냅샷
    pub fn latest(&self) -> Option<&ScenarioExecutionReport> {
        self.latest.as_ref()
    }

    /// 현재 상태
    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// 라이브 스트림이 열려 있는지 확인합니다.
    pub fn is_streaming(&self) -> bool {
        self.stream.is_some()
    }

    /// 스트림을 닫고 뷰를 비웁니다.
    pub async fn close(&mut self) {
        self.close_stream().await;
        self.execution_id = None;
        self.latest = None;
        self.state = ViewState::Idle;
    }

    async fn close_stream(&mut self) {
        if let Some(stream) = self.stream.take() {
            stream.close().await;
        }
    }
}
