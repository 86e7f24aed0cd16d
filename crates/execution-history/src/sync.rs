//! 필터 폼과 쿼리 파라미터의 양방향 동기화
//!
//! 하나의 백그라운드 태스크가 필터 폼을 소유합니다.
//!
//! ```text
//! navigate(params) --> 폼 재구성 ----+
//!                                    +--> 디바운스 --> to_query_params --> 내비게이션 요청 (mpsc)
//! edit(filter)     --> 폼 교체 ------+
//! ```
//!
//! - 디바운스 구간 안의 연속 편집은 마지막 값 하나로 합쳐집니다.
//! - `skip_unchanged_navigation`이 켜져 있으면 직렬화 결과가 현재 URL 파라미터와
//!   같을 때 내비게이션 요청을 내보내지 않습니다. 비교는 정규화된 필터 키끼리만 합니다.

use std::sync::Arc;
use std::time::Duration;

use chutney_core::config::HistoryConfig;
use chutney_core::metrics as m;
use chutney_core::types::StatusLabels;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::filter::ExecutionFilter;
use crate::filter::query::{QueryParams, from_query_params, to_query_params};

/// 명령 채널 용량
const COMMAND_CHANNEL_CAPACITY: usize = 32;

/// 내비게이션 요청 채널 용량
const NAVIGATION_CHANNEL_CAPACITY: usize = 8;

/// 동기화 태스크가 이미 종료됨
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("filter synchronizer has stopped")]
pub struct SyncStopped;

enum SyncCommand {
    Navigate(QueryParams),
    Edit(ExecutionFilter),
}

/// 필터 동기화 설정
#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    /// 마지막 변경 후 내비게이션 요청까지의 대기 시간
    pub debounce: Duration,
    /// 변하지 않은 파라미터의 내비게이션 생략 여부
    pub skip_unchanged: bool,
}

impl From<&HistoryConfig> for SyncOptions {
    fn from(config: &HistoryConfig) -> Self {
        Self {
            debounce: config.debounce(),
            skip_unchanged: config.skip_unchanged_navigation,
        }
    }
}

/// 필터 동기화 핸들
///
/// 핸들을 드롭하면 태스크가 취소됩니다.
/// 종료를 기다리려면 [`FilterSync::shutdown`]을 호출합니다.
pub struct FilterSync {
    commands: mpsc::Sender<SyncCommand>,
    filter: watch::Receiver<ExecutionFilter>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl FilterSync {
    /// 현재 URL 파라미터로 동기화 태스크를 시작합니다.
    ///
    /// 반환되는 수신자로 내비게이션 요청(직렬화된 쿼리 파라미터)이 전달됩니다.
    pub fn spawn(
        initial: QueryParams,
        options: SyncOptions,
        labels: Arc<dyn StatusLabels>,
    ) -> (Self, mpsc::Receiver<QueryParams>) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (navigation_tx, navigation_rx) = mpsc::channel(NAVIGATION_CHANNEL_CAPACITY);
        let form = from_query_params(&initial, labels.as_ref());
        let current = to_query_params(&form);
        let (filter_tx, filter_rx) = watch::channel(form);
        let cancel = CancellationToken::new();

        let worker = SyncWorker {
            current,
            options,
            labels,
            filter: filter_tx,
            navigation: navigation_tx,
        };
        let task = tokio::spawn(worker.run(command_rx, cancel.clone()));

        (
            Self {
                commands: command_tx,
                filter: filter_rx,
                cancel,
                task: Some(task),
            },
            navigation_rx,
        )
    }

    /// 외부 내비게이션으로 바뀐 URL 파라미터를 전달합니다. 필터 폼이 다시 만들어집니다.
    pub async fn navigate(&self, params: QueryParams) -> Result<(), SyncStopped> {
        self.send(SyncCommand::Navigate(params)).await
    }

    /// 사용자가 편집한 필터 폼을 전달합니다.
    pub async fn edit(&self, filter: ExecutionFilter) -> Result<(), SyncStopped> {
        self.send(SyncCommand::Edit(filter)).await
    }

    /// 현재 필터 폼
    pub fn filter(&self) -> ExecutionFilter {
        self.filter.borrow().clone()
    }

    /// 필터 폼 변경을 구독합니다.
    pub fn subscribe(&self) -> watch::Receiver<ExecutionFilter> {
        self.filter.clone()
    }

    /// 태스크를 취소하고 종료를 기다립니다.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "filter sync task ended abnormally");
            }
        }
    }

    async fn send(&self, command: SyncCommand) -> Result<(), SyncStopped> {
        if self.cancel.is_cancelled() {
            return Err(SyncStopped);
        }
        self.commands.send(command).await.map_err(|_| SyncStopped)
    }
}

impl Drop for FilterSync {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct SyncWorker {
    /// 현재 URL 파라미터의 정규화된 필터 키
    current: QueryParams,
    options: SyncOptions,
    labels: Arc<dyn StatusLabels>,
    filter: watch::Sender<ExecutionFilter>,
    navigation: mpsc::Sender<QueryParams>,
}

impl SyncWorker {
    async fn run(mut self, mut commands: mpsc::Receiver<SyncCommand>, cancel: CancellationToken) {
        let mut deadline: Option<Instant> = None;

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    debug!("filter sync cancelled");
                    break;
                }

                command = commands.recv() => {
                    let Some(command) = command else { break };
                    self.apply(command);
                    deadline = Some(Instant::now() + self.options.debounce);
                }

                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    deadline = None;
                    if !self.flush(&cancel).await {
                        break;
                    }
                }
            }
        }
    }

    fn apply(&mut self, command: SyncCommand) {
        let form = match command {
            SyncCommand::Navigate(params) => {
                let form = from_query_params(&params, self.labels.as_ref());
                self.current = to_query_params(&form);
                form
            }
            SyncCommand::Edit(filter) => filter,
        };
        self.filter.send_replace(form);
    }

    /// 현재 폼을 직렬화해 내비게이션 요청을 보냅니다.
    ///
    /// 수신자가 없거나 전송을 기다리는 동안 취소되면 `false`입니다.
    async fn flush(&mut self, cancel: &CancellationToken) -> bool {
        let params = to_query_params(&self.filter.borrow());

        if self.options.skip_unchanged && params == self.current {
            metrics::counter!(m::HISTORY_QUERY_SYNC_SKIPPED_TOTAL).increment(1);
            debug!("query params unchanged, navigation skipped");
            return true;
        }

        self.current = params.clone();
        let sent = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("filter sync cancelled while a navigation was pending");
                return false;
            }
            sent = self.navigation.send(params) => sent,
        };
        if sent.is_err() {
            info!("navigation receiver dropped, stopping filter sync");
            return false;
        }
        metrics::counter!(m::HISTORY_QUERY_SYNC_EMITTED_TOTAL).increment(1);
        true
    }
}
