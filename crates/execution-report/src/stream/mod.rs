//! 라이브 리포트 스트림 — 서버 푸시 연결을 취소 가능한 리포트 시퀀스로 변환
//!
//! [`ReportStream`]은 구독마다 전송 연결 하나를 여는 백그라운드 태스크를 소유합니다.
//!
//! # 이벤트 처리
//! - `partial`: 페이로드를 정규화해 리포트 하나를 내보내고 계속 진행
//! - `last`: 정상 완료, 이후 아무것도 내보내지 않음
//! - 연결 실패: [`StreamFailure::Open`] ("Error creating source event")
//! - 전송 실패 또는 `last` 이전의 연결 종료: [`StreamFailure::Transport`] ("Error loading execution")
//!
//! # 자원 해제
//! 전송 연결은 [`TransportGuard`]가 소유하며 태스크가 어떤 경로로 끝나든 drop 시점에 닫힙니다.
//! [`ReportStream::close`]는 태스크 종료(즉 연결 해제)까지 기다린 뒤 반환합니다.
//! 취소 이후에는 리포트도 실패도 소비자에게 전달되지 않습니다.

pub mod sse;
pub mod transport;
pub mod view;

use std::pin::Pin;
use std::task::{Context, Poll};

use chutney_core::metrics as m;
use chutney_core::types::ScenarioExecutionReport;
use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::normalize::normalize_streamed;
use transport::{EventSource, EventSourceConnector};

/// 진행 중 리포트 이벤트 이름
pub const PARTIAL_EVENT: &str = "partial";

/// 종료 이벤트 이름
pub const LAST_EVENT: &str = "last";

/// 라이브 스트림의 종료 실패
///
/// 사용자에게 보여줄 메시지는 `Display`로, 원인은 [`reason`](Self::reason)으로 얻습니다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamFailure {
    /// 연결을 열지 못함
    #[error("Error creating source event")]
    Open {
        /// 원인
        reason: String,
    },

    /// 연결 도중 전송 계층 실패
    #[error("Error loading execution")]
    Transport {
        /// 원인
        reason: String,
    },
}

impl StreamFailure {
    /// 실패 원인을 반환합니다.
    pub fn reason(&self) -> &str {
        match self {
            Self::Open { reason } | Self::Transport { reason } => reason,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Open { .. } => "open",
            Self::Transport { .. } => "transport",
        }
    }
}

/// 스트림 항목: 리포트 스냅샷 또는 종료 실패
pub type StreamItem = Result<ScenarioExecutionReport, StreamFailure>;

/// 취소 가능한 라이브 리포트 시퀀스
///
/// `futures::Stream`으로 소비합니다. `None`은 정상 완료, 실패 직후, 또는 취소를 뜻합니다.
/// drop하면 태스크에 취소를 알리고, 연결은 태스크가 곧바로 닫습니다.
/// 반환 전에 연결 해제를 보장하려면 [`close`](Self::close)를 호출합니다.
pub struct ReportStream {
    url: String,
    rx: mpsc::Receiver<StreamItem>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ReportStream {
    /// 연결을 열고 이벤트 처리 태스크를 시작합니다.
    ///
    /// tokio 런타임 안에서 호출해야 합니다.
    pub fn open<C>(connector: C, url: impl Into<String>, capacity: usize) -> Self
    where
        C: EventSourceConnector,
    {
        let url = url.into();
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let cancel = CancellationToken::new();

        metrics::counter!(m::REPORT_STREAMS_OPENED_TOTAL).increment(1);
        let task = tokio::spawn(run(connector, url.clone(), tx, cancel.clone()));

        Self {
            url,
            rx,
            cancel,
            task: Some(task),
        }
    }

    /// 구독 중인 URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// 취소되었는지 확인합니다.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// 구독을 취소합니다. 이후 이 스트림은 아무것도 내보내지 않습니다.
    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            metrics::counter!(m::REPORT_STREAM_CANCELLATIONS_TOTAL).increment(1);
            debug!(url = %self.url, "report stream cancelled");
        }
        self.cancel.cancel();
    }

    /// 구독을 취소하고 전송 연결이 닫힐 때까지 기다립니다.
    pub async fn close(mut self) {
        self.cancel();
        self.rx.close();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(url = %self.url, error = %e, "report stream task ended abnormally");
            }
        }
    }
}

impl Stream for ReportStream {
    type Item = StreamItem;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.cancel.is_cancelled() {
            return Poll::Ready(None);
        }
        self.rx.poll_recv(cx)
    }
}

impl Drop for ReportStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for ReportStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportStream")
            .field("url", &self.url)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

/// 전송 연결 소유자. drop 시 연결을 닫습니다.
struct TransportGuard<S: EventSource> {
    source: S,
}

impl<S: EventSource> TransportGuard<S> {
    fn new(source: S) -> Self {
        metrics::gauge!(m::REPORT_STREAMS_ACTIVE).increment(1.0);
        Self { source }
    }
}

impl<S: EventSource> Drop for TransportGuard<S> {
    fn drop(&mut self) {
        self.source.close();
        metrics::gauge!(m::REPORT_STREAMS_ACTIVE).decrement(1.0);
    }
}

async fn run<C>(
    connector: C,
    url: String,
    tx: mpsc::Sender<StreamItem>,
    cancel: CancellationToken,
) where
    C: EventSourceConnector,
{
    let connected = tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        result = connector.connect(&url) => result,
    };

    let source = match connected {
        Ok(source) => source,
        Err(e) => {
            let failure = StreamFailure::Open {
                reason: e.to_string(),
            };
            warn!(url = %url, reason = failure.reason(), "failed to open report stream");
            deliver(&tx, &cancel, Err(failure)).await;
            return;
        }
    };

    // 이 지점 이후 모든 반환 경로에서 연결이 닫힙니다
    let mut guard = TransportGuard::new(source);
    debug!(url = %url, "report stream opened");

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(url = %url, "report stream task stopping on cancellation");
                return;
            }
            next = guard.source.next_event() => next,
        };

        match next {
            Some(Ok(event)) => {
                metrics::counter!(m::REPORT_STREAM_EVENTS_TOTAL, m::LABEL_EVENT => event_label(&event.event))
                    .increment(1);
                match event.event.as_str() {
                    PARTIAL_EVENT => {
                        let report = serde_json::from_str(&event.data)
                            .map_err(|e| e.to_string())
                            .and_then(|value| normalize_streamed(value).map_err(|e| e.to_string()));
                        match report {
                            Ok(report) => {
                                if !deliver(&tx, &cancel, Ok(report)).await {
                                    return;
                                }
                            }
                            Err(reason) => {
                                metrics::counter!(m::REPORT_DECODE_ERRORS_TOTAL).increment(1);
                                warn!(url = %url, reason = %reason, "skipping undecodable partial report");
                            }
                        }
                    }
                    LAST_EVENT => {
                        info!(url = %url, "report stream completed");
                        return;
                    }
                    other => debug!(url = %url, event = other, "ignoring unexpected event"),
                }
            }
            Some(Err(e)) => {
                fail(&tx, &cancel, &url, e.to_string()).await;
                return;
            }
            None => {
                fail(&tx, &cancel, &url, "connection closed before completion".to_owned()).await;
                return;
            }
        }
    }
}

async fn fail(
    tx: &mpsc::Sender<StreamItem>,
    cancel: &CancellationToken,
    url: &str,
    reason: String,
) {
    let failure = StreamFailure::Transport { reason };
    warn!(url, reason = failure.reason(), "report stream failed");
    deliver(tx, cancel, Err(failure)).await;
}

/// 항목을 소비자에게 전달합니다. 취소되었거나 수신 측이 닫혔으면 `false`를 반환합니다.
async fn deliver(
    tx: &mpsc::Sender<StreamItem>,
    cancel: &CancellationToken,
    item: StreamItem,
) -> bool {
    if let Err(failure) = &item {
        metrics::counter!(m::REPORT_STREAM_FAILURES_TOTAL, m::LABEL_FAILURE => failure.kind())
            .increment(1);
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        sent = tx.send(item) => sent.is_ok(),
    }
}

fn event_label(event: &str) -> &'static str {
    match event {
        PARTIAL_EVENT => PARTIAL_EVENT,
        LAST_EVENT => LAST_EVENT,
        _ => "other",
    }
}
