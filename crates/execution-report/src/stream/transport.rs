//! 서버 푸시 전송 계층 추상화
//!
//! [`EventSourceConnector`] trait이 연결을 열어 [`EventSource`]를 돌려줍니다.
//! 운영 코드는 [`HttpConnector`](reqwest + SSE 디코딩)를 쓰고, 테스트는 스크립트로
//! 만든 메모리 소스로 [`ReportStream`](super::ReportStream)을 구동합니다.
//!
//! ```text
//! ┌──────────────┐  connect(url)   ┌─────────────────────┐
//! │ ReportStream │ ──────────────> │ EventSourceConnector │ (trait)
//! └──────┬───────┘                 └─────────┬───────────┘
//!        │ next_event() / close()            │
//!        ▼                                   ▼
//!   ┌─────────────┐                ┌──────────────────┐
//!   │ EventSource │ (trait) <───── │ HttpEventSource  │ ── reqwest bytes_stream ──> server
//!   └─────────────┘                └──────────────────┘
//! ```

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use chutney_core::error::StreamError;
use futures::StreamExt;
use futures::stream::BoxStream;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use tracing::debug;

use super::sse::{SseDecoder, SseEvent};

/// 열린 서버 푸시 연결
///
/// [`close`](EventSource::close)는 여러 번 호출해도 안전해야 하며,
/// 호출 뒤에는 [`next_event`](EventSource::next_event)가 `None`을 반환해야 합니다.
pub trait EventSource: Send + 'static {
    /// 다음 완성된 이벤트를 기다립니다.
    ///
    /// 서버가 연결을 닫으면 `None`, 전송 계층 실패면 `Some(Err(_))`를 반환합니다.
    fn next_event(
        &mut self,
    ) -> impl Future<Output = Option<Result<SseEvent, StreamError>>> + Send;

    /// 연결을 해제합니다.
    fn close(&mut self);
}

/// [`EventSource`] 연결 생성기
pub trait EventSourceConnector: Send + Sync + 'static {
    /// 생성되는 연결 타입
    type Source: EventSource;

    /// `url`로 연결을 엽니다.
    ///
    /// # Errors
    ///
    /// 연결을 맺지 못하면 `StreamError::Open`을 반환합니다.
    fn connect(&self, url: &str) -> impl Future<Output = Result<Self::Source, StreamError>> + Send;
}

/// 모든 요청에 실어 보내는 자격 증명. 로컬에서 검증하지 않습니다.
#[derive(Clone)]
pub(crate) struct BasicAuth {
    pub(crate) username: String,
    pub(crate) password: Option<String>,
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// HTTP 기반 SSE 커넥터
///
/// 라이브 리포트 연결은 실행이 끝날 때까지 열려 있으므로 전체 요청 타임아웃이 없는
/// 별도 reqwest 클라이언트를 사용합니다.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    client: reqwest::Client,
    auth: Option<BasicAuth>,
}

impl HttpConnector {
    /// 연결 타임아웃을 지정해 커넥터를 생성합니다.
    ///
    /// # Errors
    ///
    /// HTTP 클라이언트를 만들 수 없으면 `StreamError::Open`을 반환합니다.
    pub fn new(connect_timeout: Duration) -> Result<Self, StreamError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| StreamError::Open(format!("failed to build http client: {e}")))?;
        Ok(Self { client, auth: None })
    }

    pub(crate) fn with_auth(mut self, auth: Option<BasicAuth>) -> Self {
        self.auth = auth;
        self
    }
}

impl EventSourceConnector for HttpConnector {
    type Source = HttpEventSource;

    async fn connect(&self, url: &str) -> Result<HttpEventSource, StreamError> {
        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache");
        if let Some(auth) = &self.auth {
            request = request.basic_auth(&auth.username, auth.password.as_ref());
        }

        let response = request
            .send()
            .await
            .map_err(|e| StreamError::Open(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StreamError::Open(format!("server returned HTTP {status}")));
        }

        debug!(url, "event stream connected");
        Ok(HttpEventSource::new(url, response.bytes_stream().boxed()))
    }
}

/// HTTP 응답 본문 위의 SSE 연결
pub struct HttpEventSource {
    url: String,
    body: Option<BoxStream<'static, reqwest::Result<Bytes>>>,
    decoder: SseDecoder,
}

impl HttpEventSource {
    fn new(url: &str, body: BoxStream<'static, reqwest::Result<Bytes>>) -> Self {
        Self {
            url: url.to_owned(),
            body: Some(body),
            decoder: SseDecoder::new(),
        }
    }

    /// 연결된 URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl EventSource for HttpEventSource {
    async fn next_event(&mut self) -> Option<Result<SseEvent, StreamError>> {
        loop {
            if let Some(event) = self.decoder.next_event() {
                return Some(Ok(event));
            }

            let body = self.body.as_mut()?;
            match body.next().await {
                Some(Ok(chunk)) => self.decoder.push(&chunk),
                Some(Err(e)) => {
                    self.close();
                    return Some(Err(StreamError::Transport(e.to_string())));
                }
                None => {
                    self.close();
                    return None;
                }
            }
        }
    }

    fn close(&mut self) {
        if self.body.take().is_some() {
            debug!(url = %self.url, "event stream closed");
        }
        self.decoder.reset();
    }
}
