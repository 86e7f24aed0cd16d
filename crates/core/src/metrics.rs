//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 크레이트는 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//! 레코더가 설치되지 않은 경우 매크로 호출은 아무 동작도 하지 않습니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `chutney_`
//! - 영역명: `client_`, `report_`, `history_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use chutney_core::metrics;
//! use metrics::counter;
//!
//! counter!(chutney_core::metrics::REPORT_POLLS_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 호출 종류 레이블 키 (list_executions, execute, stop 등)
pub const LABEL_OPERATION: &str = "operation";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

/// 스트림 이벤트 레이블 키 (partial, last, other)
pub const LABEL_EVENT: &str = "event";

/// 스트림 실패 종류 레이블 키 (open, transport)
pub const LABEL_FAILURE: &str = "failure";

// ─── Client 메트릭 ──────────────────────────────────────────────────

/// Client: HTTP 요청 수 (counter, labels: operation, result)
pub const CLIENT_REQUESTS_TOTAL: &str = "chutney_client_requests_total";

/// Client: HTTP 요청 지연 시간 (histogram, 초, label: operation)
pub const CLIENT_REQUEST_DURATION_SECONDS: &str = "chutney_client_request_duration_seconds";

// ─── Execution Report 메트릭 ────────────────────────────────────────

/// Report: 폴링 조회 수 (counter)
pub const REPORT_POLLS_TOTAL: &str = "chutney_report_polls_total";

/// Report: 열린 라이브 스트림 수 (counter)
pub const REPORT_STREAMS_OPENED_TOTAL: &str = "chutney_report_streams_opened_total";

/// Report: 현재 활성 라이브 스트림 수 (gauge)
pub const REPORT_STREAMS_ACTIVE: &str = "chutney_report_streams_active";

/// Report: 수신한 스트림 이벤트 수 (counter, label: event)
pub const REPORT_STREAM_EVENTS_TOTAL: &str = "chutney_report_stream_events_total";

/// Report: 스트림 실패 수 (counter, label: failure)
pub const REPORT_STREAM_FAILURES_TOTAL: &str = "chutney_report_stream_failures_total";

/// Report: 소비자가 취소한 스트림 수 (counter)
pub const REPORT_STREAM_CANCELLATIONS_TOTAL: &str = "chutney_report_stream_cancellations_total";

/// Report: 디코딩에 실패해 건너뛴 리포트 수 (counter)
pub const REPORT_DECODE_ERRORS_TOTAL: &str = "chutney_report_decode_errors_total";

/// Client: 발행된 사용자 알림 수 (counter)
pub const NOTIFICATIONS_PUBLISHED_TOTAL: &str = "chutney_notifications_published_total";

// ─── Execution History 메트릭 ───────────────────────────────────────

/// History: 현재 적재된 실행 수 (gauge)
pub const HISTORY_EXECUTIONS_LOADED: &str = "chutney_history_executions_loaded";

/// History: 필터 평가 횟수 (counter)
pub const HISTORY_FILTER_EVALUATIONS_TOTAL: &str = "chutney_history_filter_evaluations_total";

/// History: 내보낸 쿼리 파라미터 갱신 수 (counter)
pub const HISTORY_QUERY_SYNC_EMITTED_TOTAL: &str = "chutney_history_query_sync_emitted_total";

/// History: 변경 없음으로 건너뛴 내비게이션 수 (counter)
pub const HISTORY_QUERY_SYNC_SKIPPED_TOTAL: &str = "chutney_history_query_sync_skipped_total";

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// HTTP 요청 지연 시간 히스토그램 버킷 (초)
///
/// 5ms ~ 30s 범위 (기본 요청 타임아웃까지)
pub const REQUEST_DURATION_BUCKETS: [f64; 10] =
    [0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0, 30.0];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    // Client
    describe_counter!(
        CLIENT_REQUESTS_TOTAL,
        "Total number of HTTP requests sent to the Chutney server"
    );
    describe_histogram!(
        CLIENT_REQUEST_DURATION_SECONDS,
        "HTTP request latency in seconds"
    );

    // Execution Report
    describe_counter!(
        REPORT_POLLS_TOTAL,
        "Total number of one-shot execution report fetches"
    );
    describe_counter!(
        REPORT_STREAMS_OPENED_TOTAL,
        "Total number of live report streams opened"
    );
    describe_gauge!(
        REPORT_STREAMS_ACTIVE,
        "Number of live report streams currently open"
    );
    describe_counter!(
        REPORT_STREAM_EVENTS_TOTAL,
        "Total number of server-sent events received by event type"
    );
    describe_counter!(
        REPORT_STREAM_FAILURES_TOTAL,
        "Total number of live report streams that failed"
    );
    describe_counter!(
        REPORT_STREAM_CANCELLATIONS_TOTAL,
        "Total number of live report streams cancelled by their consumer"
    );
    describe_counter!(
        NOTIFICATIONS_PUBLISHED_TOTAL,
        "Total number of user notifications published after failed commands"
    );
    describe_counter!(
        REPORT_DECODE_ERRORS_TOTAL,
        "Total number of report payloads skipped because they could not be decoded"
    );

    // Execution History
    describe_gauge!(
        HISTORY_EXECUTIONS_LOADED,
        "Number of executions currently held by the history view"
    );
    describe_counter!(
        HISTORY_FILTER_EVALUATIONS_TOTAL,
        "Total number of execution filter evaluations"
    );
    describe_counter!(
        HISTORY_QUERY_SYNC_EMITTED_TOTAL,
        "Total number of filter changes written back to query parameters"
    );
    describe_counter!(
        HISTORY_QUERY_SYNC_SKIPPED_TOTAL,
        "Total number of navigations skipped because the parameters did not change"
    );
}
