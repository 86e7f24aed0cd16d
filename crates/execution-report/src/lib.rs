#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`ExecutionReportError`)
//! - [`normalize`]: Report envelope normalization (polled and streamed variants)
//! - [`stream`]: SSE decoding, transport abstraction, `ReportStream`, `ReportView`
//! - [`client`]: HTTP client for the scenario execution endpoints
//!
//! # Architecture
//!
//! ```text
//! ScenarioExecutionClient
//!     |-- GET  .../execution/{id}/v1 ----> normalize_polled() --> ScenarioExecutionReport
//!     |-- GET  .../executionasync/... --> EventSourceConnector
//!                                             |
//!                                       ReportStream task
//!                                   partial -> normalize_streamed() --mpsc--> consumer
//!                                   last    -> complete (transport closed)
//! ```

pub mod client;
pub mod error;
pub mod normalize;
pub mod stream;

// --- Public API Re-exports ---

pub use client::ScenarioExecutionClient;
pub use error::ExecutionReportError;
pub use normalize::{normalize_polled, normalize_polled_value, normalize_streamed};
pub use stream::sse::{SseDecoder, SseEvent};
pub use stream::transport::{EventSource, EventSourceConnector, HttpConnector, HttpEventSource};
pub use stream::view::{ReportView, ViewState, ViewUpdate};
pub use stream::{ReportStream, StreamFailure};
