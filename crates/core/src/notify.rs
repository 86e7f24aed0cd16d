//! 사용자 알림 — 에러 토스트 등 비동기 알림 전달
//!
//! 실행 명령(execute, stop, pause, resume)이 실패하면 클라이언트는 호출자에게
//! 에러를 반환하기 전에 [`NotificationSink`]로 알림을 발행합니다.
//! 화면이 없는 환경에서는 [`TracingSink`]가 로그로 대신 남깁니다.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

/// 알림 수준
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    /// 정보
    Info,
    /// 경고
    Warning,
    /// 에러
    Error,
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// 사용자에게 전달할 알림 한 건
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// 알림 고유 ID
    pub id: String,
    /// 알림 수준
    pub level: NotificationLevel,
    /// 표시할 메시지
    pub message: String,
}

impl Notification {
    /// 지정한 수준의 알림을 생성합니다.
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            level,
            message: message.into(),
        }
    }

    /// 에러 알림을 생성합니다.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, message)
    }

    /// 정보 알림을 생성합니다.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, message)
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)
    }
}

/// 알림 전달 대상
///
/// 발행은 동기적이며 실패하지 않습니다. 전달할 수 없는 알림은 버려집니다.
pub trait NotificationSink: Send + Sync {
    /// 알림을 발행합니다.
    fn publish(&self, notification: Notification);
}

/// tracing 로그로 알림을 기록하는 sink
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn publish(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Info => {
                tracing::info!(id = %notification.id, "{}", notification.message);
            }
            NotificationLevel::Warning => {
                tracing::warn!(id = %notification.id, "{}", notification.message);
            }
            NotificationLevel::Error => {
                tracing::error!(id = %notification.id, "{}", notification.message);
            }
        }
    }
}

/// 채널로 알림을 전달하는 sink
///
/// 수신 측이 가득 찼거나 닫힌 경우 알림은 버려집니다.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<Notification>,
}

impl ChannelSink {
    /// 지정한 용량의 채널과 함께 sink를 생성합니다.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl NotificationSink for ChannelSink {
    fn publish(&self, notification: Notification) {
        if let Err(e) = self.tx.try_send(notification) {
            tracing::debug!(error = %e, "notification dropped");
        }
    }
}

/// 모든 알림을 버리는 sink
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn publish(&self, _notification: Notification) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_ids_are_unique() {
        let a = Notification::error("boom");
        let b = Notification::error("boom");
        assert_ne!(a.id, b.id);
        assert_eq!(a.level, NotificationLevel::Error);
    }

    #[test]
    fn display_includes_level_and_message() {
        let n = Notification::info("execution started");
        assert_eq!(n.to_string(), "[info] execution started");
    }

    #[tokio::test]
    async fn channel_sink_delivers_notifications() {
        let (sink, mut rx) = ChannelSink::new(4);
        sink.publish(Notification::error("failed to stop"));
        let received = rx.recv().await.unwrap();
        assert_eq!(received.message, "failed to stop");
    }

    #[test]
    fn channel_sink_drops_when_full() {
        let (sink, mut rx) = ChannelSink::new(1);
        sink.publish(Notification::error("first"));
        sink.publish(Notification::error("second"));
        assert_eq!(rx.try_recv().unwrap().message, "first");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn null_and_tracing_sinks_accept_anything() {
        NullSink.publish(Notification::error("ignored"));
        TracingSink.publish(Notification::info("logged"));
    }
}
