//! Server-Sent Events 디코더
//!
//! 바이트 청크를 받아 완성된 이벤트 단위로 잘라냅니다.
//! 청크 경계는 임의의 위치(줄 중간, UTF-8 문자 중간 포함)에 올 수 있습니다.
//!
//! # 지원 필드
//! - `event:` 이벤트 이름 (기본값 `message`)
//! - `data:` 여러 줄이면 `\n`으로 이어 붙임
//! - `id:` 마지막 이벤트 ID
//! - `retry:` 재연결 지연 (밀리초)
//! - `:`로 시작하는 줄은 주석(keep-alive)으로 무시
//!
//! 이름이 지정된 이벤트는 `data` 없이도 전달됩니다 (`last` 같은 종료 신호).

use bytes::{Buf, BytesMut};

/// 기본 이벤트 이름
pub const DEFAULT_EVENT: &str = "message";

/// 디코딩된 이벤트 한 건
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// 이벤트 이름
    pub event: String,
    /// 데이터 (여러 줄은 `\n`으로 연결)
    pub data: String,
    /// 이벤트 ID
    pub id: Option<String>,
    /// 서버가 요청한 재연결 지연 (밀리초)
    pub retry: Option<u64>,
}

impl SseEvent {
    /// 이름과 데이터로 이벤트를 생성합니다.
    pub fn new(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            data: data.into(),
            id: None,
            retry: None,
        }
    }
}

/// 증분 SSE 디코더
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: BytesMut,
    event: Option<String>,
    data: Option<String>,
    id: Option<String>,
    retry: Option<u64>,
}

impl SseDecoder {
    /// 빈 디코더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 수신한 바이트 청크를 버퍼에 추가합니다.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// 완성된 다음 이벤트를 반환합니다.
    ///
    /// 버퍼에 완성된 이벤트가 없으면 `None`을 반환하고, 남은 바이트는 다음 청크를 기다립니다.
    pub fn next_event(&mut self) -> Option<SseEvent> {
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let mut line = self.buf.split_to(pos);
            self.buf.advance(1);
            if line.last() == Some(&b'\r') {
                line.truncate(line.len() - 1);
            }

            if line.is_empty() {
                if let Some(event) = self.dispatch() {
                    return Some(event);
                }
                continue;
            }

            let line = String::from_utf8_lossy(&line);
            self.process_line(&line);
        }
        None
    }

    /// 버퍼에 남은 미완성 이벤트를 버립니다.
    ///
    /// 연결이 끝났을 때 빈 줄로 끝나지 않은 이벤트는 전달하지 않습니다.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.event = None;
        self.data = None;
    }

    /// 아직 처리되지 않은 바이트 수
    pub fn buffered_len(&self) -> usize {
        self.buf.len()
    }

    fn process_line(&mut self, line: &str) {
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_owned()),
            "data" => match &mut self.data {
                Some(data) => {
                    data.push('\n');
                    data.push_str(value);
                }
                None => self.data = Some(value.to_owned()),
            },
            "id" => {
                if !value.contains('\0') {
                    self.id = Some(value.to_owned());
                }
            }
            "retry" => {
                if let Ok(millis) = value.parse::<u64>() {
                    self.retry = Some(millis);
                }
            }
            _ => {}
        }
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        let data = self.data.take();
        if event.is_none() && data.is_none() {
            return None;
        }
        Some(SseEvent {
            event: event
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| DEFAULT_EVENT.to_owned()),
            data: data.unwrap_or_default(),
            id: self.id.clone(),
            retry: self.retry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(input: &[u8]) -> Vec<SseEvent> {
        let mut decoder = SseDecoder::new();
        decoder.push(input);
        std::iter::from_fn(|| decoder.next_event()).collect()
    }

    #[test]
    fn decodes_named_events() {
        let events = decode_all(b"event: partial\ndata: {\"executionId\":1}\n\nevent: last\ndata: done\n\n");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], SseEvent::new("partial", "{\"executionId\":1}"));
        assert_eq!(events[1].event, "last");
    }

    #[test]
    fn unnamed_event_defaults_to_message() {
        let events = decode_all(b"data: hello\n\n");
        assert_eq!(events, vec![SseEvent::new("message", "hello")]);
    }

    #[test]
    fn multi_line_data_is_joined_with_newline() {
        let events = decode_all(b"data: first\ndata: second\n\n");
        assert_eq!(events[0].data, "first\nsecond");
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let events = decode_all(b": keep-alive\n\n\nevent: partial\ndata:x\n\n");
        assert_eq!(events, vec![SseEvent::new("partial", "x")]);
    }

    #[test]
    fn crlf_line_endings_are_accepted() {
        let events = decode_all(b"event: partial\r\ndata: a\r\n\r\n");
        assert_eq!(events, vec![SseEvent::new("partial", "a")]);
    }

    #[test]
    fn named_event_without_data_is_dispatched() {
        let events = decode_all(b"event: last\n\n");
        assert_eq!(events, vec![SseEvent::new("last", "")]);
    }

    #[test]
    fn chunks_split_anywhere_are_reassembled() {
        let input = "event: partial\ndata: {\"title\":\"é\"}\n\n".as_bytes();
        for split in 1..input.len() {
            let mut decoder = SseDecoder::new();
            decoder.push(&input[..split]);
            let early = decoder.next_event();
            decoder.push(&input[split..]);
            let event = early.or_else(|| decoder.next_event()).unwrap();
            assert_eq!(event.data, "{\"title\":\"é\"}", "split at {split}");
        }
    }

    #[test]
    fn incomplete_event_waits_for_terminator() {
        let mut decoder = SseDecoder::new();
        decoder.push(b"event: partial\ndata: x\n");
        assert!(decoder.next_event().is_none());
        decoder.push(b"\n");
        assert!(decoder.next_event().is_some());
    }

    #[test]
    fn id_and_retry_fields_are_tracked() {
        let events = decode_all(b"id: 42\nretry: 3000\nevent: partial\ndata: x\n\n");
        assert_eq!(events[0].id.as_deref(), Some("42"));
        assert_eq!(events[0].retry, Some(3000));
    }

    #[test]
    fn reset_discards_partial_state() {
        let mut decoder = SseDecoder::new();
        decoder.push(b"event: partial\ndata: x");
        assert!(decoder.next_event().is_none());
        decoder.reset();
        assert_eq!(decoder.buffered_len(), 0);
        decoder.push(b"\n\n");
        assert!(decoder.next_event().is_none());
    }
}
