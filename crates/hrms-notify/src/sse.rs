//! SSE parser for the notification push stream.
//!
//! # Design
//! - Accept partial chunks and emit complete frames when a blank line is received.
//! - Byte chunks may split a multi-byte character; the tail is carried over
//!   to the next chunk instead of being decoded lossily.
//! - Decode JSON payloads into [`PushFrame`]s, otherwise keep the raw text
//!   in the error for logging.

use hrms_api_models::PushFrame;
use thiserror::Error;

/// Parsed SSE frame with decoded metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SseFrame {
    /// Optional event name.
    pub event: Option<String>,
    /// Optional event id.
    pub id: Option<String>,
    /// Optional retry hint in milliseconds.
    pub retry: Option<u64>,
    /// Concatenated data payload.
    pub data: String,
}

impl SseFrame {
    fn is_empty(&self) -> bool {
        self.event.is_none() && self.id.is_none() && self.retry.is_none() && self.data.is_empty()
    }

    /// Numeric event id, when the server sent one.
    #[must_use]
    pub fn numeric_id(&self) -> Option<i64> {
        self.id.as_deref().and_then(|id| id.trim().parse().ok())
    }
}

/// Incremental SSE parser for streamed chunks.
#[derive(Debug, Default)]
pub struct SseParser {
    line: String,
    pending_cr: bool,
    partial: Vec<u8>,
    builder: FrameBuilder,
}

impl SseParser {
    /// Feed a text chunk and collect every frame it completes.
    pub fn push(&mut self, chunk: &str) -> Vec<SseFrame> {
        let mut frames = Vec::new();
        for ch in chunk.chars() {
            if self.pending_cr {
                self.pending_cr = false;
                if ch == '\n' {
                    continue;
                }
            }
            match ch {
                '\n' => self.finish_line(&mut frames),
                '\r' => {
                    self.pending_cr = true;
                    self.finish_line(&mut frames);
                }
                _ => self.line.push(ch),
            }
        }
        frames
    }

    /// Feed a raw byte chunk from the network.
    pub fn push_bytes(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.partial.extend_from_slice(chunk);
        let ready_len = match std::str::from_utf8(&self.partial) {
            Ok(_) => self.partial.len(),
            Err(err) if err.error_len().is_none() => err.valid_up_to(),
            Err(_) => self.partial.len(),
        };
        let tail = self.partial.split_off(ready_len);
        let ready = std::mem::replace(&mut self.partial, tail);
        self.push(&String::from_utf8_lossy(&ready))
    }

    /// Flush the last frame when the stream ends without a blank line.
    pub fn finish(&mut self) -> Option<SseFrame> {
        if !self.partial.is_empty() {
            let rest = std::mem::take(&mut self.partial);
            self.line.push_str(&String::from_utf8_lossy(&rest));
        }
        if !self.line.is_empty() {
            self.finish_line(&mut Vec::new());
        }
        self.builder.take_frame()
    }

    fn finish_line(&mut self, frames: &mut Vec<SseFrame>) {
        let line = std::mem::take(&mut self.line);
        if line.is_empty() {
            if let Some(frame) = self.builder.take_frame() {
                frames.push(frame);
            }
            return;
        }
        if line.starts_with(':') {
            return;
        }
        let (field, value) = line
            .split_once(':')
            .map_or((line.as_str(), ""), |(field, value)| {
                (field, value.strip_prefix(' ').unwrap_or(value))
            });
        self.builder.apply_field(field, value);
    }
}

/// Frame whose payload is not a push event or error report.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("undecodable push frame (id {id:?}): {data}")]
pub struct SseDecodeError {
    /// Optional event id for the frame.
    pub id: Option<String>,
    /// Raw payload data.
    pub data: String,
}

/// Decode an SSE frame's JSON payload.
///
/// # Errors
///
/// Returns [`SseDecodeError`] for empty payloads and for JSON that is
/// neither an event nor an `{"error": ...}` report.
pub fn decode_frame(frame: &SseFrame) -> Result<PushFrame, SseDecodeError> {
    let data = frame.data.trim();
    if data.is_empty() {
        return Err(SseDecodeError {
            id: frame.id.clone(),
            data: String::new(),
        });
    }
    serde_json::from_str::<PushFrame>(data).map_err(|_| SseDecodeError {
        id: frame.id.clone(),
        data: frame.data.clone(),
    })
}

#[derive(Debug, Default)]
struct FrameBuilder {
    event: Option<String>,
    id: Option<String>,
    retry: Option<u64>,
    data: String,
}

impl FrameBuilder {
    fn apply_field(&mut self, field: &str, value: &str) {
        match field {
            "event" => self.event = Some(value.to_string()),
            "id" => self.id = Some(value.to_string()),
            "retry" => self.retry = value.trim().parse::<u64>().ok(),
            "data" => {
                if !self.data.is_empty() {
                    self.data.push('\n');
                }
                self.data.push_str(value);
            }
            _ => {}
        }
    }

    fn take_frame(&mut self) -> Option<SseFrame> {
        let frame = SseFrame {
            event: self.event.take(),
            id: self.id.take(),
            retry: self.retry.take(),
            data: std::mem::take(&mut self.data),
        };
        if frame.is_empty() { None } else { Some(frame) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hrms_api_models::NotificationId;

    #[test]
    fn parser_emits_frames_on_blank_lines() {
        let mut parser = SseParser::default();
        let frames = parser.push("event: note\ndata: hello\n\nid: 42\ndata: world\n\n");
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].event.as_deref(), Some("note"));
        assert_eq!(frames[0].data, "hello");
        assert_eq!(frames[1].numeric_id(), Some(42));
        assert_eq!(frames[1].data, "world");
    }

    #[test]
    fn parser_handles_crlf_comments_and_retry() {
        let mut parser = SseParser::default();
        let frames = parser.push(": keep-alive\r\nretry: 5000\r\ndata: a\r\ndata: b\r\n\r\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].retry, Some(5000));
        assert_eq!(frames[0].data, "a\nb");
    }

    #[test]
    fn frames_survive_arbitrary_chunk_boundaries() {
        let mut parser = SseParser::default();
        assert!(parser.push("da").is_empty());
        assert!(parser.push("ta: {\"id\":").is_empty());
        let frames = parser.push(" 1}\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "{\"id\": 1}");
    }

    #[test]
    fn split_multibyte_characters_are_reassembled() {
        let mut parser = SseParser::default();
        let payload = "data: caf\u{e9}\n\n".as_bytes();
        let split = payload.len() - 3;
        assert!(parser.push_bytes(&payload[..split]).is_empty());
        let frames = parser.push_bytes(&payload[split..]);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "caf\u{e9}");
    }

    #[test]
    fn finish_flushes_unterminated_frame() {
        let mut parser = SseParser::default();
        assert!(parser.push("data: tail").is_empty());
        let frame = parser.finish().expect("pending frame");
        assert_eq!(frame.data, "tail");
        assert!(parser.finish().is_none());
    }

    #[test]
    fn decode_frame_maps_events_and_errors() {
        let event = SseFrame {
            data: r#"{"id": 9, "title": "Leave", "message": "Approved", "type": "notification", "created_at": "2024-04-01T10:00:00Z"}"#.into(),
            ..SseFrame::default()
        };
        match decode_frame(&event).expect("event decodes") {
            PushFrame::Event(event) => assert_eq!(event.id, NotificationId::Number(9)),
            PushFrame::Error { .. } => panic!("expected event"),
        }

        let error = SseFrame {
            data: r#"{"error": "Not authenticated"}"#.into(),
            ..SseFrame::default()
        };
        assert!(matches!(
            decode_frame(&error),
            Ok(PushFrame::Error { error }) if error == "Not authenticated"
        ));

        let junk = SseFrame {
            id: Some("3".into()),
            data: "not json".into(),
            ..SseFrame::default()
        };
        let err = decode_frame(&junk).expect_err("junk rejected");
        assert_eq!(err.data, "not json");
    }
}
