//! Server-Sent Events support

use crate::render::{MessageView, TranscriptView};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Events sent to SSE clients
#[derive(Debug, Clone)]
pub enum SseEvent {
    Init {
        view: TranscriptView,
    },
    Message {
        message: MessageView,
    },
    Flags {
        is_initializing: bool,
        is_awaiting_reply: bool,
        can_submit: bool,
    },
    Error {
        error: Option<String>,
    },
}

/// Convert broadcast stream to SSE stream
pub fn sse_stream(
    init_event: SseEvent,
    broadcast_rx: tokio::sync::broadcast::Receiver<SseEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Create stream that starts with init event then broadcasts
    let init = futures::stream::once(async move { Ok(sse_event_to_axum(init_event)) });

    let broadcasts = BroadcastStream::new(broadcast_rx).filter_map(|result| match result {
        Ok(event) => Some(Ok(sse_event_to_axum(event))),
        Err(e) => {
            // Lagged: the client will be out of sync until it reloads
            tracing::warn!(error = %e, "SSE subscriber lagged");
            None
        }
    });

    let combined = init.chain(broadcasts);

    Sse::new(combined).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn sse_event_to_axum(event: SseEvent) -> Event {
    let (event_type, data) = sse_event_payload(event);
    Event::default().event(event_type).data(data.to_string())
}

fn sse_event_payload(event: SseEvent) -> (&'static str, serde_json::Value) {
    match event {
        SseEvent::Init { view } => (
            "init",
            json!({
                "type": "init",
                "view": view,
            }),
        ),
        SseEvent::Message { message } => (
            "message",
            json!({
                "type": "message",
                "message": message,
            }),
        ),
        SseEvent::Flags {
            is_initializing,
            is_awaiting_reply,
            can_submit,
        } => (
            "flags",
            json!({
                "type": "flags",
                "is_initializing": is_initializing,
                "is_awaiting_reply": is_awaiting_reply,
                "can_submit": can_submit,
            }),
        ),
        SseEvent::Error { error } => (
            "error",
            json!({
                "type": "error",
                "error": error,
            }),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Message;

    #[test]
    fn test_message_payload_carries_rendered_html() {
        let message = MessageView::from(&Message::assistant("**hi**"));
        let (event_type, data) = sse_event_payload(SseEvent::Message { message });
        assert_eq!(event_type, "message");
        assert_eq!(data["message"]["sender"], "assistant");
        assert!(data["message"]["html"]
            .as_str()
            .unwrap()
            .contains("<strong>hi</strong>"));
    }

    #[test]
    fn test_cleared_error_is_null() {
        let (event_type, data) = sse_event_payload(SseEvent::Error { error: None });
        assert_eq!(event_type, "error");
        assert!(data["error"].is_null());
    }
}
