//! HTTP API and page delivery

mod assets;
mod handlers;
mod sse;
mod types;

pub use handlers::create_router;
pub use sse::SseEvent;

use crate::conversation::{ConversationState, StoreEvent};
use crate::dispatch::ChatController;
use crate::render::{MessageView, TranscriptView};
use crate::session::RemoteAssistant;
use tokio::sync::broadcast;

/// Application state shared across handlers
pub struct AppState<A: RemoteAssistant> {
    pub controller: ChatController<A>,
    pub events: broadcast::Sender<SseEvent>,
}

impl<A: RemoteAssistant> Clone for AppState<A> {
    fn clone(&self) -> Self {
        Self {
            controller: self.controller.clone(),
            events: self.events.clone(),
        }
    }
}

impl<A: RemoteAssistant> AppState<A> {
    /// Wire the controller's store to the SSE broadcast channel
    pub fn new(controller: ChatController<A>) -> Self {
        let (events, _) = broadcast::channel(128);
        let tx = events.clone();
        controller.subscribe(Box::new(move |event: &StoreEvent, state: &ConversationState| {
            let sse = match event {
                StoreEvent::MessageAppended { message } => SseEvent::Message {
                    message: MessageView::from(message),
                },
                StoreEvent::FlagChanged { .. } => SseEvent::Flags {
                    is_initializing: state.is_initializing,
                    is_awaiting_reply: state.is_awaiting_reply,
                    can_submit: state.can_submit(),
                },
                StoreEvent::ErrorChanged { error } => SseEvent::Error {
                    error: error.clone(),
                },
            };
            // No subscribers is fine
            let _ = tx.send(sse);
        }));
        Self { controller, events }
    }

    /// Current view plus a receiver for every mutation after it
    pub fn subscribe(&self) -> (TranscriptView, broadcast::Receiver<SseEvent>) {
        self.controller
            .observe(|state| (TranscriptView::from(state), self.events.subscribe()))
    }
}
