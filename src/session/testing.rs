//! Mock implementations for testing
//!
//! These mocks enable controller and API tests without real I/O.

use super::traits::{RemoteAssistant, RemoteReply, RemoteSession};
use super::GatewayError;
use crate::llm::LlmError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Default)]
struct MockState {
    replies: Mutex<VecDeque<Result<RemoteReply, LlmError>>>,
    /// Texts passed to `send`, in order
    sent: Mutex<Vec<String>>,
    /// (model, system prompt) for every created session
    sessions: Mutex<Vec<(String, String)>>,
    create_error: Mutex<Option<GatewayError>>,
    /// When set, every `send` waits for `release` before replying
    gated: bool,
    request_started: Notify,
    release: Notify,
}

/// Mock assistant that returns queued replies
///
/// Clones share state, so a test can keep one clone for inspection while
/// the gateway owns another.
#[derive(Clone, Default)]
pub struct MockAssistant {
    state: Arc<MockState>,
}

#[allow(dead_code)]
impl MockAssistant {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock whose sends block until [`MockAssistant::release`] is called
    pub fn gated() -> Self {
        Self {
            state: Arc::new(MockState {
                gated: true,
                ..MockState::default()
            }),
        }
    }

    /// Make `create_session` fail with the given error
    pub fn fail_create(self, error: GatewayError) -> Self {
        *self.state.create_error.lock().unwrap() = Some(error);
        self
    }

    pub fn queue_reply(&self, text: impl Into<String>) {
        self.state
            .replies
            .lock()
            .unwrap()
            .push_back(Ok(RemoteReply::text(text)));
    }

    pub fn queue_empty_reply(&self) {
        self.state
            .replies
            .lock()
            .unwrap()
            .push_back(Ok(RemoteReply::default()));
    }

    pub fn queue_error(&self, error: LlmError) {
        self.state.replies.lock().unwrap().push_back(Err(error));
    }

    pub fn sent(&self) -> Vec<String> {
        self.state.sent.lock().unwrap().clone()
    }

    pub fn sessions_created(&self) -> Vec<(String, String)> {
        self.state.sessions.lock().unwrap().clone()
    }

    /// Wait until a gated send has started
    pub async fn wait_for_request(&self) {
        self.state.request_started.notified().await;
    }

    /// Let one gated send complete
    pub fn release(&self) {
        self.state.release.notify_one();
    }
}

#[async_trait]
impl RemoteAssistant for MockAssistant {
    async fn create_session(
        &self,
        model: &str,
        system_prompt: &str,
    ) -> Result<Box<dyn RemoteSession>, GatewayError> {
        if let Some(error) = self.state.create_error.lock().unwrap().clone() {
            return Err(error);
        }
        self.state
            .sessions
            .lock()
            .unwrap()
            .push((model.to_string(), system_prompt.to_string()));
        Ok(Box::new(MockSession {
            state: self.state.clone(),
        }))
    }
}

struct MockSession {
    state: Arc<MockState>,
}

#[async_trait]
impl RemoteSession for MockSession {
    async fn send(&mut self, text: &str) -> Result<RemoteReply, LlmError> {
        self.state.sent.lock().unwrap().push(text.to_string());
        if self.state.gated {
            self.state.request_started.notify_one();
            self.state.release.notified().await;
        }
        self.state
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock reply queued")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_assistant_replays_queue() {
        let mock = MockAssistant::new();
        mock.queue_reply("Hello");

        let mut session = mock.create_session("m", "p").await.unwrap();
        let reply = session.send("Hi").await.unwrap();
        assert_eq!(reply.text.as_deref(), Some("Hello"));

        // Second call should fail (no more replies)
        assert!(session.send("again").await.is_err());
        assert_eq!(mock.sent(), vec!["Hi".to_string(), "again".to_string()]);
    }

    #[tokio::test]
    async fn test_gated_mock_waits_for_release() {
        let mock = MockAssistant::gated();
        mock.queue_reply("late");
        let mut session = mock.create_session("m", "p").await.unwrap();

        let task = tokio::spawn(async move { session.send("Hi").await });
        mock.wait_for_request().await;
        assert!(!task.is_finished());

        mock.release();
        let reply = task.await.unwrap().unwrap();
        assert_eq!(reply.text.as_deref(), Some("late"));
    }
}
