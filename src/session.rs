//! Session gateway
//!
//! Owns the single remote chat session. The handle is created once by
//! [`SessionGateway::start_session`] and reused for every turn; nothing
//! outside the gateway touches it.

pub mod traits;

#[cfg(test)]
pub mod testing;

pub use traits::*;

use crate::llm::{LlmError, LlmErrorKind};
use thiserror::Error;
use uuid::Uuid;

/// Reply substituted when the remote answer carries no text
pub const NO_RESPONSE_TEXT: &str = "No response text found.";

/// Errors surfaced by the gateway
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// Missing or invalid credential; fatal to session start
    #[error("{0}")]
    Configuration(String),
    /// The remote call failed; the user may resend
    #[error("{message}")]
    Transport { kind: LlmErrorKind, message: String },
    /// `send_message` before a successful `start_session`
    #[error("Chat session not initialized. Call start_session first.")]
    Uninitialized,
    #[error("Cannot send an empty message")]
    EmptyMessage,
}

impl From<LlmError> for GatewayError {
    fn from(e: LlmError) -> Self {
        Self::Transport {
            kind: e.kind,
            message: e.message,
        }
    }
}

/// The live remote session
pub struct SessionHandle {
    id: Uuid,
    model: String,
    remote: Box<dyn RemoteSession>,
    turns: u64,
}

impl SessionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[allow(dead_code)] // Used for logging/debugging
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Number of successful exchanges on this session
    #[allow(dead_code)]
    pub fn turns(&self) -> u64 {
        self.turns
    }
}

/// Gateway between the dispatch controller and the remote assistant
pub struct SessionGateway<A: RemoteAssistant> {
    assistant: A,
    model: String,
    system_prompt: String,
    handle: Option<SessionHandle>,
}

impl<A: RemoteAssistant> SessionGateway<A> {
    pub fn new(assistant: A, model: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            assistant,
            model: model.into(),
            system_prompt: system_prompt.into(),
            handle: None,
        }
    }

    /// Open the remote session. A second call replaces the handle with a
    /// fresh session.
    pub async fn start_session(&mut self) -> Result<&SessionHandle, GatewayError> {
        let remote = match self
            .assistant
            .create_session(&self.model, &self.system_prompt)
            .await
        {
            Ok(remote) => remote,
            Err(e) => {
                tracing::error!(model = %self.model, error = %e, "Failed to start chat session");
                return Err(e);
            }
        };

        if let Some(old) = &self.handle {
            tracing::warn!(session_id = %old.id, "Replacing existing chat session");
        }

        let handle = self.handle.insert(SessionHandle {
            id: Uuid::new_v4(),
            model: self.model.clone(),
            remote,
            turns: 0,
        });
        tracing::info!(session_id = %handle.id, model = %handle.model, "Chat session started");
        Ok(handle)
    }

    /// Send one user turn and return the reply text
    pub async fn send_message(&mut self, text: &str) -> Result<String, GatewayError> {
        let handle = self.handle.as_mut().ok_or(GatewayError::Uninitialized)?;
        if text.trim().is_empty() {
            return Err(GatewayError::EmptyMessage);
        }

        match handle.remote.send(text).await {
            Ok(reply) => {
                handle.turns += 1;
                tracing::debug!(session_id = %handle.id, turn = handle.turns, "Reply received");
                Ok(reply
                    .text
                    .unwrap_or_else(|| NO_RESPONSE_TEXT.to_string()))
            }
            Err(e) => {
                tracing::error!(
                    session_id = %handle.id,
                    kind = e.kind.as_str(),
                    error = %e.message,
                    "Error sending message"
                );
                Err(e.into())
            }
        }
    }

    #[allow(dead_code)]
    pub fn is_started(&self) -> bool {
        self.handle.is_some()
    }

    #[allow(dead_code)]
    pub fn handle(&self) -> Option<&SessionHandle> {
        self.handle.as_ref()
    }
}
