//! Trait abstractions for the remote assistant
//!
//! These traits enable testing the gateway and controller with mock
//! implementations.

use super::GatewayError;
use crate::config::ChatConfig;
use crate::llm::{
    GeminiService, LlmError, LlmMessage, LlmRequest, LlmService, LoggingService, IMPLICIT_KEY,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Reply payload from the remote assistant
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteReply {
    pub text: Option<String>,
}

#[allow(dead_code)]
impl RemoteReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

/// Factory for remote chat sessions
#[async_trait]
pub trait RemoteAssistant: Send + Sync {
    /// Open a session bound to a model and system prompt
    async fn create_session(
        &self,
        model: &str,
        system_prompt: &str,
    ) -> Result<Box<dyn RemoteSession>, GatewayError>;
}

/// A live multi-turn session
#[async_trait]
pub trait RemoteSession: Send {
    /// Send one user turn and wait for the reply
    async fn send(&mut self, text: &str) -> Result<RemoteReply, LlmError>;
}

#[async_trait]
impl<T: RemoteAssistant + ?Sized> RemoteAssistant for Arc<T> {
    async fn create_session(
        &self,
        model: &str,
        system_prompt: &str,
    ) -> Result<Box<dyn RemoteSession>, GatewayError> {
        (**self).create_session(model, system_prompt).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Creates Gemini-backed sessions from the process configuration
pub struct GeminiAssistant {
    api_key: Option<String>,
    gateway: Option<String>,
}

impl GeminiAssistant {
    pub fn new(config: &ChatConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            gateway: config.gateway.clone(),
        }
    }
}

#[async_trait]
impl RemoteAssistant for GeminiAssistant {
    async fn create_session(
        &self,
        model: &str,
        system_prompt: &str,
    ) -> Result<Box<dyn RemoteSession>, GatewayError> {
        // In gateway mode the gateway handles the actual authentication
        let api_key = match (&self.gateway, &self.api_key) {
            (Some(_), _) => IMPLICIT_KEY.to_string(),
            (None, Some(key)) => key.clone(),
            (None, None) => {
                return Err(GatewayError::Configuration(
                    "API_KEY environment variable is not set.".to_string(),
                ))
            }
        };

        let service = GeminiService::new(api_key, model, self.gateway.as_deref())?;
        let service: Arc<dyn LlmService> = Arc::new(LoggingService::new(Arc::new(service)));
        Ok(Box::new(LlmChatSession::new(service, system_prompt)))
    }
}

/// Session that replays its own history on every request
///
/// The Gemini REST API is stateless, so the turn history lives here. A
/// user/model pair is recorded only after a successful exchange, so a
/// failed turn can be resent without duplicating it.
pub struct LlmChatSession {
    service: Arc<dyn LlmService>,
    system_prompt: String,
    history: Vec<LlmMessage>,
}

impl LlmChatSession {
    pub fn new(service: Arc<dyn LlmService>, system_prompt: &str) -> Self {
        Self {
            service,
            system_prompt: system_prompt.to_string(),
            history: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn history(&self) -> &[LlmMessage] {
        &self.history
    }
}

#[async_trait]
impl RemoteSession for LlmChatSession {
    async fn send(&mut self, text: &str) -> Result<RemoteReply, LlmError> {
        let mut messages = self.history.clone();
        messages.push(LlmMessage::user(text));

        let request = LlmRequest {
            system: Some(self.system_prompt.clone()).filter(|s| !s.is_empty()),
            messages,
        };

        let response = self.service.complete(&request).await?;

        self.history.push(LlmMessage::user(text));
        if let Some(reply) = &response.text {
            self.history.push(LlmMessage::assistant(reply.clone()));
        }

        Ok(RemoteReply {
            text: response.text,
        })
    }
}
