//! API request and response types

use crate::dispatch::{InitPhase, RejectReason};
use serde::{Deserialize, Serialize};

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub text: String,
}

/// Response for chat action
///
/// A refused submission is not an HTTP error: nothing changed and the
/// reason says why.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectReason>,
}

/// Response for the health/version endpoint
#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: &'static str,
    pub phase: InitPhase,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
