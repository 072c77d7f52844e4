//! HTTP request handlers

use super::assets::{serve_index, serve_static};
use super::sse::{sse_stream, SseEvent};
use super::types::{ChatRequest, ChatResponse, ErrorResponse, VersionResponse};
use super::AppState;
use crate::dispatch::TurnOutcome;
use crate::render::TranscriptView;
use crate::session::RemoteAssistant;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Longest accepted user message, in characters
const MAX_MESSAGE_CHARS: usize = 32_000;

/// Create the API router
pub fn create_router<A: RemoteAssistant + 'static>(state: AppState<A>) -> Router {
    Router::new()
        .route("/", get(serve_index))
        .route("/assets/*path", get(serve_static))
        .route("/api/conversation", get(get_conversation::<A>))
        .route("/api/chat", post(send_chat::<A>))
        .route("/api/stream", get(stream_conversation::<A>))
        .route("/version", get(get_version::<A>))
        .with_state(state)
}

async fn get_conversation<A: RemoteAssistant + 'static>(
    State(state): State<AppState<A>>,
) -> Json<TranscriptView> {
    Json(state.controller.observe(|s| TranscriptView::from(s)))
}

async fn send_chat<A: RemoteAssistant + 'static>(
    State(state): State<AppState<A>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if req.text.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::BadRequest(format!(
            "Message exceeds {MAX_MESSAGE_CHARS} characters"
        )));
    }

    match state.controller.begin(&req.text) {
        Ok(turn) => {
            // The reply arrives over the event stream
            tokio::spawn(async move {
                match turn.complete().await {
                    TurnOutcome::Replied(message) => {
                        tracing::debug!(message_id = %message.id(), "Reply recorded");
                    }
                    TurnOutcome::Failed(e) => {
                        tracing::debug!(error = %e, "Error entry recorded");
                    }
                }
            });
            Ok(Json(ChatResponse {
                accepted: true,
                reason: None,
            }))
        }
        Err(reason) => {
            tracing::debug!(reason = reason.as_str(), "Submission refused");
            Ok(Json(ChatResponse {
                accepted: false,
                reason: Some(reason),
            }))
        }
    }
}

async fn stream_conversation<A: RemoteAssistant + 'static>(
    State(state): State<AppState<A>>,
) -> impl IntoResponse {
    let (view, rx) = state.subscribe();
    sse_stream(SseEvent::Init { view }, rx)
}

async fn get_version<A: RemoteAssistant + 'static>(
    State(state): State<AppState<A>>,
) -> Json<VersionResponse> {
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
        phase: state.controller.phase(),
    })
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
