//! SAMTINK AI - browser chat relayed to a hosted Gemini model
//!
//! Serves a single-page chat UI and keeps one remote chat session per
//! process. Replies arrive over Server-Sent Events.

mod api;
mod config;
mod conversation;
mod dispatch;
mod llm;
mod render;
mod session;

use api::{create_router, AppState};
use config::ChatConfig;
use dispatch::ChatController;
use session::{GeminiAssistant, SessionGateway};
use std::net::SocketAddr;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "samtink_chat=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = ChatConfig::from_env();
    if !config.has_credential() {
        tracing::warn!("No credential configured. Set API_KEY or LLM_GATEWAY.");
    }

    let gateway = SessionGateway::new(
        GeminiAssistant::new(&config),
        config.model.clone(),
        config.system_prompt.clone(),
    );
    let controller = ChatController::new(gateway);
    let state = AppState::new(controller.clone());

    // Start the remote session in the background; the page shows a
    // loading state until it settles
    tokio::spawn(async move {
        let phase = controller.initialize().await;
        tracing::info!(phase = ?phase, "Chat session initialization finished");
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(cors)
        .layer(compression)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(model = %config.model, "SAMTINK AI server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
