//! Embedded static assets
//!
//! In debug builds rust-embed reads from `ui/` on disk, so page edits show
//! up without a rebuild.

use axum::{
    extract::Path,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use rust_embed::Embed;

#[derive(Embed)]
#[folder = "ui"]
struct Assets;

/// Serve a file from the embedded `ui/` folder
pub async fn serve_static(Path(path): Path<String>) -> Response {
    match Assets::get(&path) {
        Some(content) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            (
                [(header::CONTENT_TYPE, mime.as_ref().to_string())],
                content.data.into_owned(),
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

/// Serve the chat page
pub async fn serve_index() -> Response {
    let page = Assets::get("index.html")
        .and_then(|content| String::from_utf8(content.data.into_owned()).ok());
    match page {
        Some(html) => Html(html).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Html("<h1>404 - chat page not found</h1>".to_string()),
        )
            .into_response(),
    }
}
