//! Presentation view model
//!
//! Everything the page needs to draw the transcript, derived from a
//! [`ConversationState`] snapshot. Message text is rendered from markdown
//! to HTML here so the page only inserts markup.

use crate::conversation::{ConversationState, Message, MessageId, Sender};
use chrono::{DateTime, Utc};
use pulldown_cmark::{html, CowStr, Event, Options, Parser};
use serde::Serialize;

/// Render markdown to HTML. Raw HTML in the source is escaped, not passed
/// through.
pub fn render_markdown(text: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let parser = Parser::new_ext(text, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(pulldown_cmark::Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(pulldown_cmark::Tag::Link {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        other => other,
    });

    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Drop script-capable link targets
fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    let lower = url.trim_start().to_ascii_lowercase();
    if lower.starts_with("javascript:") || lower.starts_with("vbscript:") || lower.starts_with("data:") {
        CowStr::Borrowed("#")
    } else {
        url
    }
}

/// One rendered transcript bubble
#[derive(Debug, Clone, Serialize)]
pub struct MessageView {
    pub id: MessageId,
    pub sender: Sender,
    pub text: String,
    pub html: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Message> for MessageView {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id(),
            sender: message.sender(),
            text: message.text().to_string(),
            html: render_markdown(message.text()),
            created_at: message.created_at(),
        }
    }
}

/// Full page view
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptView {
    pub messages: Vec<MessageView>,
    /// Show the "assistant is composing" indicator
    pub is_awaiting_reply: bool,
    pub is_initializing: bool,
    pub last_error: Option<String>,
    pub can_submit: bool,
}

impl From<&ConversationState> for TranscriptView {
    fn from(state: &ConversationState) -> Self {
        Self {
            messages: state.messages.iter().map(MessageView::from).collect(),
            is_awaiting_reply: state.is_awaiting_reply,
            is_initializing: state.is_initializing,
            last_error: state.last_error.clone(),
            can_submit: state.can_submit(),
        }
    }
}
