//! Conversation transcript and UI flags
//!
//! The store is the single source of truth the presentation layer
//! observes. Messages are append-only.

mod message;
mod store;

pub use message::{Message, MessageId, Sender};
pub use store::{ConversationState, ConversationStore, Flag, Observer, StoreEvent};
