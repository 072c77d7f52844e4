//! Conversation store
//!
//! All mutations go through [`ConversationStore`]. Every mutation that
//! changes state is reported to each observer, synchronously and in the
//! order applied, before the mutating call returns.

use super::message::Message;
use serde::Serialize;

/// Independent UI flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Flag {
    /// Session start has not resolved yet (applies once, at startup)
    Initializing,
    /// A user turn is in flight
    AwaitingReply,
}

/// A single applied mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    MessageAppended { message: Message },
    FlagChanged { flag: Flag, value: bool },
    ErrorChanged { error: Option<String> },
}

/// Snapshot of the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationState {
    pub messages: Vec<Message>,
    pub is_initializing: bool,
    pub is_awaiting_reply: bool,
    pub last_error: Option<String>,
}

impl ConversationState {
    /// Fresh state at application start
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            is_initializing: true,
            is_awaiting_reply: false,
            last_error: None,
        }
    }

    #[allow(dead_code)]
    pub fn flag(&self, flag: Flag) -> bool {
        match flag {
            Flag::Initializing => self.is_initializing,
            Flag::AwaitingReply => self.is_awaiting_reply,
        }
    }

    /// Whether the submit control should be enabled
    pub fn can_submit(&self) -> bool {
        !(self.is_awaiting_reply || self.is_initializing)
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

/// Callback invoked after each applied mutation
pub type Observer = Box<dyn Fn(&StoreEvent, &ConversationState) + Send + Sync>;

/// Single owner of all conversation mutations
#[derive(Default)]
pub struct ConversationStore {
    state: ConversationState,
    observers: Vec<Observer>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer. It sees only mutations applied after
    /// registration.
    pub fn subscribe(&mut self, observer: Observer) {
        self.observers.push(observer);
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn snapshot(&self) -> ConversationState {
        self.state.clone()
    }

    /// Add a message at the end of the transcript
    pub fn append(&mut self, message: Message) {
        self.state.messages.push(message.clone());
        self.notify(&StoreEvent::MessageAppended { message });
    }

    pub fn set_flag(&mut self, flag: Flag, value: bool) {
        let slot = match flag {
            Flag::Initializing => &mut self.state.is_initializing,
            Flag::AwaitingReply => &mut self.state.is_awaiting_reply,
        };
        if *slot == value {
            return;
        }
        *slot = value;
        self.notify(&StoreEvent::FlagChanged { flag, value });
    }

    /// Replace the last error; `None` clears it
    pub fn set_error(&mut self, error: Option<String>) {
        if self.state.last_error == error {
            return;
        }
        self.state.last_error.clone_from(&error);
        self.notify(&StoreEvent::ErrorChanged { error });
    }

    fn notify(&self, event: &StoreEvent) {
        for observer in &self.observers {
            observer(event, &self.state);
        }
    }
}
