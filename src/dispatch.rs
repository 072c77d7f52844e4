//! Dispatch controller
//!
//! Orchestrates session start and user turns against the conversation
//! store and the session gateway.
//!
//! Turn lifecycle: `Idle -> Dispatching -> Idle`. Admission ([`ChatController::begin`])
//! is synchronous and atomic with the optimistic user append; completion
//! ([`PendingTurn::complete`]) awaits the gateway and appends the outcome.
//! The in-flight flag is cleared by a drop guard, so it is released even
//! if the completing future is dropped.

#[cfg(test)]
mod proptests;

use crate::conversation::{ConversationState, ConversationStore, Flag, Message, Observer};
use crate::session::{GatewayError, RemoteAssistant, SessionGateway};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Assistant greeting seeded once the session is up
pub const GREETING: &str =
    "Hello! I'm SAMTINK AI, your helpful assistant. How can I help you today?";

/// Startup state machine: `Loading -> Ready | Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InitPhase {
    Loading,
    Ready,
    Failed,
}

/// Why a submission was refused. A refused submission changes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    EmptyText,
    AwaitingReply,
    Initializing,
    SessionUnavailable,
}

impl RejectReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EmptyText => "empty_text",
            Self::AwaitingReply => "awaiting_reply",
            Self::Initializing => "initializing",
            Self::SessionUnavailable => "session_unavailable",
        }
    }
}

/// Result of a completed turn
#[derive(Debug, Clone)]
pub enum TurnOutcome {
    /// The assistant reply that was appended
    Replied(Message),
    /// The gateway failed; an error entry was appended
    Failed(GatewayError),
}

/// Human-readable transcript entry for a failed turn
pub fn error_entry_text(error: &GatewayError) -> String {
    format!("Error: {error}. Please check your API key or network connection.")
}

/// Banner text for a failed turn
pub fn turn_error_summary(error: &GatewayError) -> String {
    format!("Failed to get response: {error}. Please try again.")
}

/// Banner text for a failed session start
pub fn init_error_summary(error: &GatewayError) -> String {
    format!("Failed to start chat session: {error}. Please ensure API_KEY is set correctly.")
}

fn lock(store: &Mutex<ConversationStore>) -> MutexGuard<'_, ConversationStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Controller shared by the HTTP handlers
///
/// Observers registered through [`ChatController::subscribe`] run while the
/// store lock is held and must not call back into the controller.
pub struct ChatController<A: RemoteAssistant> {
    store: Arc<Mutex<ConversationStore>>,
    gateway: Arc<tokio::sync::Mutex<SessionGateway<A>>>,
    phase: Arc<Mutex<InitPhase>>,
}

impl<A: RemoteAssistant> Clone for ChatController<A> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            gateway: self.gateway.clone(),
            phase: self.phase.clone(),
        }
    }
}

impl<A: RemoteAssistant> ChatController<A> {
    pub fn new(gateway: SessionGateway<A>) -> Self {
        Self {
            store: Arc::new(Mutex::new(ConversationStore::new())),
            gateway: Arc::new(tokio::sync::Mutex::new(gateway)),
            phase: Arc::new(Mutex::new(InitPhase::Loading)),
        }
    }

    pub fn subscribe(&self, observer: Observer) {
        lock(&self.store).subscribe(observer);
    }

    /// Run `f` against the current state while holding the store lock.
    ///
    /// No mutation (and so no observer callback) can interleave with `f`.
    pub fn observe<R>(&self, f: impl FnOnce(&ConversationState) -> R) -> R {
        f(lock(&self.store).state())
    }

    pub fn snapshot(&self) -> ConversationState {
        lock(&self.store).snapshot()
    }

    pub fn phase(&self) -> InitPhase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_phase(&self, phase: InitPhase) {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner) = phase;
    }

    /// Start the remote session and seed the transcript.
    ///
    /// Runs once; later calls return the phase already reached.
    pub async fn initialize(&self) -> InitPhase {
        let mut gateway = self.gateway.lock().await;
        if self.phase() != InitPhase::Loading {
            return self.phase();
        }

        let result = gateway.start_session().await.map(|handle| handle.id());

        // Phase must settle before the gateway lock is released
        let mut store = lock(&self.store);
        let phase = match result {
            Ok(session_id) => {
                store.append(Message::assistant(GREETING));
                tracing::info!(session_id = %session_id, "Conversation ready");
                InitPhase::Ready
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to initialize chat");
                store.set_error(Some(init_error_summary(&e)));
                InitPhase::Failed
            }
        };
        self.set_phase(phase);
        store.set_flag(Flag::Initializing, false);
        drop(store);
        drop(gateway);
        phase
    }

    /// Admit a user turn.
    ///
    /// On success the trimmed text has been appended as a user message,
    /// `is_awaiting_reply` is set and the error banner cleared. On rejection
    /// nothing changed.
    pub fn begin(&self, text: &str) -> Result<PendingTurn<A>, RejectReason> {
        let text = text.trim();
        if text.is_empty() {
            return Err(RejectReason::EmptyText);
        }

        let mut store = lock(&self.store);
        let state = store.state();
        if state.is_initializing {
            return Err(RejectReason::Initializing);
        }
        if state.is_awaiting_reply {
            tracing::debug!("Rejecting submission while a reply is pending");
            return Err(RejectReason::AwaitingReply);
        }
        if self.phase() == InitPhase::Failed {
            return Err(RejectReason::SessionUnavailable);
        }

        let message = Message::user(text);
        let message_id = message.id();
        store.append(message);
        store.set_flag(Flag::AwaitingReply, true);
        store.set_error(None);
        drop(store);

        tracing::info!(message_id = %message_id, chars = text.chars().count(), "Dispatching user turn");

        Ok(PendingTurn {
            text: text.to_string(),
            gateway: self.gateway.clone(),
            guard: InFlightGuard {
                store: self.store.clone(),
                armed: true,
            },
        })
    }

    /// Admit and complete a turn
    #[allow(dead_code)] // The HTTP layer splits begin/complete
    pub async fn submit(&self, text: &str) -> Result<TurnOutcome, RejectReason> {
        let turn = self.begin(text)?;
        Ok(turn.complete().await)
    }
}

/// An admitted turn whose reply has not been recorded yet
pub struct PendingTurn<A: RemoteAssistant> {
    text: String,
    gateway: Arc<tokio::sync::Mutex<SessionGateway<A>>>,
    guard: InFlightGuard,
}

impl<A: RemoteAssistant> PendingTurn<A> {
    /// Call the gateway and append the reply or an error entry
    pub async fn complete(self) -> TurnOutcome {
        let PendingTurn {
            text,
            gateway,
            guard,
        } = self;

        let result = gateway.lock().await.send_message(&text).await;

        let shared = guard.store.clone();
        let mut store = lock(&shared);
        let outcome = match result {
            Ok(reply) => {
                let message = Message::assistant(reply);
                store.append(message.clone());
                TurnOutcome::Replied(message)
            }
            Err(e) => {
                let kind = match &e {
                    GatewayError::Transport { kind, .. } => kind.as_str(),
                    _ => "gateway",
                };
                tracing::warn!(error = %e, kind, "Turn failed");
                store.append(Message::assistant(error_entry_text(&e)));
                store.set_error(Some(turn_error_summary(&e)));
                TurnOutcome::Failed(e)
            }
        };
        guard.release(&mut store);
        outcome
    }
}

/// Clears `is_awaiting_reply` exactly once
struct InFlightGuard {
    store: Arc<Mutex<ConversationStore>>,
    armed: bool,
}

impl InFlightGuard {
    /// Clear the flag inside an existing critical section
    fn release(mut self, store: &mut ConversationStore) {
        store.set_flag(Flag::AwaitingReply, false);
        self.armed = false;
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!("Turn abandoned before completion, clearing in-flight flag");
            lock(&self.store).set_flag(Flag::AwaitingReply, false);
        }
    }
}
