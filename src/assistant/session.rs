//! Assistant session — transcript owner and reply scheduler.
//!
//! ```text
//!            submit(text)                     typing delay elapses
//!   Idle ─────────────────▶ AwaitingResponse ─────────────────────▶ Idle
//!    ▲  user message appended                 assistant message appended
//!    │
//!    └── submit while AwaitingResponse / blank text → Rejected, no change
//! ```
//!
//! Transcript and phase live in one [`SessionState`] behind a mutex, and only
//! `submit` and the scheduled reply step mutate it. The reply step is a tokio
//! task tied to the session's [`CancellationToken`]; [`Session::dispose`] (or
//! dropping the session) cancels it and it never touches the state again.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Level, debug, info, info_span, warn};
use uuid::Uuid;

use super::message::{Message, MessageId, Sender};
use super::rules::{Rule, RuleTable};

/// Typing delay used when none is configured.
pub const DEFAULT_TYPING_DELAY: Duration = Duration::from_millis(1500);

pub const DEFAULT_GREETING: &str = "Hello! I'm your Cloudburst Detection Assistant. I can help you understand the system, interpret alerts, and answer questions about launch safety. What would you like to know?";

pub const DEFAULT_SUGGESTED_PROMPTS: &[&str] = &[
    "What does red mean on the map?",
    "Is my region safe for launching?",
    "How often is the map updated?",
    "Explain the color coding system",
];

// ── Rejected ──────────────────────────────────────────────────────────────────

/// Why a submission was declined. Nothing is written to the transcript in
/// any of these cases.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Rejected {
    #[error("input is empty")]
    EmptyInput,
    #[error("a response is still pending")]
    AwaitingResponse,
    #[error("session has been disposed")]
    Disposed,
}

// ── Settings ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Seed assistant message; a blank value falls back to [`DEFAULT_GREETING`].
    pub greeting: String,
    /// Offered until the first accepted submission.
    pub suggested_prompts: Vec<String>,
    pub typing_delay: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            greeting: DEFAULT_GREETING.to_string(),
            suggested_prompts: DEFAULT_SUGGESTED_PROMPTS.iter().map(|p| (*p).to_string()).collect(),
            typing_delay: DEFAULT_TYPING_DELAY,
        }
    }
}

// ── State ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    AwaitingResponse,
}

struct SessionState {
    transcript: Vec<Message>,
    phase: Phase,
    next_id: MessageId,
    rng: StdRng,
}

impl SessionState {
    fn push(&mut self, sender: Sender, text: &str) -> MessageId {
        let id = self.next_id;
        self.next_id = id.next();
        self.transcript.push(Message::new(id, sender, text));
        id
    }
}

struct Shared {
    state: Mutex<SessionState>,
    rules: Arc<RuleTable>,
    revision: watch::Sender<u64>,
}

impl Shared {
    /// Every mutation is a handful of field writes, so a poisoned lock still
    /// guards a consistent state.
    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump(&self) {
        self.revision.send_modify(|r| *r += 1);
    }

    /// Reply step: runs once the typing delay has elapsed.
    fn complete(&self, input: &str, cancel: &CancellationToken) {
        let mut state = self.state();
        // Checked under the lock: `dispose` cancels while holding it.
        if cancel.is_cancelled() {
            debug!("session disposed before reply; dropping it");
            return;
        }

        let reply = self.rules.respond(input, &mut state.rng).to_string();
        if tracing::enabled!(Level::DEBUG) {
            let keyword = self.rules.match_rule(input).map(Rule::keyword);
            debug!(?keyword, "reply selected");
        }

        let id = state.push(Sender::Assistant, &reply);
        state.phase = Phase::Idle;
        drop(state);

        debug!(message_id = %id, "assistant reply appended");
        self.bump();
    }
}

// ── Session ───────────────────────────────────────────────────────────────────

/// One mounted assistant. Not `Clone`: the mount owns it, and dropping it
/// disposes any pending reply.
pub struct Session {
    id: Uuid,
    shared: Arc<Shared>,
    suggested_prompts: Vec<String>,
    typing_delay: Duration,
    cancel: CancellationToken,
}

impl Session {
    pub fn new(rules: Arc<RuleTable>, settings: SessionSettings) -> Self {
        Self::with_rng(rules, settings, StdRng::from_entropy())
    }

    /// Like [`Session::new`] with a caller-supplied source for default replies.
    pub fn with_rng(rules: Arc<RuleTable>, settings: SessionSettings, rng: StdRng) -> Self {
        let id = Uuid::new_v4();

        let greeting = if settings.greeting.trim().is_empty() {
            warn!(session_id = %id, "blank greeting configured; using the built-in one");
            DEFAULT_GREETING.to_string()
        } else {
            settings.greeting
        };

        let mut state = SessionState {
            transcript: Vec::new(),
            phase: Phase::Idle,
            next_id: MessageId::FIRST,
            rng,
        };
        state.push(Sender::Assistant, &greeting);

        let (revision, _) = watch::channel(0);

        info!(session_id = %id, rules = rules.rules().len(), "assistant session mounted");

        Self {
            id,
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                rules,
                revision,
            }),
            suggested_prompts: settings.suggested_prompts,
            typing_delay: settings.typing_delay,
            cancel: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Append `text` as a user message and schedule the assistant's reply.
    ///
    /// Returns immediately; the reply lands after the typing delay. Blank
    /// text, a pending reply, or a disposed session decline the call without
    /// touching the transcript.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn submit(&self, text: &str) -> Result<(), Rejected> {
        if text.trim().is_empty() {
            return Err(Rejected::EmptyInput);
        }

        let mut state = self.shared.state();
        if self.cancel.is_cancelled() {
            return Err(Rejected::Disposed);
        }
        if state.phase == Phase::AwaitingResponse {
            debug!(session_id = %self.id, "submit while awaiting a reply; ignored");
            return Err(Rejected::AwaitingResponse);
        }

        let message_id = state.push(Sender::User, text);
        state.phase = Phase::AwaitingResponse;
        drop(state);

        debug!(session_id = %self.id, %message_id, "user message accepted");
        self.shared.bump();
        self.schedule_reply(text.to_string(), message_id);
        Ok(())
    }

    fn schedule_reply(&self, input: String, message_id: MessageId) {
        let shared = Arc::clone(&self.shared);
        let cancel = self.cancel.clone();
        let delay = self.typing_delay;
        let span = info_span!("reply", session_id = %self.id, %message_id);

        tokio::spawn(
            async move {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        debug!("pending reply cancelled");
                    }
                    _ = tokio::time::sleep(delay) => {
                        shared.complete(&input, &cancel);
                    }
                }
            }
            .instrument(span),
        );
    }

    /// Snapshot of every message so far, in insertion order.
    pub fn transcript(&self) -> Vec<Message> {
        self.shared.state().transcript.clone()
    }

    pub fn len(&self) -> usize {
        self.shared.state().transcript.len()
    }

    pub fn is_awaiting_response(&self) -> bool {
        self.shared.state().phase == Phase::AwaitingResponse
    }

    /// Example inputs, offered only while the greeting is the sole message.
    pub fn suggested_prompts(&self) -> Vec<String> {
        if self.len() == 1 {
            self.suggested_prompts.clone()
        } else {
            Vec::new()
        }
    }

    /// Revision counter, bumped on every transcript or phase change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }

    /// Resolve once no reply is pending (or the session is disposed).
    pub async fn settled(&self) {
        let mut rx = self.subscribe();
        loop {
            if !self.is_awaiting_response() || self.cancel.is_cancelled() {
                return;
            }
            tokio::select! {
                changed = rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
                _ = self.cancel.cancelled() => return,
            }
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancel any pending reply and refuse further submissions. Idempotent.
    pub fn dispose(&self) {
        let mut state = self.shared.state();
        if self.cancel.is_cancelled() {
            return;
        }
        self.cancel.cancel();
        let was_pending = state.phase == Phase::AwaitingResponse;
        state.phase = Phase::Idle;
        let messages = state.transcript.len();
        drop(state);

        info!(session_id = %self.id, messages, was_pending, "assistant session disposed");
        self.shared.bump();
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.dispose();
    }
}
