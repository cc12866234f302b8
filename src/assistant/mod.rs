//! The cloudburst assistant: keyword rules plus a per-mount session.
//!
//! ```text
//! Session::submit ──▶ transcript (user) ──▶ typing delay ──▶ RuleTable::respond
//!                                                                 │
//!                          transcript (assistant) ◀───────────────┘
//! ```

pub mod message;
pub mod rules;
pub mod session;

pub use message::{Message, MessageId, Sender};
pub use rules::{Rule, RuleError, RuleTable};
pub use session::{Rejected, Session, SessionSettings};
