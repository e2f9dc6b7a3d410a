//! Core data types for one chat turn.
//!
//! Everything here is transient: created for a single `handle` call, owned by
//! that call, and discarded when the turn resolves. Session history lives in
//! the presentation layer, never in the core.

use serde::{Deserialize, Serialize};

/// Speaker role in a transcript. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One prior (role, text) exchange in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
}

/// One user message plus the chronological history preceding it.
/// Read-only input to the supervisor; the caller accumulates history across turns.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationTurn {
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    pub message: String,
}

/// A generated reply, prior to acceptance. Owned by the supervisor for the
/// duration of one turn; a rejected first candidate is dropped once the
/// revision exists.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub text: String,
}

/// Pass/fail judgment from the evaluator. A fail always carries feedback;
/// the type makes a feedback-less rejection unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail { feedback: String },
}

/// Context injected into the one-shot regeneration after a rejection.
#[derive(Debug, Clone)]
pub struct Rejection {
    pub prior_attempt: String,
    pub feedback: String,
}

/// The reply ultimately returned to the caller for one turn: the first
/// candidate on a pass, or the revision unconditionally on a fail.
#[derive(Debug, Clone, Serialize)]
pub struct FinalReply {
    pub text: String,
    /// True when the reply came from the regeneration path.
    pub revised: bool,
}
