//! Signal detection: pluggable predicates over a completed turn.
//!
//! Detectors inspect the turn and the final reply and produce notification
//! messages for notable events. They are decoupled from the accept/revise
//! loop: detection runs after the FinalReply is determined and never changes
//! it. Default backends are cheap text predicates; a secondary-model
//! classifier can be swapped in behind the same trait.

use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;

use crate::chat::models::{ConversationTurn, FinalReply};

/// A detector inspects one resolved turn and, on a match, yields the
/// notification message to dispatch. Carried as `Arc<dyn SignalDetector>`.
#[async_trait]
pub trait SignalDetector: Send + Sync {
    async fn inspect(&self, turn: &ConversationTurn, reply: &FinalReply) -> Option<String>;
}

/// The default detector set: unknown-question marker phrases plus email
/// contact capture.
pub fn default_detectors() -> Vec<Arc<dyn SignalDetector>> {
    vec![
        Arc::new(UnknownQuestionDetector),
        Arc::new(ContactDetector::new()),
    ]
}

// ────────────────────────────────────────────────────────────────────────────
// Unknown-question detector
// ────────────────────────────────────────────────────────────────────────────

/// Marker phrases the persona prompt instructs the responder to use when the
/// background material cannot answer a question.
const UNKNOWN_MARKERS: &[&str] = &[
    "not able to answer",
    "unable to answer",
    "can't answer",
    "cannot answer",
    "don't know the answer",
    "don't have that information",
];

/// Flags replies where the assistant declined because the question fell
/// outside the persona's background material.
pub struct UnknownQuestionDetector;

#[async_trait]
impl SignalDetector for UnknownQuestionDetector {
    async fn inspect(&self, turn: &ConversationTurn, reply: &FinalReply) -> Option<String> {
        let reply_lower = reply.text.to_lowercase();
        if UNKNOWN_MARKERS.iter().any(|m| reply_lower.contains(m)) {
            return Some(format!("Recording unknown question: {}", turn.message));
        }
        None
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Contact detector
// ────────────────────────────────────────────────────────────────────────────

/// Captures email-like tokens from the latest user message, the transcript,
/// or the reply. The notification carries the surrounding user message so the
/// recipient has conversational context.
pub struct ContactDetector {
    email: Regex,
}

impl ContactDetector {
    pub fn new() -> Self {
        Self {
            email: Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}")
                .expect("email regex is valid"),
        }
    }

    fn first_email<'a>(&self, text: &'a str) -> Option<&'a str> {
        self.email.find(text).map(|m| m.as_str())
    }
}

impl Default for ContactDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignalDetector for ContactDetector {
    async fn inspect(&self, turn: &ConversationTurn, reply: &FinalReply) -> Option<String> {
        // Latest message first: the freshest capture wins
        if let Some(email) = self.first_email(&turn.message) {
            return Some(format!(
                "Recording contact {email} (context: {})",
                turn.message
            ));
        }

        for prior in &turn.history {
            if let Some(email) = self.first_email(&prior.text) {
                return Some(format!("Recording contact {email} (context: {})", prior.text));
            }
        }

        self.first_email(&reply.text)
            .map(|email| format!("Recording contact {email} (from assistant reply)"))
    }
}
