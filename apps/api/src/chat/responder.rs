//! Responder: produces candidate replies grounded in the persona.

use async_trait::async_trait;

use crate::chat::models::{Candidate, ConversationTurn, Rejection, Role};
use crate::chat::prompts::{responder_system, revision_system};
use crate::errors::AppError;
use crate::llm_client::{LlmClient, Message, RESPONDER_MODEL};
use crate::persona::Persona;

/// The responder capability. Implement this to swap backends without touching
/// the supervisor. Carried as `Arc<dyn Responder>`.
///
/// `rejection` is present only on the one-shot regeneration path and carries
/// the rejected attempt plus the evaluator's feedback.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn generate(
        &self,
        persona: &Persona,
        turn: &ConversationTurn,
        rejection: Option<&Rejection>,
    ) -> Result<Candidate, AppError>;
}

/// LLM-backed responder over the shared Anthropic client.
pub struct LlmResponder(pub LlmClient);

#[async_trait]
impl Responder for LlmResponder {
    async fn generate(
        &self,
        persona: &Persona,
        turn: &ConversationTurn,
        rejection: Option<&Rejection>,
    ) -> Result<Candidate, AppError> {
        let system = match rejection {
            Some(r) => revision_system(persona, r),
            None => responder_system(persona),
        };

        let messages = transcript_messages(turn);

        let response = self
            .0
            .chat(RESPONDER_MODEL, &system, &messages)
            .await
            .map_err(|e| AppError::Llm(format!("Responder call failed: {e}")))?;

        let text = response
            .text()
            .ok_or_else(|| AppError::Llm("Responder returned empty content".to_string()))?;

        Ok(Candidate {
            text: text.to_string(),
        })
    }
}

/// Maps a turn onto the wire message list: prior history in chronological
/// order, then the current user message last.
fn transcript_messages(turn: &ConversationTurn) -> Vec<Message> {
    let mut messages: Vec<Message> = turn
        .history
        .iter()
        .map(|m| match m.role {
            Role::User => Message::user(m.text.clone()),
            Role::Assistant => Message::assistant(m.text.clone()),
        })
        .collect();

    messages.push(Message::user(turn.message.clone()));
    messages
}
