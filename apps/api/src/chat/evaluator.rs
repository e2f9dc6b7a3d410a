//! Evaluator: judges a candidate reply against the persona rubric.
//!
//! The verdict is structured JSON; anything that cannot be parsed into a
//! structurally valid verdict (including a fail without feedback) is a call
//! failure, not a rejection.

use async_trait::async_trait;
use serde::Deserialize;

use crate::chat::models::{Candidate, ConversationTurn, Verdict};
use crate::chat::prompts::{evaluator_system, evaluator_user};
use crate::errors::AppError;
use crate::llm_client::{LlmClient, Message, EVALUATOR_MODEL};
use crate::persona::Persona;

/// The evaluator capability. Carried as `Arc<dyn Evaluator>`.
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(
        &self,
        persona: &Persona,
        turn: &ConversationTurn,
        candidate: &Candidate,
    ) -> Result<Verdict, AppError>;
}

/// Wire shape of the evaluator's JSON verdict.
#[derive(Debug, Deserialize)]
struct RawVerdict {
    acceptable: bool,
    #[serde(default)]
    feedback: String,
}

/// Converts the wire verdict into the domain type, enforcing the structural
/// invariant that a rejection carries feedback.
fn verdict_from_raw(raw: RawVerdict) -> Result<Verdict, AppError> {
    if raw.acceptable {
        return Ok(Verdict::Pass);
    }
    if raw.feedback.trim().is_empty() {
        return Err(AppError::Llm(
            "Evaluator returned a fail verdict without feedback".to_string(),
        ));
    }
    Ok(Verdict::Fail {
        feedback: raw.feedback,
    })
}

/// LLM-backed evaluator over the shared Anthropic client.
pub struct LlmEvaluator(pub LlmClient);

#[async_trait]
impl Evaluator for LlmEvaluator {
    async fn evaluate(
        &self,
        persona: &Persona,
        turn: &ConversationTurn,
        candidate: &Candidate,
    ) -> Result<Verdict, AppError> {
        let system = evaluator_system(persona);
        let messages = [Message::user(evaluator_user(turn, candidate))];

        let raw: RawVerdict = self
            .0
            .chat_json(EVALUATOR_MODEL, &system, &messages)
            .await
            .map_err(|e| AppError::Llm(format!("Evaluator call failed: {e}")))?;

        verdict_from_raw(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acceptable_verdict_is_pass() {
        let raw = RawVerdict {
            acceptable: true,
            feedback: String::new(),
        };
        assert_eq!(verdict_from_raw(raw).unwrap(), Verdict::Pass);
    }

    #[test]
    fn test_rejection_carries_feedback() {
        let raw = RawVerdict {
            acceptable: false,
            feedback: "off-topic for a professional persona".to_string(),
        };
        let verdict = verdict_from_raw(raw).unwrap();
        assert_eq!(
            verdict,
            Verdict::Fail {
                feedback: "off-topic for a professional persona".to_string()
            }
        );
    }

    #[test]
    fn test_rejection_without_feedback_is_call_failure() {
        let raw = RawVerdict {
            acceptable: false,
            feedback: "   ".to_string(),
        };
        assert!(matches!(verdict_from_raw(raw), Err(AppError::Llm(_))));
    }

    #[test]
    fn test_raw_verdict_deserializes_without_feedback_field() {
        let raw: RawVerdict = serde_json::from_str(r#"{"acceptable": true}"#).unwrap();
        assert!(raw.acceptable);
        assert!(raw.feedback.is_empty());
    }
}
