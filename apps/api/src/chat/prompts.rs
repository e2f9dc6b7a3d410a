//! All LLM prompt builders for the Chat module.
//! Reuses cross-cutting fragments from llm_client::prompts.
//!
//! Prompt text follows the persona's website-chat rules: stay in character,
//! decline explicitly when the background material cannot answer, steer
//! ongoing discussion toward email contact, never share phone or address.

use crate::chat::models::{Candidate, ChatMessage, ConversationTurn, Rejection, Role};
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::persona::Persona;

/// Behavioural rules appended to every responder system prompt.
const PERSONA_RULES: &str = "\
    Be professional and engaging, as if talking to a potential client or future employer \
    who came across the website. \
    If you don't know the answer to a question from the summary and CV profile below, say \
    plainly that you are not able to answer it and invite the visitor to ask about your \
    professional background instead. \
    If the visitor is engaging in discussion, steer them towards getting in touch over email. \
    Never share a phone number or home address; share email contact only. \
    If the visitor has asked more than 5 questions, recommend continuing the conversation over email.";

/// Builds the system prompt for candidate generation.
pub fn responder_system(persona: &Persona) -> String {
    format!(
        "You are acting as {name}. You are answering questions on {name}'s website, \
        particularly questions related to {name}'s career, background, skills and experience. \
        Your responsibility is to represent {name} for interactions on the website as \
        faithfully as possible. You are given a summary of {name}'s background and a CV \
        profile which you can use to answer questions. {rules}\
        \n\n## Summary:\n{summary}\n\n## CV Profile:\n{cv}\n\n\
        With this context, please chat with the user, always staying in character as {name}.",
        name = persona.name,
        rules = PERSONA_RULES,
        summary = persona.summary,
        cv = persona.cv_text,
    )
}

/// Builds the system prompt for the one-shot regeneration: the base persona
/// prompt extended with the rejected attempt and the evaluator's feedback.
pub fn revision_system(persona: &Persona, rejection: &Rejection) -> String {
    format!(
        "{base}\n\n## Previous answer rejected\nYour attempted answer:\n{attempt}\n\n\
        Reason for rejection:\n{feedback}\n\n\
        Answer the visitor's question again, correcting the problem described above.",
        base = responder_system(persona),
        attempt = rejection.prior_attempt,
        feedback = rejection.feedback,
    )
}

/// Builds the system prompt for the evaluator (rubric + persona material).
pub fn evaluator_system(persona: &Persona) -> String {
    format!(
        "You are an evaluator that decides whether a response to a question is acceptable. \
        You are provided with a conversation between a User and an Agent. Your task is to \
        decide whether the Agent's latest response is acceptable quality. The Agent is \
        playing the role of {name} on their website and has been instructed to be \
        professional and engaging. Here is the information you have access to:\
        \n\n## Summary:\n{summary}\n\n## CV Profile:\n{cv}\n\n{json_only}",
        name = persona.name,
        summary = persona.summary,
        cv = persona.cv_text,
        json_only = JSON_ONLY_SYSTEM,
    )
}

/// Builds the evaluator's user prompt: transcript, latest message, candidate,
/// and the expected verdict schema.
pub fn evaluator_user(turn: &ConversationTurn, candidate: &Candidate) -> String {
    format!(
        "Here's the conversation between the User and the Agent:\n\n{history}\n\n\
        Latest message from the User:\n\n{message}\n\n\
        Agent's latest response:\n\n{reply}\n\n\
        Evaluate the response for tone, accuracy, and usefulness. \
        Return a JSON object with this EXACT schema (no extra fields):\n\
        {{\"acceptable\": true, \"feedback\": \"one or two sentences explaining the verdict\"}}\n\
        `feedback` is REQUIRED when `acceptable` is false.",
        history = render_history(&turn.history),
        message = turn.message,
        reply = candidate.text,
    )
}

/// Renders prior history as alternating User/Agent lines.
fn render_history(history: &[ChatMessage]) -> String {
    if history.is_empty() {
        return "(no prior messages)".to_string();
    }

    history
        .iter()
        .map(|m| match m.role {
            Role::User => format!("User: {}", m.text),
            Role::Assistant => format!("Agent: {}", m.text),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
