//! Axum route handlers for the Chat API.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::chat::models::ConversationTurn;
use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub revised: bool,
}

#[derive(Debug, Serialize)]
pub struct PersonaResponse {
    pub name: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/chat
///
/// Runs one full supervised turn: generate, evaluate, optionally regenerate.
/// The request body is the turn itself; the widget accumulates history
/// client-side and resends it with every message.
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(turn): Json<ConversationTurn>,
) -> Result<Json<ChatResponse>, AppError> {
    let reply = state.supervisor.handle(turn).await?;

    Ok(Json(ChatResponse {
        reply: reply.text,
        revised: reply.revised,
    }))
}

/// GET /api/v1/persona
///
/// Returns the persona's display name so the widget can render its header.
pub async fn handle_persona(State(state): State<AppState>) -> Json<PersonaResponse> {
    Json(PersonaResponse {
        name: state.persona.name.clone(),
    })
}
