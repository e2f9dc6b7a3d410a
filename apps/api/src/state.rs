use std::sync::Arc;

use crate::chat::supervisor::ResponseSupervisor;
use crate::persona::Persona;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Everything here is immutable after startup; concurrent turns share nothing
/// mutable, so handlers are freely re-entrant.
#[derive(Clone)]
pub struct AppState {
    pub supervisor: Arc<ResponseSupervisor>,
    pub persona: Arc<Persona>,
}
