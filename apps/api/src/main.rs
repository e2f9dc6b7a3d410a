mod chat;
mod config;
mod errors;
mod llm_client;
mod notify;
mod persona;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::chat::evaluator::LlmEvaluator;
use crate::chat::responder::LlmResponder;
use crate::chat::signals::default_detectors;
use crate::chat::supervisor::ResponseSupervisor;
use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::notify::{Notifier, PushoverNotifier};
use crate::persona::Persona;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Emissary API v{}", env!("CARGO_PKG_VERSION"));

    // Load persona material once; immutable for the process lifetime
    let persona = Arc::new(Persona::load(
        &config.persona_name,
        &config.cv_path,
        &config.summary_path,
    )?);
    info!(
        "Persona loaded: {} (summary: {} chars, CV: {} chars)",
        persona.name,
        persona.summary.len(),
        persona.cv_text.len()
    );

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone());
    info!(
        "LLM client initialized (responder: {}, evaluator: {})",
        llm_client::RESPONDER_MODEL,
        llm_client::EVALUATOR_MODEL
    );

    // Initialize Pushover notifier (best-effort delivery)
    let notifier: Arc<dyn Notifier> = Arc::new(PushoverNotifier::new(
        config.pushover_token.clone(),
        config.pushover_user.clone(),
    ));
    info!("Pushover notifier initialized");

    // Wire the response supervisor: responder + evaluator + signal detectors
    let supervisor = Arc::new(ResponseSupervisor::new(
        Arc::clone(&persona),
        Arc::new(LlmResponder(llm.clone())),
        Arc::new(LlmEvaluator(llm)),
        notifier,
        default_detectors(),
    ));

    // Build app state
    let state = AppState {
        supervisor,
        persona,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
