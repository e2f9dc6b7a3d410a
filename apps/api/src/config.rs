use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub pushover_token: String,
    pub pushover_user: String,
    pub persona_name: String,
    pub cv_path: PathBuf,
    pub summary_path: PathBuf,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            pushover_token: require_env("PUSHOVER_TOKEN")?,
            pushover_user: require_env("PUSHOVER_USER")?,
            persona_name: require_env("PERSONA_NAME")?,
            cv_path: std::env::var("CV_PATH")
                .unwrap_or_else(|_| "me/cv.pdf".to_string())
                .into(),
            summary_path: std::env::var("SUMMARY_PATH")
                .unwrap_or_else(|_| "me/summary.txt".to_string())
                .into(),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
