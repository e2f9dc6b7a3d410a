//! Persona context: the immutable background material the assistant speaks from.
//!
//! Loaded once at process start (CV text extracted from a PDF, summary read
//! from a plain text file) and shared read-only across all turns. Prompt
//! builders receive it explicitly; no module reads persona state ambiently.

use std::path::Path;

use anyhow::{Context, Result};

/// The person the assistant represents.
#[derive(Debug, Clone)]
pub struct Persona {
    pub name: String,
    pub summary: String,
    pub cv_text: String,
}

impl Persona {
    /// Loads persona material from disk. Called once at startup; any failure
    /// here is fatal; the service cannot answer questions without its
    /// grounding material.
    pub fn load(name: &str, cv_path: &Path, summary_path: &Path) -> Result<Self> {
        let cv_text = pdf_extract::extract_text(cv_path).map_err(|e| {
            anyhow::anyhow!("Failed to extract CV text from {}: {e}", cv_path.display())
        })?;

        let summary = std::fs::read_to_string(summary_path)
            .with_context(|| format!("Failed to read summary from {}", summary_path.display()))?;

        if cv_text.trim().is_empty() {
            anyhow::bail!("CV at {} contained no extractable text", cv_path.display());
        }

        Ok(Self {
            name: name.to_string(),
            summary,
            cv_text,
        })
    }
}
