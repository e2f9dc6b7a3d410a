//! Notifier: best-effort push notifications for notable chat events.
//!
//! Delivery failures are logged and swallowed at the dispatch site; they can
//! never fail a turn or delay a reply.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

const PUSHOVER_API_URL: &str = "https://api.pushover.net/1/messages.json";

/// The notifier capability. Carried as `Arc<dyn Notifier>`.
/// Callers treat delivery as best-effort and swallow errors.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str) -> anyhow::Result<()>;
}

/// Pushover-backed notifier.
pub struct PushoverNotifier {
    client: Client,
    token: String,
    user: String,
}

impl PushoverNotifier {
    pub fn new(token: String, user: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .expect("Failed to build HTTP client"),
            token,
            user,
        }
    }
}

#[async_trait]
impl Notifier for PushoverNotifier {
    async fn notify(&self, message: &str) -> anyhow::Result<()> {
        let response = self
            .client
            .post(PUSHOVER_API_URL)
            .form(&[
                ("token", self.token.as_str()),
                ("user", self.user.as_str()),
                ("message", message),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Pushover returned {status}: {body}");
        }

        debug!("Notification delivered ({} chars)", message.len());
        Ok(())
    }
}
