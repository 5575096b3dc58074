use async_trait::async_trait;
use kabu_core::notify::entity::Embed;
use kabu_core::notify::error::NotifyError;
use kabu_core::notify::port::Notifier;
use serde::Serialize;
use std::time::Duration;
use tracing::{error, info};

/// # Summary
/// A notifier that posts embeds to a Discord-compatible webhook.
///
/// # Invariants
/// * `webhook_url` must not be empty.
/// * Delivery is at most once: failures are reported, never retried.
pub struct WebhookNotifier {
    /// The target webhook URL.
    webhook_url: String,
    /// The HTTP client used for requests.
    client: reqwest::Client,
}

/// Payload structure for the webhook `execute` endpoint.
#[derive(Serialize)]
struct WebhookMessage<'a> {
    embeds: [&'a Embed; 1],
}

impl WebhookNotifier {
    /// # Summary
    /// Creates a new `WebhookNotifier`.
    ///
    /// # Arguments
    /// * `webhook_url` - The webhook endpoint.
    /// * `timeout` - Per-request timeout.
    ///
    /// # Returns
    /// * `Err(NotifyError::Config)` if the URL is empty or the client cannot be built.
    pub fn new(webhook_url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let webhook_url = webhook_url.into();
        if webhook_url.trim().is_empty() {
            return Err(NotifyError::Config("webhook URL is empty".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Config(e.to_string()))?;
        Ok(Self {
            webhook_url,
            client,
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    /// # Summary
    /// Posts a single embed to the webhook.
    ///
    /// # Logic
    /// 1. Wraps the embed as `{"embeds": [embed]}`.
    /// 2. Sends a POST request with a JSON body.
    /// 3. Treats 204 and any other 2xx status as success.
    ///
    /// # Returns
    /// * `Err(NotifyError::Network)` on transport failure.
    /// * `Err(NotifyError::Platform)` on a non-success status.
    async fn notify(&self, embed: &Embed) -> Result<(), NotifyError> {
        let payload = WebhookMessage { embeds: [embed] };

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Webhook delivery failed: {}", status);
            return Err(NotifyError::Platform(format!(
                "Webhook error {}: {}",
                status, error_text
            )));
        }

        info!("Webhook delivered: {}", embed.title);
        Ok(())
    }
}
