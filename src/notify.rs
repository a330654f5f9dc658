//! Notification transport for alert delivery.
//!
//! The engine only knows the [`Notifier`] contract; the concrete transport
//! is a webhook relay (the ops side fans out to email/SMS). Deployments
//! without a configured relay get [`AlertNotifier::Disabled`], which logs
//! the would-be send and succeeds — alerting stays fire-and-forget either
//! way.

use std::future::Future;

use crate::error::EngineError;

// ---

/// Sends one message to one address. Failure is independent of whatever
/// operation triggered the send.
pub trait Notifier: Send + Sync {
    fn send(
        &self,
        address: &str,
        subject: &str,
        body: &str,
    ) -> impl Future<Output = Result<(), EngineError>> + Send;
}

// ---

/// Delivers notifications by POSTing JSON to the configured relay endpoint.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    // ---
    client: reqwest::Client,
    endpoint: String,
}

impl WebhookNotifier {
    pub fn new(endpoint: String) -> Self {
        WebhookNotifier {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

impl Notifier for WebhookNotifier {
    async fn send(&self, address: &str, subject: &str, body: &str) -> Result<(), EngineError> {
        // ---
        let payload = serde_json::json!({
            "to": address,
            "subject": subject,
            "body": body,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await?;
        response.error_for_status()?;

        tracing::debug!(address = %address, subject = %subject, "alert notification delivered");
        Ok(())
    }
}

// ---

/// Runtime notifier selection: webhook relay when configured, structured
/// no-op otherwise.
#[derive(Debug, Clone)]
pub enum AlertNotifier {
    Webhook(WebhookNotifier),
    Disabled,
}

impl AlertNotifier {
    /// Build from the optional relay endpoint in configuration.
    pub fn from_endpoint(endpoint: Option<String>) -> Self {
        match endpoint {
            Some(url) if !url.is_empty() => AlertNotifier::Webhook(WebhookNotifier::new(url)),
            _ => {
                tracing::info!("no alert webhook configured; notifications disabled");
                AlertNotifier::Disabled
            }
        }
    }
}

impl Notifier for AlertNotifier {
    async fn send(&self, address: &str, subject: &str, body: &str) -> Result<(), EngineError> {
        // ---
        match self {
            AlertNotifier::Webhook(webhook) => webhook.send(address, subject, body).await,
            AlertNotifier::Disabled => {
                tracing::debug!(
                    address = %address,
                    subject = %subject,
                    "notifications disabled, dropping alert message"
                );
                Ok(())
            }
        }
    }
}
