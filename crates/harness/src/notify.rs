//! Run summary notification.
//!
//! One webhook POST per run, after all scenario threads have joined.
//! Delivery is strictly best-effort: a disabled or unconfigured notifier
//! skips silently, and transport failures or non-2xx responses are logged
//! and swallowed. Notification health never fails or flakes the run.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use gridline_core::HarnessConfig;

use crate::run::RunSummary;

/// Delivery seam so tests can count outbound calls without a network.
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    /// Deliver `payload` to `url`, returning the HTTP status code.
    async fn post(&self, url: &str, payload: &serde_json::Value) -> anyhow::Result<u16>;
}

/// Production transport over an HTTP client.
pub struct WebhookTransport {
    client: reqwest::Client,
}

impl WebhookTransport {
    pub fn new() -> Self {
        Self { client: reqwest::Client::new() }
    }
}

impl Default for WebhookTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationTransport for WebhookTransport {
    async fn post(&self, url: &str, payload: &serde_json::Value) -> anyhow::Result<u16> {
        let response = self.client.post(url).json(payload).send().await?;
        Ok(response.status().as_u16())
    }
}

pub struct Notifier {
    enabled: bool,
    webhook_url: Option<String>,
    transport: Arc<dyn NotificationTransport>,
}

impl Notifier {
    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::with_transport(config, Arc::new(WebhookTransport::new()))
    }

    pub fn with_transport(
        config: &HarnessConfig,
        transport: Arc<dyn NotificationTransport>,
    ) -> Self {
        Self {
            enabled: config.notifications_enabled,
            webhook_url: config.webhook_url.clone(),
            transport,
        }
    }

    /// Send the run summary in one delivery attempt.
    pub async fn send(&self, summary: &RunSummary) {
        let Some(url) = self.webhook_url.as_deref().filter(|_| self.enabled) else {
            debug!(target = "gridline", "notifications disabled or unconfigured, skipping");
            return;
        };

        let payload = serde_json::json!({ "text": format_summary(summary) });
        match self.transport.post(url, &payload).await {
            Ok(status) if (200..300).contains(&status) => {
                debug!(target = "gridline", status, "notification delivered");
            }
            Ok(status) => {
                warn!(target = "gridline", status, "notification rejected");
            }
            Err(error) => {
                warn!(target = "gridline", %error, "notification delivery failed");
            }
        }
    }
}

/// Fixed-shape message: status, counts, duration, report link.
pub fn format_summary(summary: &RunSummary) -> String {
    let status = if summary.passed() { "PASSED" } else { "FAILED" };
    format!(
        "*Test Execution Summary*\n\
         Status: {status}\n\
         Total: {}\n\
         Passed: {}\n\
         Failed: {}\n\
         Skipped: {}\n\
         Duration: {}\n\
         Report: {}",
        summary.counters.total,
        summary.counters.passed,
        summary.counters.failed,
        summary.counters.skipped,
        summary.format_duration(),
        summary.report_url,
    )
}
