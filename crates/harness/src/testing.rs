//! Test doubles for the notification seam.

use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::notify::NotificationTransport;

/// Records every outbound call instead of touching the network.
pub struct RecordingTransport {
    calls: Mutex<Vec<(String, serde_json::Value)>>,
    status: u16,
    fail: bool,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { calls: Mutex::new(Vec::new()), status: 200, fail: false })
    }

    /// Responds with the given HTTP status.
    pub fn with_status(status: u16) -> Arc<Self> {
        Arc::new(Self { calls: Mutex::new(Vec::new()), status, fail: false })
    }

    /// Fails every delivery at the transport level.
    pub fn failing() -> Arc<Self> {
        Arc::new(Self { calls: Mutex::new(Vec::new()), status: 200, fail: true })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn calls(&self) -> Vec<(String, serde_json::Value)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl NotificationTransport for RecordingTransport {
    async fn post(&self, url: &str, payload: &serde_json::Value) -> anyhow::Result<u16> {
        self.calls.lock().push((url.to_string(), payload.clone()));
        if self.fail {
            return Err(anyhow!("transport unavailable"));
        }
        Ok(self.status)
    }
}
