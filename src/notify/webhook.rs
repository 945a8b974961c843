// src/notify/webhook.rs
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::{IncidentSink, LiveUpdate};

/// Posts each batch as JSON to a fixed URL. One attempt per batch, no retry.
#[derive(Clone)]
pub struct WebhookSink {
    url: String,
    client: Client,
    timeout: Duration,
}

impl WebhookSink {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: Client::new(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }
}

#[async_trait]
impl IncidentSink for WebhookSink {
    async fn publish(&self, update: &LiveUpdate) -> Result<usize> {
        let rsp = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(update)
            .send()
            .await
            .map_err(|e| anyhow!("webhook request failed: {e}"))?;
        rsp.error_for_status_ref()
            .map_err(|e| anyhow!("webhook HTTP error: {e}"))?;
        Ok(1)
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}
