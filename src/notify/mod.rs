// src/notify/mod.rs
//! Live updates: after each incident batch the monitor publishes one
//! [`LiveUpdate`] to an [`IncidentSink`]. Subscriber bookkeeping belongs to
//! the sink, never to the pipeline.

pub mod broadcast;
pub mod webhook;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::incident::Incident;

pub use broadcast::BroadcastHub;
pub use webhook::WebhookSink;

pub const FIRES_UPDATED: &str = "fires_updated";

/// Serializable batch pushed to live subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveUpdate {
    pub event: String,
    pub timestamp: String,
    pub incidents: Vec<Incident>,
}

impl LiveUpdate {
    pub fn fires_updated(incidents: Vec<Incident>) -> Self {
        Self {
            event: FIRES_UPDATED.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            incidents,
        }
    }
}

#[async_trait]
pub trait IncidentSink: Send + Sync {
    /// Returns how many receivers got the update (0 when nobody listens).
    async fn publish(&self, update: &LiveUpdate) -> Result<usize>;
    fn name(&self) -> &'static str;
}

pub type DynSink = Arc<dyn IncidentSink>;

/// Drops every update.
pub struct NullSink;

#[async_trait]
impl IncidentSink for NullSink {
    async fn publish(&self, _update: &LiveUpdate) -> Result<usize> {
        Ok(0)
    }
    fn name(&self) -> &'static str {
        "null"
    }
}

/// Publishes to every inner sink. Errors only when a sink failed and
/// nothing was delivered elsewhere.
pub struct Fanout {
    sinks: Vec<DynSink>,
}

impl Fanout {
    pub fn new(sinks: Vec<DynSink>) -> Self {
        Self { sinks }
    }
}

#[async_trait]
impl IncidentSink for Fanout {
    async fn publish(&self, update: &LiveUpdate) -> Result<usize> {
        let mut delivered = 0;
        let mut last_err = None;
        for sink in &self.sinks {
            match sink.publish(update).await {
                Ok(n) => delivered += n,
                Err(e) => {
                    warn!(sink = sink.name(), error = ?e, "live update sink failed");
                    last_err = Some(e);
                }
            }
        }
        match last_err {
            Some(e) if delivered == 0 => Err(e.context("live update reached no receiver")),
            _ => Ok(delivered),
        }
    }

    fn name(&self) -> &'static str {
        "fanout"
    }
}
