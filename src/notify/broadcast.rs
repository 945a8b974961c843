// src/notify/broadcast.rs
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;

use super::{IncidentSink, LiveUpdate};

pub const DEFAULT_CAPACITY: usize = 16;

/// In-process fan-out to live subscribers (e.g. websocket sessions).
///
/// Owned by the serving layer; dropping the hub closes every subscription.
#[derive(Clone)]
pub struct BroadcastHub {
    tx: broadcast::Sender<LiveUpdate>,
}

impl BroadcastHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LiveUpdate> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl IncidentSink for BroadcastHub {
    async fn publish(&self, update: &LiveUpdate) -> Result<usize> {
        // No subscribers is not an error, just zero deliveries.
        match self.tx.send(update.clone()) {
            Ok(n) => {
                debug!(subscribers = n, incidents = update.incidents.len(), "live update sent");
                Ok(n)
            }
            Err(_) => {
                debug!("live update dropped: no subscribers");
                Ok(0)
            }
        }
    }

    fn name(&self) -> &'static str {
        "broadcast"
    }
}
