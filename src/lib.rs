// src/lib.rs
// Public library surface for the service binary and integration tests.

pub mod api;
pub mod config;
pub mod gazetteer;
pub mod incident;
pub mod metrics;
pub mod monitor;
pub mod relevance;
pub mod store;

// Extraction strategies (selectors, JSON-LD, heuristics, RSS)
pub mod extract;

// Per-source pipeline, fetchers, source loading and the auto scheduler
pub mod ingest;

// Dedup, location, classification, AI enrichment
pub mod analyze;

// Live-update sinks
pub mod notify;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::incident::Incident;
pub use crate::monitor::Monitor;
