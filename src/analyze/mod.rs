// src/analyze/mod.rs
//! Post-extraction analysis: duplicate suppression, location resolution,
//! severity/status classification and the optional AI enrichment pass.

pub mod ai_adapter;
pub mod classify;
pub mod dedup;
pub mod location;

// Re-export convenient types.
pub use crate::analyze::ai_adapter::{
    build_service_from_config, enrich, AiEnrichment, DynEnrichment, EnrichmentService,
};
pub use crate::analyze::classify::{Classifier, Severity, Status};
pub use crate::analyze::dedup::dedupe;
pub use crate::analyze::location::{LocationMatch, LocationResolver, UNRESOLVED_CONFIDENCE};
