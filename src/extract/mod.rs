// src/extract/mod.rs
//! Candidate extraction from raw markup.
//!
//! Websites run three independent strategies whose outputs are concatenated
//! (not merged); near-duplicates are collapsed later by `analyze::dedup`:
//! 1. configured CSS selectors (`selector`)
//! 2. embedded schema.org JSON-LD (`jsonld`)
//! 3. generic article containers (`heuristic`)
//!
//! RSS sources are parsed as feeds instead (`rss`).
//! Parsing is best-effort: malformed markup never raises.

pub mod heuristic;
pub mod jsonld;
pub mod link;
pub mod rss;
pub mod selector;

use scraper::{ElementRef, Html};
use tracing::debug;

use crate::ingest::clean_text;
use crate::ingest::types::{Candidate, SourceConfig, SourceKind};
use crate::relevance::RelevanceScorer;

/// Summaries are cut to this many characters.
pub const SUMMARY_MAX_CHARS: usize = 200;

/// Run every strategy that applies to `source` over `markup`.
pub fn extract(markup: &str, source: &SourceConfig, scorer: &RelevanceScorer) -> Vec<Candidate> {
    let out = match source.kind {
        SourceKind::Rss => rss::extract(markup, source, scorer),
        SourceKind::Website => {
            let document = Html::parse_document(markup);
            let mut out = selector::extract(&document, source, scorer);
            out.extend(jsonld::extract(&document, source, scorer));
            out.extend(heuristic::extract(&document, source, scorer));
            out
        }
    };
    debug!(
        target: "ingest",
        source = %source.name,
        candidates = out.len(),
        "extraction finished"
    );
    out
}

/// Visible text of an element, whitespace-collapsed.
/// Text nodes come back entity-decoded, so no tag stripping happens here.
pub(crate) fn element_text(el: ElementRef<'_>) -> String {
    let raw: Vec<&str> = el.text().collect();
    clean_text(&raw.join(" "))
}
