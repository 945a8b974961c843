// src/ingest/mod.rs
//! Per-source scraping pipeline.
//!
//! fetch (bounded by [`FETCH_TIMEOUT`]) → extract → dedupe → optional AI
//! enrichment → rank → cap at [`MAX_CANDIDATES_PER_SOURCE`].
//! A failing source yields an empty outcome with its error; it never aborts
//! the batch.

pub mod fetch;
pub mod scheduler;
pub mod types;

use std::time::{Duration, Instant};

use futures::future::join_all;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing::{info, warn};

use crate::analyze::ai_adapter::{enrich, DynEnrichment};
use crate::analyze::dedup::dedupe;
use crate::config::keywords::Lexicon;
use crate::extract::extract;
use crate::ingest::types::{Candidate, PageFetcher, SourceConfig};

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(15);
pub const MAX_CANDIDATES_PER_SOURCE: usize = 10;

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "scrape_candidates_total",
            "Candidates kept per source after dedup, enrichment and capping."
        );
        describe_counter!(
            "scrape_source_errors_total",
            "Sources that failed to fetch or timed out."
        );
        describe_counter!(
            "enrich_failures_total",
            "Enrichment calls that failed and fell back to raw candidates."
        );
        describe_counter!(
            "incidents_emitted_total",
            "Incidents published to the live-update sink."
        );
        describe_counter!("scrape_runs_total", "Auto-mode refresh ticks that scraped.");
        describe_gauge!("scrape_last_run_ts", "Unix ts of the last auto-mode refresh.");
        describe_histogram!("scrape_source_ms", "Per-source pipeline time in milliseconds.");
    });
}

/// Normalize raw markup text: decode entities, strip tags, then [`clean_text`].
pub fn normalize_text(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s);

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
    clean_text(&re_tags.replace_all(&decoded, ""))
}

/// Unify quotes, collapse whitespace and cap at 1500 chars.
///
/// For text that is already decoded (DOM text nodes): literal `<` and `>`
/// are content here, not markup.
pub fn clean_text(s: &str) -> String {
    // “ ” ‘ ’ « » to ASCII quotes
    let out = s
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").expect("ws regex"));
    let out = re_ws.replace_all(&out, " ");

    truncate_chars(out.trim(), 1500)
}

/// First `max` characters of `s` (char-boundary safe, no ellipsis).
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrapeStatus {
    Success,
    Error,
}

/// What one source produced in one run.
#[derive(Debug, Clone)]
pub struct SourceOutcome {
    pub source_id: Option<i64>,
    pub source_name: String,
    pub candidates: Vec<Candidate>,
    pub status: ScrapeStatus,
    pub error: Option<String>,
    pub duration: Duration,
    pub ai_enhanced: bool,
}

/// Extraction plus near-duplicate suppression for one fetched document.
pub fn candidates_from_document(markup: &str, source: &SourceConfig, lexicon: &Lexicon) -> Vec<Candidate> {
    dedupe(extract(markup, source, &lexicon.relevance))
}

/// Optional enrichment, then rank by prior and cap.
///
/// Returns the kept candidates and whether enrichment succeeded.
pub async fn refine(
    candidates: Vec<Candidate>,
    ai: &DynEnrichment,
    use_ai: bool,
) -> (Vec<Candidate>, bool) {
    let (mut kept, enhanced) = if use_ai && !candidates.is_empty() && ai.is_available() {
        let outcome = enrich(ai, candidates).await;
        (outcome.candidates, outcome.enhanced)
    } else {
        (candidates, false)
    };
    kept.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    kept.truncate(MAX_CANDIDATES_PER_SOURCE);
    (kept, enhanced)
}

/// Full per-source pipeline. Never fails; errors are folded into the outcome.
pub async fn scrape_source(
    fetcher: &dyn PageFetcher,
    source: &SourceConfig,
    lexicon: &Lexicon,
    ai: &DynEnrichment,
    use_ai: bool,
    timeout: Duration,
) -> SourceOutcome {
    ensure_metrics_described();
    let t0 = Instant::now();

    let fetched = match tokio::time::timeout(timeout, fetcher.fetch(&source.url)).await {
        Ok(Ok(body)) => Ok(body),
        Ok(Err(e)) => Err(format!("{e:#}")),
        Err(_) => Err(format!("timed out after {}s", timeout.as_secs_f64())),
    };

    let outcome = match fetched {
        Ok(body) => {
            let candidates = candidates_from_document(&body, source, lexicon);
            let (candidates, ai_enhanced) = refine(candidates, ai, use_ai).await;
            counter!("scrape_candidates_total").increment(candidates.len() as u64);
            info!(
                target: "ingest",
                source = %source.name,
                fetcher = fetcher.name(),
                kept = candidates.len(),
                ai_enhanced,
                "source scraped"
            );
            SourceOutcome {
                source_id: source.id,
                source_name: source.name.clone(),
                candidates,
                status: ScrapeStatus::Success,
                error: None,
                duration: t0.elapsed(),
                ai_enhanced,
            }
        }
        Err(msg) => {
            warn!(target: "ingest", source = %source.name, url = %source.url, error = %msg, "source failed");
            counter!("scrape_source_errors_total").increment(1);
            SourceOutcome {
                source_id: source.id,
                source_name: source.name.clone(),
                candidates: Vec::new(),
                status: ScrapeStatus::Error,
                error: Some(msg),
                duration: t0.elapsed(),
                ai_enhanced: false,
            }
        }
    };

    histogram!("scrape_source_ms").record(outcome.duration.as_secs_f64() * 1_000.0);
    outcome
}

/// Scrape every source concurrently; outcomes keep the order of `sources`.
pub async fn scrape_all(
    fetcher: &dyn PageFetcher,
    sources: &[SourceConfig],
    lexicon: &Lexicon,
    ai: &DynEnrichment,
    use_ai: bool,
    timeout: Duration,
) -> Vec<SourceOutcome> {
    join_all(
        sources
            .iter()
            .map(|s| scrape_source(fetcher, s, lexicon, ai, use_ai, timeout)),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::ai_adapter::{DisabledService, MockEnrichment};
    use crate::ingest::fetch::StaticFetcher;
    use std::sync::Arc;

    fn article(title: &str, href: &str) -> String {
        format!(r#"<article><h2><a href="{href}">{title}</a></h2><p>Les pompiers sont sur place.</p></article>"#)
    }

    #[test]
    fn normalize_text_collapses_ws_and_keeps_punct() {
        let s = "  Hello,&nbsp;&nbsp; <b>world</b>!  ";
        assert_eq!(normalize_text(s), "Hello, world!");
        assert_eq!(normalize_text("«feu»"), "\"feu\"");
    }

    #[test]
    fn clean_text_keeps_literal_angle_brackets() {
        assert_eq!(
            clean_text("vent <  60 km/h  et  > 45 degrés"),
            "vent < 60 km/h et > 45 degrés"
        );
        assert_eq!(clean_text("“feu”  à\n Oran"), "\"feu\" à Oran");
        // raw markup still gets stripped
        assert_eq!(normalize_text("vent &lt;b&gt;fort&lt;/b&gt;"), "vent fort");
    }

    #[test]
    fn truncate_is_char_safe() {
        assert_eq!(truncate_chars("حريق كبير", 4), "حريق");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[tokio::test]
    async fn failing_source_is_isolated() {
        let ok = SourceConfig::website("OK", "https://ok.dz/");
        let bad = SourceConfig::website("Bad", "https://bad.dz/");
        let fetcher = StaticFetcher::new()
            .with_page("https://ok.dz/", article("Incendie de forêt à Khenchela", "/k"));
        let ai: DynEnrichment = Arc::new(DisabledService);

        let out = scrape_all(
            &fetcher,
            &[bad, ok],
            Lexicon::builtin(),
            &ai,
            true,
            FETCH_TIMEOUT,
        )
        .await;

        assert_eq!(out[0].status, ScrapeStatus::Error);
        assert!(out[0].candidates.is_empty());
        assert!(out[0].error.as_deref().unwrap_or_default().contains("404"));
        assert_eq!(out[1].status, ScrapeStatus::Success);
        // selector + container hits collapse into one
        assert_eq!(out[1].candidates.len(), 1);
        assert!(!out[1].ai_enhanced);
    }

    #[tokio::test]
    async fn refine_caps_and_applies_ai_floor() {
        let mk = |i: usize, conf: f64| {
            Candidate::new(&format!("Incendie numéro {i} signalé"), "l", "", "Recent", "s", conf)
                .unwrap()
        };
        let many: Vec<Candidate> = (0..14).map(|i| mk(i, 0.5 + i as f64 / 100.0)).collect();
        let disabled: DynEnrichment = Arc::new(DisabledService);
        let (kept, enhanced) = refine(many.clone(), &disabled, true).await;
        assert_eq!(kept.len(), MAX_CANDIDATES_PER_SOURCE);
        assert!(!enhanced);
        assert_eq!(kept[0].title, "Incendie numéro 13 signalé");

        let low: DynEnrichment = Arc::new(MockEnrichment::with_confidence(0.2));
        let (kept, enhanced) = refine(many, &low, true).await;
        assert!(enhanced);
        assert!(kept.is_empty());
    }
}
