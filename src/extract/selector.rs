// src/extract/selector.rs
use scraper::{Html, Selector};
use tracing::debug;

use crate::extract::element_text;
use crate::extract::link::resolve_link;
use crate::ingest::types::{Candidate, SourceConfig, PUBLISHED_UNKNOWN};
use crate::relevance::RelevanceScorer;

/// Prior for headline-selector hits.
pub const SELECTOR_CONFIDENCE: f64 = 0.8;

/// Node text must be longer than this to be considered a headline.
pub const MIN_NODE_CHARS: usize = 20;

/// Configured-selector strategy: relevant headline nodes with their nearest link.
pub fn extract(document: &Html, source: &SourceConfig, scorer: &RelevanceScorer) -> Vec<Candidate> {
    let mut out = Vec::new();
    for raw in source.effective_selectors() {
        let Ok(sel) = Selector::parse(&raw) else {
            debug!(target: "ingest", source = %source.name, selector = %raw, "invalid selector skipped");
            continue;
        };
        for node in document.select(&sel) {
            let text = element_text(node);
            if text.chars().count() <= MIN_NODE_CHARS || !scorer.is_relevant(&text) {
                continue;
            }
            let link = resolve_link(node, &source.url);
            let summary = format!("Fire-related news from {}", source.name);
            if let Some(c) = Candidate::new(
                &text,
                link,
                summary,
                PUBLISHED_UNKNOWN,
                &source.name,
                SELECTOR_CONFIDENCE,
            ) {
                out.push(c);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::keywords::Lexicon;

    #[test]
    fn keeps_long_relevant_headlines_only() {
        let html = r#"
<h1>Feu</h1>
<h2>Match nul au stade : un jeu sans flamme</h2>
<h3 class="headline">Incendie à Béjaïa : les pompiers mobilisés</h3>
<div class="title"><a href="/n/2">Wildfire near Oran forces evacuation</a></div>"#;
        let doc = Html::parse_document(html);
        let mut src = SourceConfig::website("APS", "https://aps.dz/");
        src.selectors = vec!["h1".into(), "h2".into(), "h3".into(), ".title".into(), "[[bad".into()];

        let out = extract(&doc, &src, &Lexicon::builtin().relevance);
        let titles: Vec<&str> = out.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Incendie à Béjaïa : les pompiers mobilisés",
                "Wildfire near Oran forces evacuation"
            ]
        );
        assert_eq!(out[0].link, "https://aps.dz/");
        assert_eq!(out[1].link, "https://aps.dz/n/2");
        assert_eq!(out[1].summary, "Fire-related news from APS");
        assert_eq!(out[1].published, "Recent");
    }
}
