// src/extract/heuristic.rs
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use crate::extract::link::resolve_link;
use crate::extract::{element_text, SUMMARY_MAX_CHARS};
use crate::ingest::truncate_chars;
use crate::ingest::types::{Candidate, SourceConfig, PUBLISHED_UNKNOWN};
use crate::relevance::RelevanceScorer;

/// Prior for generic container hits.
pub const HEURISTIC_CONFIDENCE: f64 = 0.7;

/// Container titles must be longer than this.
pub const MIN_TITLE_CHARS: usize = 15;

const CONTAINERS: [&str; 8] = [
    "article",
    ".article",
    ".post",
    ".news-item",
    ".story",
    ".entry",
    ".content-item",
    r#"[itemtype*="Article"]"#,
];

fn sel(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

static CONTAINER_SELECTORS: Lazy<Vec<Selector>> =
    Lazy::new(|| CONTAINERS.iter().map(|c| sel(c)).collect());
static TITLE: Lazy<Selector> = Lazy::new(|| {
    sel(r#"h1, h2, h3, .title, .headline, [class*="title"], [class*="headline"]"#)
});
static ANCHOR: Lazy<Selector> = Lazy::new(|| sel("a[href]"));
static SUMMARY: Lazy<Selector> = Lazy::new(|| sel("p, .summary, .excerpt, .description"));

/// Generic-container strategy: article-like blocks with a heading and a lead paragraph.
pub fn extract(document: &Html, source: &SourceConfig, scorer: &RelevanceScorer) -> Vec<Candidate> {
    let mut out = Vec::new();
    for container_sel in CONTAINER_SELECTORS.iter() {
        for container in document.select(container_sel) {
            let Some(title_el) = container.select(&TITLE).next() else {
                continue;
            };
            let title = element_text(title_el);
            if title.chars().count() <= MIN_TITLE_CHARS || !scorer.is_relevant(&title) {
                continue;
            }
            let link = container
                .select(&ANCHOR)
                .next()
                .map(|a| resolve_link(a, &source.url))
                .unwrap_or_else(|| source.url.clone());
            let summary = container
                .select(&SUMMARY)
                .next()
                .map(|p| truncate_chars(&element_text(p), SUMMARY_MAX_CHARS))
                .unwrap_or_default();
            if let Some(c) = Candidate::new(
                &title,
                link,
                summary,
                PUBLISHED_UNKNOWN,
                &source.name,
                HEURISTIC_CONFIDENCE,
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
    fn containers_with_relevant_titles() {
        let html = r#"
<div class="news-item">
  <span class="item-title">Incendie à Tizi Ouzou : 3 villages menacés</span>
  <a href="/tizi">lire</a>
  <p class="excerpt">La protection civile est sur place depuis ce matin.</p>
</div>
<div class="post"><h2>Résultats du match de football</h2></div>
<div class="story"><p>no heading here</p></div>"#;
        let doc = Html::parse_document(html);
        let src = SourceConfig::website("TSA", "https://tsa.dz/");
        let out = extract(&doc, &src, &Lexicon::builtin().relevance);
        assert_eq!(out.len(), 1);
        let c = &out[0];
        assert_eq!(c.title, "Incendie à Tizi Ouzou : 3 villages menacés");
        assert_eq!(c.link, "https://tsa.dz/tizi");
        assert_eq!(c.summary, "La protection civile est sur place depuis ce matin.");
        assert_eq!(c.confidence, 0.7);
    }

    #[test]
    fn long_summaries_are_cut() {
        let long = "feu ".repeat(100);
        let html = format!(
            "<article><h3>Grand feu de forêt à Médéa</h3><p>{long}</p></article>"
        );
        let doc = Html::parse_document(&html);
        let src = SourceConfig::website("X", "https://x.dz/");
        let out = extract(&doc, &src, &Lexicon::builtin().relevance);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].summary.chars().count(), 200);
        assert_eq!(out[0].link, "https://x.dz/");
    }
}
