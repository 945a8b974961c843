// src/ingest/types.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::analyze::ai_adapter::AiEnrichment;

/// Selectors used when a source does not configure its own.
pub const DEFAULT_SELECTORS: [&str; 5] = ["h1", "h2", "h3", ".title", ".headline"];

/// Candidates with shorter titles are never created.
pub const MIN_TITLE_CHARS: usize = 10;

/// Published marker for items without a usable date.
pub const PUBLISHED_UNKNOWN: &str = "Recent";

pub fn default_selectors() -> Vec<String> {
    DEFAULT_SELECTORS.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Website,
    Rss,
}

/// What the extractor needs to know about one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub url: String,
    #[serde(default, rename = "source_type")]
    pub kind: SourceKind,
    #[serde(default = "default_selectors")]
    pub selectors: Vec<String>,
}

impl SourceConfig {
    pub fn website(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            url: url.into(),
            kind: SourceKind::Website,
            selectors: default_selectors(),
        }
    }

    pub fn rss(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            kind: SourceKind::Rss,
            ..Self::website(name, url)
        }
    }

    /// Configured selectors, or the generic heading set when none are configured.
    pub fn effective_selectors(&self) -> Vec<String> {
        let configured: Vec<String> = self
            .selectors
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if configured.is_empty() {
            default_selectors()
        } else {
            configured
        }
    }
}

/// A candidate article, produced by one extraction strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub title: String,
    pub link: String,
    pub summary: String,
    /// `title + " " + summary`, used for scoring and enrichment.
    pub content: String,
    /// ISO-ish timestamp or free text such as "Recent".
    pub published: String,
    pub source_name: String,
    /// Strategy prior; may be overwritten by enrichment.
    pub confidence: f64,
    #[serde(default)]
    pub ai_enhanced: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_result: Option<AiEnrichment>,
}

impl Candidate {
    /// Returns `None` when the trimmed title is shorter than [`MIN_TITLE_CHARS`].
    pub fn new(
        title: &str,
        link: impl Into<String>,
        summary: impl Into<String>,
        published: impl Into<String>,
        source_name: &str,
        confidence: f64,
    ) -> Option<Self> {
        let title = title.trim();
        if title.chars().count() < MIN_TITLE_CHARS {
            return None;
        }
        let summary = summary.into();
        let content = format!("{title} {summary}");
        Some(Self {
            title: title.to_string(),
            link: link.into(),
            summary,
            content,
            published: published.into(),
            source_name: source_name.to_string(),
            confidence,
            ai_enhanced: false,
            ai_result: None,
        })
    }
}

/// Fetches raw markup for a source URL.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_titles_are_rejected() {
        assert!(Candidate::new("  Feu !  ", "l", "s", "Recent", "src", 0.8).is_none());
        let c = Candidate::new(" Incendie à Tipaza ", "l", "résumé", "Recent", "src", 0.8)
            .expect("long enough");
        assert_eq!(c.title, "Incendie à Tipaza");
        assert_eq!(c.content, "Incendie à Tipaza résumé");
        assert!(!c.ai_enhanced);
    }

    #[test]
    fn source_config_defaults() {
        let s: SourceConfig =
            serde_json::from_str(r#"{"name":"APS","url":"https://aps.dz"}"#).unwrap();
        assert_eq!(s.kind, SourceKind::Website);
        assert_eq!(s.selectors.len(), 5);

        let empty = SourceConfig {
            selectors: vec![" ".into()],
            ..SourceConfig::rss("Feed", "https://x.dz/rss")
        };
        assert_eq!(empty.kind, SourceKind::Rss);
        assert_eq!(empty.effective_selectors(), default_selectors());
    }
}
