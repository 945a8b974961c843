// src/analyze/location.rs
//! Gazetteer-based location resolution.
//!
//! Confidence model (in tenths, capped at 10):
//! - any word-boundary match of a region name: 7
//! - the matched name also appears in the title: +2
//! - the matched name is the canonical name: +1
//! - the text carries a fire/emergency context term: +1
//!
//! The best match wins; equal scores keep the first region in code order.

use regex::Regex;
use serde::Deserialize;

use crate::gazetteer::{regions, Region};

/// Confidence given to incidents that fall back to the default location.
pub const UNRESOLVED_CONFIDENCE: f64 = 0.1;

const BASE_TENTHS: u8 = 7;
const TITLE_BONUS: u8 = 2;
const CANONICAL_BONUS: u8 = 1;
const CONTEXT_BONUS: u8 = 1;
const MAX_TENTHS: u8 = 10;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationSection {
    /// Terms that make a region mention more credible as an incident location.
    #[serde(default)]
    pub context: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationMatch {
    pub region: &'static Region,
    /// The region name that matched, lowercased.
    pub matched_name: String,
    pub confidence: f64,
}

#[derive(Debug, Clone)]
struct NamePattern {
    region: &'static Region,
    lowered: String,
    canonical: bool,
    re: Regex,
}

#[derive(Debug, Clone)]
pub struct LocationResolver {
    names: Vec<NamePattern>,
    context: Vec<String>,
}

impl LocationResolver {
    pub fn new(cfg: &LocationSection) -> anyhow::Result<Self> {
        let mut names = Vec::new();
        for region in regions() {
            let canonical = region.canonical_name.to_lowercase();
            for name in region.names() {
                let lowered = name.to_lowercase();
                let re = Regex::new(&format!(r"\b{}\b", regex::escape(&lowered))).map_err(|e| {
                    anyhow::anyhow!("region name pattern for {:?}: {e}", region.canonical_name)
                })?;
                names.push(NamePattern {
                    region,
                    canonical: lowered == canonical,
                    lowered,
                    re,
                });
            }
        }
        let context = cfg
            .context
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Ok(Self { names, context })
    }

    /// Best region mention in `title` + `summary`, if any.
    pub fn resolve(&self, title: &str, summary: &str) -> Option<LocationMatch> {
        let title_lower = title.to_lowercase();
        let text = format!("{title} {summary}").to_lowercase();
        let has_context = self.context.iter().any(|t| text.contains(t.as_str()));

        let mut best: Option<(u8, &NamePattern)> = None;
        for np in &self.names {
            if !np.re.is_match(&text) {
                continue;
            }
            let mut tenths = BASE_TENTHS;
            if title_lower.contains(np.lowered.as_str()) {
                tenths += TITLE_BONUS;
            }
            if np.canonical {
                tenths += CANONICAL_BONUS;
            }
            if has_context {
                tenths += CONTEXT_BONUS;
            }
            let tenths = tenths.min(MAX_TENTHS);
            if best.map_or(true, |(b, _)| tenths > b) {
                best = Some((tenths, np));
            }
        }

        best.map(|(tenths, np)| LocationMatch {
            region: np.region,
            matched_name: np.lowered.clone(),
            confidence: f64::from(tenths) / 10.0,
        })
    }

    /// Canonical region name and confidence; `(None, 0.0)` when nothing matches.
    pub fn resolve_name(&self, title: &str, summary: &str) -> (Option<&'static str>, f64) {
        match self.resolve(title, summary) {
            Some(m) => (Some(m.region.canonical_name), m.confidence),
            None => (None, 0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> LocationResolver {
        LocationResolver::new(&LocationSection {
            context: vec!["incendie".into(), "حريق".into(), "fire".into()],
        })
        .unwrap()
    }

    #[test]
    fn confidence_components() {
        let r = resolver();
        // canonical, summary only, no context
        assert_eq!(r.resolve_name("Vague de chaleur", "Températures record à Annaba"), (Some("Annaba"), 0.8));
        // canonical in title with context
        assert_eq!(r.resolve_name("Incendie à Annaba", ""), (Some("Annaba"), 1.0));
        // alias in title, no context
        assert_eq!(r.resolve_name("Canicule à Setif", ""), (Some("Sétif"), 0.9));
        // Arabic alias in summary with context
        assert_eq!(r.resolve_name("خبر عاجل", "حريق في وهران"), (Some("Oran"), 0.8));
    }

    #[test]
    fn word_boundaries_are_respected() {
        let r = resolver();
        assert_eq!(r.resolve_name("Les oranges sont chères cette année", ""), (None, 0.0));
    }

    #[test]
    fn ties_prefer_gazetteer_order() {
        let r = resolver();
        let m = r.resolve("Incendie entre Blida et Médéa", "").unwrap();
        assert_eq!(m.region.canonical_name, "Blida");
        assert_eq!(m.confidence, 1.0);
    }

    #[test]
    fn higher_confidence_beats_order() {
        let r = resolver();
        // Adrar only in summary, Oran in title
        let m = r.resolve("Feu signalé à Oran", "Rien à Adrar").unwrap();
        assert_eq!(m.region.canonical_name, "Oran");
        assert_eq!(m.matched_name, "oran");
    }
}
