// src/relevance.rs
//! Relevance gate: weighted multilingual keyword scoring with exclusion terms
//! and a small bonus for domain patterns ("<n> hectares ... burned").
//!
//! Scoring is additive and integer-valued:
//! - every critical keyword found adds `weights.critical` (+3)
//! - every medium keyword adds `weights.medium` (+2)
//! - every contextual keyword adds `weights.context` (+1)
//! - every exclusion term adds `weights.exclusion` (-5)
//! - every matching pattern adds `weights.pattern` (+2)
//!
//! Keywords match as case-insensitive substrings. Text shorter than
//! `min_length` characters is never relevant. Pure and deterministic.

use regex::Regex;
use serde::Deserialize;
use tracing::info;

pub const DEFAULT_RELEVANCE_THRESHOLD: i32 = 3;
pub const DEFAULT_MIN_LENGTH: usize = 10;

pub const ENV_DEV_LOG: &str = "FIRE_DEV_LOG";

// Dev logging gate: FIRE_DEV_LOG=1 AND dev env (debug or SHUTTLE_ENV in {local,development,dev})
pub(crate) fn dev_logging_enabled() -> bool {
    let on = std::env::var(ENV_DEV_LOG).ok().as_deref() == Some("1");
    if !on {
        return false;
    }
    if cfg!(debug_assertions) {
        return true;
    }
    matches!(
        std::env::var("SHUTTLE_ENV")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "local" | "development" | "dev"
    )
}

/// Short, stable, non-reversible id for a text (first 6 bytes of sha256, hex).
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

fn dev_log_relevance(event: &str, text: &str, rel: &Relevance, threshold: i32) {
    if !dev_logging_enabled() {
        return;
    }
    let id = anon_hash(text);
    let matched: Vec<&str> = rel.matched.iter().take(5).map(String::as_str).collect();
    // Never log raw text. Only hashed id + short lists.
    info!(
        target: "relevance",
        %id, score = rel.score, threshold, event,
        matched = ?matched
    );
}

/* ----------------------------
Config schema (from TOML)
---------------------------- */

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct Weights {
    pub critical: i32,
    pub medium: i32,
    pub context: i32,
    pub exclusion: i32,
    pub pattern: i32,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            critical: 3,
            medium: 2,
            context: 1,
            exclusion: -5,
            pattern: 2,
        }
    }
}

fn default_threshold() -> i32 {
    DEFAULT_RELEVANCE_THRESHOLD
}
fn default_min_length() -> usize {
    DEFAULT_MIN_LENGTH
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelevanceSection {
    #[serde(default = "default_threshold")]
    pub threshold: i32,
    #[serde(default = "default_min_length")]
    pub min_length: usize,
    #[serde(default)]
    pub weights: Weights,
    #[serde(default)]
    pub critical: Vec<String>,
    #[serde(default)]
    pub medium: Vec<String>,
    #[serde(default)]
    pub context: Vec<String>,
    #[serde(default)]
    pub exclusion: Vec<String>,
    /// Regexes evaluated against the lowercased text.
    #[serde(default)]
    pub patterns: Vec<String>,
}

/// Result of relevance evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relevance {
    pub score: i32,
    /// Keywords and pattern ids that contributed, in evaluation order.
    pub matched: Vec<String>,
}

/// Compiled scorer.
#[derive(Debug, Clone)]
pub struct RelevanceScorer {
    threshold: i32,
    min_length: usize,
    weights: Weights,
    critical: Vec<String>,
    medium: Vec<String>,
    context: Vec<String>,
    exclusion: Vec<String>,
    patterns: Vec<Regex>,
}

fn lowered(list: &[String]) -> Vec<String> {
    list.iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

impl RelevanceScorer {
    pub fn new(cfg: &RelevanceSection) -> anyhow::Result<Self> {
        let patterns = cfg
            .patterns
            .iter()
            .enumerate()
            .map(|(i, p)| {
                Regex::new(p).map_err(|e| anyhow::anyhow!("relevance pattern #{i} regex error: {e}"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self {
            threshold: cfg.threshold,
            min_length: cfg.min_length,
            weights: cfg.weights,
            critical: lowered(&cfg.critical),
            medium: lowered(&cfg.medium),
            context: lowered(&cfg.context),
            exclusion: lowered(&cfg.exclusion),
            patterns,
        })
    }

    pub fn threshold(&self) -> i32 {
        self.threshold
    }

    /// Full evaluation: score plus the terms that produced it.
    pub fn evaluate(&self, text: &str) -> Relevance {
        let lower = text.to_lowercase();
        let mut rel = Relevance::default();

        let tiers: [(&[String], i32); 4] = [
            (&self.critical, self.weights.critical),
            (&self.medium, self.weights.medium),
            (&self.context, self.weights.context),
            (&self.exclusion, self.weights.exclusion),
        ];
        for (keywords, weight) in tiers {
            for kw in keywords {
                if lower.contains(kw.as_str()) {
                    rel.score += weight;
                    rel.matched.push(kw.clone());
                }
            }
        }

        for (i, re) in self.patterns.iter().enumerate() {
            if re.is_match(&lower) {
                rel.score += self.weights.pattern;
                rel.matched.push(format!("pattern:{i}"));
            }
        }

        rel
    }

    pub fn score(&self, text: &str) -> i32 {
        self.evaluate(text).score
    }

    /// `score(text) >= threshold`, and never true for very short text.
    pub fn is_relevant(&self, text: &str) -> bool {
        if text.trim().chars().count() < self.min_length {
            return false;
        }
        let rel = self.evaluate(text);
        let pass = rel.score >= self.threshold;
        dev_log_relevance(
            if pass { "passed" } else { "rejected" },
            text,
            &rel,
            self.threshold,
        );
        pass
    }
}

/* ----------------------------
Tests
---------------------------- */
