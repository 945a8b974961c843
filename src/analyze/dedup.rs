// src/analyze/dedup.rs
//! Near-duplicate suppression by title word overlap.
//!
//! Candidates are walked in descending prior confidence (stable on ties),
//! so the best-scored member of each cluster is the one that survives.

use std::collections::HashSet;

use crate::ingest::types::Candidate;

/// Titles whose word overlap exceeds this ratio are duplicates.
pub const DUPLICATE_OVERLAP: f64 = 0.8;

fn word_set(title: &str) -> HashSet<String> {
    title
        .trim()
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn overlap(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let denom = a.len().max(b.len());
    if denom == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / denom as f64
}

/// `|A ∩ B| / max(|A|, |B|)` over lowercase word sets.
pub fn title_overlap(a: &str, b: &str) -> f64 {
    overlap(&word_set(a), &word_set(b))
}

pub fn dedupe(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut seen: Vec<HashSet<String>> = Vec::new();
    let mut out = Vec::with_capacity(candidates.len());
    for c in candidates {
        let words = word_set(&c.title);
        if seen.iter().any(|s| overlap(&words, s) > DUPLICATE_OVERLAP) {
            continue;
        }
        seen.push(words);
        out.push(c);
    }
    out
}
