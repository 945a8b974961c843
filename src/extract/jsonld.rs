// src/extract/jsonld.rs
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

use crate::extract::link::absolutize;
use crate::extract::SUMMARY_MAX_CHARS;
use crate::ingest::types::{Candidate, SourceConfig, PUBLISHED_UNKNOWN};
use crate::ingest::{normalize_text, truncate_chars};
use crate::relevance::RelevanceScorer;

/// Prior for structured-data articles.
pub const JSONLD_CONFIDENCE: f64 = 0.9;

pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

static LD_JSON: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("ld+json selector")
});

const ARTICLE_TYPES: [&str; 2] = ["NewsArticle", "Article"];

fn is_article(item: &Value) -> bool {
    match item.get("@type") {
        Some(Value::String(t)) => ARTICLE_TYPES.contains(&t.as_str()),
        Some(Value::Array(ts)) => ts
            .iter()
            .filter_map(Value::as_str)
            .any(|t| ARTICLE_TYPES.contains(&t)),
        _ => false,
    }
}

fn str_field<'a>(item: &'a Value, key: &str) -> Option<&'a str> {
    item.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Normalize a schema.org date to `YYYY-MM-DD HH:MM`; unknown shapes pass through.
pub fn normalize_date(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format(DATE_FORMAT).to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return dt.format(DATE_FORMAT).to_string();
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(dt) = d.and_hms_opt(0, 0, 0) {
            return dt.format(DATE_FORMAT).to_string();
        }
    }
    raw.to_string()
}

fn candidate_from(item: &Value, source: &SourceConfig, scorer: &RelevanceScorer) -> Option<Candidate> {
    if !is_article(item) {
        return None;
    }
    let title = normalize_text(str_field(item, "headline").or_else(|| str_field(item, "name"))?);
    if !scorer.is_relevant(&title) {
        return None;
    }
    let link = str_field(item, "url")
        .map(|u| absolutize(&source.url, u))
        .unwrap_or_else(|| source.url.clone());
    let summary = str_field(item, "description")
        .map(|d| truncate_chars(&normalize_text(d), SUMMARY_MAX_CHARS))
        .unwrap_or_default();
    let published = ["datePublished", "dateModified", "dateCreated"]
        .iter()
        .find_map(|k| str_field(item, k))
        .map(normalize_date)
        .unwrap_or_else(|| PUBLISHED_UNKNOWN.to_string());

    Candidate::new(&title, link, summary, published, &source.name, JSONLD_CONFIDENCE)
}

/// Structured-data strategy: schema.org `NewsArticle`/`Article` blocks.
pub fn extract(document: &Html, source: &SourceConfig, scorer: &RelevanceScorer) -> Vec<Candidate> {
    let mut out = Vec::new();
    for script in document.select(&LD_JSON) {
        let body: String = script.text().collect();
        let value: Value = match serde_json::from_str(body.trim()) {
            Ok(v) => v,
            Err(e) => {
                debug!(target: "ingest", source = %source.name, error = %e, "skipping malformed ld+json");
                continue;
            }
        };
        // Arrays contribute their first element only.
        let item = match &value {
            Value::Array(items) => match items.first() {
                Some(first) => first,
                None => continue,
            },
            other => other,
        };
        if let Some(c) = candidate_from(item, source, scorer) {
            out.push(c);
        }
    }
    out
}
