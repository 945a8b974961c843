// src/extract/rss.rs
use anyhow::{Context, Result};
use chrono::DateTime;
use quick_xml::de::from_str;
use serde::Deserialize;
use tracing::debug;

use crate::extract::jsonld::DATE_FORMAT;
use crate::extract::link::absolutize;
use crate::extract::SUMMARY_MAX_CHARS;
use crate::ingest::types::{Candidate, SourceConfig, PUBLISHED_UNKNOWN};
use crate::ingest::{normalize_text, truncate_chars};
use crate::relevance::RelevanceScorer;

/// Prior for feed items.
pub const RSS_CONFIDENCE: f64 = 0.8;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

fn format_pub_date(raw: &str) -> String {
    DateTime::parse_from_rfc2822(raw.trim())
        .map(|dt| dt.format(DATE_FORMAT).to_string())
        .unwrap_or_else(|_| raw.trim().to_string())
}

fn parse_items(markup: &str) -> Result<Vec<Item>> {
    let xml_clean = scrub_html_entities_for_xml(markup);
    let rss: Rss = from_str(&xml_clean).context("parsing rss xml")?;
    Ok(rss.channel.item)
}

/// Feed strategy. A feed that does not parse yields no candidates.
pub fn extract(markup: &str, source: &SourceConfig, scorer: &RelevanceScorer) -> Vec<Candidate> {
    let items = match parse_items(markup) {
        Ok(items) => items,
        Err(e) => {
            debug!(target: "ingest", source = %source.name, error = ?e, "feed not parsed");
            return Vec::new();
        }
    };

    let mut out = Vec::with_capacity(items.len());
    for it in items {
        let title = normalize_text(it.title.as_deref().unwrap_or_default());
        let summary = truncate_chars(
            &normalize_text(it.description.as_deref().unwrap_or_default()),
            SUMMARY_MAX_CHARS,
        );
        if !scorer.is_relevant(&format!("{title} {summary}")) {
            continue;
        }
        let link = it
            .link
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|l| absolutize(&source.url, l))
            .unwrap_or_else(|| source.url.clone());
        let published = it
            .pub_date
            .as_deref()
            .map(format_pub_date)
            .unwrap_or_else(|| PUBLISHED_UNKNOWN.to_string());
        if let Some(c) = Candidate::new(&title, link, summary, published, &source.name, RSS_CONFIDENCE) {
            out.push(c);
        }
    }
    out
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&laquo;", "\"")
        .replace("&raquo;", "\"")
        .replace("&rsquo;", "'")
        .replace("&eacute;", "é")
}
