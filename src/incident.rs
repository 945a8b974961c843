// src/incident.rs
//! Incident records: one per surviving candidate, ranked for display.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::analyze::ai_adapter::AiEnrichment;
use crate::analyze::classify::{Severity, Status};
use crate::analyze::location::UNRESOLVED_CONFIDENCE;
use crate::config::keywords::Lexicon;
use crate::gazetteer::{DEFAULT_LATITUDE, DEFAULT_LONGITUDE, UNKNOWN_REGION};
use crate::ingest::types::Candidate;

/// Default floor for the high-confidence view.
pub const HIGH_CONFIDENCE: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentLocation {
    pub lat: f64,
    pub lon: f64,
    pub wilaya: String,
    pub wilaya_code: Option<u8>,
}

impl IncidentLocation {
    /// Algiers centre, region "Unknown", no code.
    pub fn unknown() -> Self {
        Self {
            lat: DEFAULT_LATITUDE,
            lon: DEFAULT_LONGITUDE,
            wilaya: UNKNOWN_REGION.to_string(),
            wilaya_code: None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.wilaya_code.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub id: String,
    pub location: IncidentLocation,
    pub timestamp: String,
    pub severity: Severity,
    pub status: Status,
    pub description: String,
    pub link: String,
    pub source: String,
    /// Location confidence in `[0, 1]`; exactly 0.1 for the fallback location.
    pub confidence: f64,
    #[serde(flatten)]
    pub ai: AiEnrichment,
    #[serde(default)]
    pub ai_enhanced: bool,
}

/// `fire-` followed by 8 hex characters.
pub fn new_incident_id() -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("fire-{}", &hex[..8])
}

pub fn build_incident(candidate: Candidate, lexicon: &Lexicon) -> Incident {
    let title = candidate.title.as_str();
    let summary = candidate.summary.as_str();

    let (location, confidence) = match lexicon.locator.resolve(title, summary) {
        Some(m) => (
            IncidentLocation {
                lat: m.region.latitude,
                lon: m.region.longitude,
                wilaya: m.region.canonical_name.to_string(),
                wilaya_code: Some(m.region.code),
            },
            m.confidence,
        ),
        None => (IncidentLocation::unknown(), UNRESOLVED_CONFIDENCE),
    };

    Incident {
        id: new_incident_id(),
        location,
        timestamp: candidate.published.clone(),
        severity: lexicon.classifier.classify_severity(title, summary),
        status: lexicon.classifier.classify_status(title, summary),
        description: format!("{title}: {summary}"),
        link: candidate.link.clone(),
        source: candidate.source_name.clone(),
        confidence: confidence.clamp(0.0, 1.0),
        ai: candidate.ai_result.clone().unwrap_or_default(),
        ai_enhanced: candidate.ai_enhanced,
    }
}

/// Descending by confidence, then by timestamp compared as plain strings.
/// Stable, so equal keys keep input order.
pub fn rank(incidents: &mut [Incident]) {
    incidents.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| b.timestamp.cmp(&a.timestamp))
    });
}

/// Build and rank one incident per candidate.
pub fn assemble(candidates: Vec<Candidate>, lexicon: &Lexicon) -> Vec<Incident> {
    let mut incidents: Vec<Incident> = candidates
        .into_iter()
        .map(|c| build_incident(c, lexicon))
        .collect();
    rank(&mut incidents);
    incidents
}

/// Incidents located in `wilaya` (case-insensitive region name).
pub fn by_wilaya<'a>(incidents: &'a [Incident], wilaya: &str) -> Vec<&'a Incident> {
    let wanted = wilaya.trim().to_lowercase();
    incidents
        .iter()
        .filter(|i| i.location.wilaya.to_lowercase() == wanted)
        .collect()
}

pub fn high_confidence(incidents: &[Incident], min_confidence: f64) -> Vec<&Incident> {
    incidents
        .iter()
        .filter(|i| i.confidence >= min_confidence)
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FireStats {
    pub total_incidents: usize,
    pub by_severity: BTreeMap<String, usize>,
    pub by_status: BTreeMap<String, usize>,
    pub by_wilaya: BTreeMap<String, usize>,
    pub high_confidence_count: usize,
    pub average_confidence: f64,
}

impl FireStats {
    pub fn from_incidents(incidents: &[Incident]) -> Self {
        let mut stats = FireStats {
            total_incidents: incidents.len(),
            ..FireStats::default()
        };
        for i in incidents {
            *stats.by_severity.entry(i.severity.to_string()).or_default() += 1;
            *stats.by_status.entry(i.status.to_string()).or_default() += 1;
            *stats
                .by_wilaya
                .entry(i.location.wilaya.clone())
                .or_default() += 1;
            if i.confidence >= HIGH_CONFIDENCE {
                stats.high_confidence_count += 1;
            }
        }
        if !incidents.is_empty() {
            stats.average_confidence =
                incidents.iter().map(|i| i.confidence).sum::<f64>() / incidents.len() as f64;
        }
        stats
    }
}
