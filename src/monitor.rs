// src/monitor.rs
//! Service object tying the pipeline to its collaborators: page fetcher,
//! keyword lexicon, enrichment service and live-update sink.

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::counter;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::analyze::ai_adapter::DynEnrichment;
use crate::config::keywords::LexiconHandle;
use crate::incident::{assemble, Incident, HIGH_CONFIDENCE};
use crate::ingest::types::{PageFetcher, SourceConfig};
use crate::ingest::{scrape_all, ScrapeStatus, SourceOutcome, FETCH_TIMEOUT};
use crate::notify::{DynSink, LiveUpdate};

const AI_CAPABILITIES: [&str; 6] = [
    "Fire incident classification",
    "Content relevance scoring",
    "Entity extraction (location, damage, casualties)",
    "Multi-language support (Arabic, French, English)",
    "Automatic summarization",
    "Urgency level assessment",
];

/// Per-source line of a manual scrape report.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeResult {
    pub source_id: Option<i64>,
    pub source_name: String,
    pub articles_found: usize,
    pub status: ScrapeStatus,
    pub error: Option<String>,
    pub duration_seconds: f64,
    pub ai_enhanced: bool,
    pub ai_confidence_avg: Option<f64>,
}

impl From<&SourceOutcome> for ScrapeResult {
    fn from(o: &SourceOutcome) -> Self {
        let ai_scores: Vec<f64> = o
            .candidates
            .iter()
            .filter(|c| c.ai_enhanced)
            .map(|c| c.confidence)
            .collect();
        let ai_confidence_avg = if ai_scores.is_empty() {
            None
        } else {
            Some(ai_scores.iter().sum::<f64>() / ai_scores.len() as f64)
        };
        Self {
            source_id: o.source_id,
            source_name: o.source_name.clone(),
            articles_found: o.candidates.len(),
            status: o.status,
            error: o.error.clone(),
            duration_seconds: o.duration.as_secs_f64(),
            ai_enhanced: o.ai_enhanced,
            ai_confidence_avg,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ManualScrapeResponse {
    pub total_articles: usize,
    pub results: Vec<ScrapeResult>,
    pub duration_seconds: f64,
    pub ai_analysis_used: bool,
    pub high_confidence_articles: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AiStatus {
    pub ai_available: bool,
    pub service_name: String,
    pub capabilities: Vec<String>,
    pub fallback_active: bool,
}

pub struct Monitor {
    fetcher: Arc<dyn PageFetcher>,
    lexicon: LexiconHandle,
    ai: DynEnrichment,
    sink: DynSink,
    fetch_timeout: Duration,
}

impl Monitor {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        lexicon: LexiconHandle,
        ai: DynEnrichment,
        sink: DynSink,
    ) -> Self {
        Self {
            fetcher,
            lexicon,
            ai,
            sink,
            fetch_timeout: FETCH_TIMEOUT,
        }
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn lexicon(&self) -> &LexiconHandle {
        &self.lexicon
    }

    /// Run the per-source pipeline for every source concurrently.
    pub async fn scrape(&self, sources: &[SourceConfig], use_ai: bool) -> Vec<SourceOutcome> {
        let lexicon = self.lexicon.snapshot();
        scrape_all(
            self.fetcher.as_ref(),
            sources,
            &lexicon,
            &self.ai,
            use_ai,
            self.fetch_timeout,
        )
        .await
    }

    /// Scrape and assemble a ranked incident batch. Publishes nothing.
    pub async fn collect_incidents(&self, sources: &[SourceConfig]) -> Vec<Incident> {
        let use_ai = self.ai.is_available();
        let outcomes = self.scrape(sources, use_ai).await;
        let candidates = outcomes.into_iter().flat_map(|o| o.candidates).collect();
        let lexicon = self.lexicon.snapshot();
        assemble(candidates, &lexicon)
    }

    /// Collect incidents and push them to the live-update sink.
    pub async fn refresh(&self, sources: &[SourceConfig]) -> Vec<Incident> {
        let incidents = self.collect_incidents(sources).await;
        self.publish(&incidents).await;
        incidents
    }

    /// Incidents count as emitted only once some receiver got the batch.
    async fn publish(&self, incidents: &[Incident]) -> usize {
        let update = LiveUpdate::fires_updated(incidents.to_vec());
        match self.sink.publish(&update).await {
            Ok(0) => {
                debug!(sink = self.sink.name(), "live update had no receivers");
                0
            }
            Ok(n) => {
                counter!("incidents_emitted_total").increment(incidents.len() as u64);
                n
            }
            Err(e) => {
                warn!(sink = self.sink.name(), error = ?e, "live update not delivered");
                0
            }
        }
    }

    /// On-demand scrape with a per-source report. AI is used when available.
    pub async fn manual_scrape(&self, sources: &[SourceConfig]) -> ManualScrapeResponse {
        let t0 = Instant::now();
        let use_ai = self.ai.is_available();
        let outcomes = self.scrape(sources, use_ai).await;

        let results: Vec<ScrapeResult> = outcomes.iter().map(ScrapeResult::from).collect();
        let total_articles: usize = results.iter().map(|r| r.articles_found).sum();
        let high_confidence_articles = outcomes
            .iter()
            .flat_map(|o| o.candidates.iter())
            .filter(|c| c.confidence >= HIGH_CONFIDENCE)
            .count();

        if total_articles > 0 {
            let candidates = outcomes.into_iter().flat_map(|o| o.candidates).collect();
            let lexicon = self.lexicon.snapshot();
            let incidents = assemble(candidates, &lexicon);
            self.publish(&incidents).await;
        }

        info!(
            target: "ingest",
            sources = sources.len(),
            total_articles,
            high_confidence_articles,
            ai = use_ai,
            "manual scrape finished"
        );

        ManualScrapeResponse {
            total_articles,
            results,
            duration_seconds: t0.elapsed().as_secs_f64(),
            ai_analysis_used: use_ai,
            high_confidence_articles,
        }
    }

    pub fn ai_status(&self) -> AiStatus {
        let available = self.ai.is_available();
        AiStatus {
            ai_available: available,
            service_name: self.ai.service_name().to_string(),
            capabilities: if available {
                AI_CAPABILITIES.iter().map(|c| c.to_string()).collect()
            } else {
                Vec::new()
            },
            fallback_active: !available,
        }
    }
}
