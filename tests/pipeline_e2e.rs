// tests/pipeline_e2e.rs
//
// Source markup in, ranked incidents out. No network: pages are served by
// StaticFetcher (or a local PageFetcher) and enrichment by MockEnrichment.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;

use fire_incident_monitor::analyze::ai_adapter::{AiEnrichment, DisabledService, MockEnrichment};
use fire_incident_monitor::analyze::{DynEnrichment, Severity, Status};
use fire_incident_monitor::config::keywords::{Lexicon, LexiconHandle};
use fire_incident_monitor::incident::Incident;
use fire_incident_monitor::ingest::fetch::StaticFetcher;
use fire_incident_monitor::ingest::types::{PageFetcher, SourceConfig};
use fire_incident_monitor::ingest::{scrape_all, ScrapeStatus};
use fire_incident_monitor::notify::NullSink;
use fire_incident_monitor::Monitor;

const SETIF_PAGE: &str = r#"<html><head>
<script type="application/ld+json">
{"@context":"https://schema.org","@type":"NewsArticle",
 "headline":"Incendie à Sétif : évacuation en cours",
 "url":"/regions/setif-incendie",
 "description":"La protection civile a déployé plusieurs unités.",
 "datePublished":"2025-08-03T09:15:00Z"}
</script></head><body><p>Bulletin régional</p></body></html>"#;

const MIXED_PAGE: &str = r#"<html><body>
<article>
  <h2><a href="/n/1">Incendie de forêt à Tipaza : 40 hectares ravagés</a></h2>
  <p>Les pompiers luttent contre les flammes depuis la nuit.</p>
</article>
<article>
  <h2><a href="/n/2">Feu de broussailles maîtrisé près de Médéa</a></h2>
  <p>Aucune victime n'est à déplorer.</p>
</article>
<article>
  <h2><a href="/n/3">Le championnat reprend ce week-end</a></h2>
  <p>Match d'ouverture samedi.</p>
</article>
</body></html>"#;

const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Régions</title>
<item>
  <title>Wildfire in Bejaia forces evacuation of villages</title>
  <link>https://feed.dz/bejaia</link>
  <description>Firefighters were deployed overnight.</description>
  <pubDate>Sat, 02 Aug 2025 18:00:00 +0100</pubDate>
</item>
<item>
  <title>Football: local derby ends in a draw</title>
  <link>https://feed.dz/derby</link>
  <description>Le match s'est terminé sur un nul.</description>
</item>
</channel></rss>"#;

fn monitor_with(fetcher: StaticFetcher, ai: DynEnrichment) -> Monitor {
    Monitor::new(
        Arc::new(fetcher),
        LexiconHandle::new(Lexicon::embedded().expect("embedded lexicon")),
        ai,
        Arc::new(NullSink),
    )
}

fn fetcher() -> StaticFetcher {
    StaticFetcher::new()
        .with_page("https://setif.news.dz/", SETIF_PAGE)
        .with_page("https://mixed.news.dz/", MIXED_PAGE)
        .with_page("https://feed.dz/rss", FEED)
}

#[tokio::test]
async fn structured_data_article_becomes_one_incident() {
    let m = monitor_with(fetcher(), Arc::new(DisabledService));
    let incidents = m
        .collect_incidents(&[SourceConfig::website("Sétif Info", "https://setif.news.dz/")])
        .await;

    assert_eq!(incidents.len(), 1);
    let inc = &incidents[0];
    assert_eq!(inc.location.wilaya, "Sétif");
    assert_eq!(inc.location.wilaya_code, Some(19));
    assert_eq!(inc.severity, Severity::Critical);
    assert_eq!(inc.status, Status::Active);
    assert!(inc.confidence >= 0.9);
    assert_eq!(inc.timestamp, "2025-08-03 09:15");
    assert_eq!(inc.link, "https://setif.news.dz/regions/setif-incendie");
    assert_eq!(inc.source, "Sétif Info");
    assert_eq!(
        inc.description,
        "Incendie à Sétif : évacuation en cours: La protection civile a déployé plusieurs unités."
    );
    assert!(inc.id.starts_with("fire-"));
}

#[tokio::test]
async fn irrelevant_items_are_dropped_and_results_ranked() {
    let m = monitor_with(fetcher(), Arc::new(DisabledService));
    let incidents = m
        .collect_incidents(&[SourceConfig::website("Mixed", "https://mixed.news.dz/")])
        .await;

    assert_eq!(incidents.len(), 2);
    assert!(incidents
        .iter()
        .all(|i| !i.description.contains("championnat")));
    assert!(incidents
        .windows(2)
        .all(|w| w[0].confidence >= w[1].confidence));

    let medea = incidents
        .iter()
        .find(|i| i.location.wilaya == "Médéa")
        .expect("Médéa incident");
    assert_eq!(medea.status, Status::Contained);
}

#[tokio::test]
async fn feed_items_are_scraped() {
    let m = monitor_with(fetcher(), Arc::new(DisabledService));
    let incidents = m
        .collect_incidents(&[SourceConfig::rss("Feed", "https://feed.dz/rss")])
        .await;

    assert_eq!(incidents.len(), 1);
    assert_eq!(incidents[0].location.wilaya, "Béjaïa");
    assert_eq!(incidents[0].link, "https://feed.dz/bejaia");
    assert_eq!(incidents[0].timestamp, "2025-08-02 18:00");
    assert_eq!(incidents[0].severity, Severity::Critical);
}

fn without_id(incidents: &[Incident]) -> Vec<Incident> {
    incidents
        .iter()
        .cloned()
        .map(|mut i| {
            i.id.clear();
            i
        })
        .collect()
}

#[tokio::test]
async fn same_input_gives_same_incidents() {
    let m = monitor_with(fetcher(), Arc::new(DisabledService));
    let sources = [
        SourceConfig::website("Mixed", "https://mixed.news.dz/"),
        SourceConfig::website("Sétif Info", "https://setif.news.dz/"),
        SourceConfig::rss("Feed", "https://feed.dz/rss"),
    ];
    let first = m.collect_incidents(&sources).await;
    let second = m.collect_incidents(&sources).await;
    assert_eq!(first.len(), 4);
    assert_eq!(without_id(&first), without_id(&second));
}

#[tokio::test]
async fn enrichment_failure_keeps_raw_candidates() {
    let sources = [SourceConfig::website("Mixed", "https://mixed.news.dz/")];
    let plain = monitor_with(fetcher(), Arc::new(DisabledService))
        .collect_incidents(&sources)
        .await;
    let failing = monitor_with(fetcher(), Arc::new(MockEnrichment::failing()));
    let fallback = failing.collect_incidents(&sources).await;

    assert_eq!(without_id(&plain), without_id(&fallback));
    assert!(fallback.iter().all(|i| !i.ai_enhanced));

    let report = failing.manual_scrape(&sources).await;
    assert!(report.ai_analysis_used);
    assert!(!report.results[0].ai_enhanced);
    assert_eq!(report.results[0].ai_confidence_avg, None);
    assert_eq!(report.total_articles, 2);
}

#[tokio::test]
async fn enrichment_fields_reach_the_incident() {
    let ai = MockEnrichment::with_confidence(0.95).enrichment(AiEnrichment {
        fire_type: Some("forest".into()),
        casualties: Some("0".into()),
        ..AiEnrichment::default()
    });
    let m = monitor_with(fetcher(), Arc::new(ai));
    let incidents = m
        .collect_incidents(&[SourceConfig::website("Sétif Info", "https://setif.news.dz/")])
        .await;

    assert_eq!(incidents.len(), 1);
    assert!(incidents[0].ai_enhanced);
    assert_eq!(incidents[0].ai.fire_type.as_deref(), Some("forest"));

    let json = serde_json::to_value(&incidents[0]).unwrap();
    assert_eq!(json["fire_type"], "forest");
    assert_eq!(json["casualties"], "0");
    assert!(json.get("cause").is_none());
    assert_eq!(json["location"]["wilaya"], "Sétif");
}

/// Hangs on one host, answers immediately on the others.
struct OneSlowHost {
    slow: &'static str,
    inner: StaticFetcher,
}

#[async_trait]
impl PageFetcher for OneSlowHost {
    async fn fetch(&self, url: &str) -> Result<String> {
        if url == self.slow {
            tokio::time::sleep(Duration::from_secs(30)).await;
            bail!("unreachable");
        }
        self.inner.fetch(url).await
    }

    fn name(&self) -> &'static str {
        "one-slow-host"
    }
}

#[tokio::test]
async fn slow_source_times_out_without_blocking_others() {
    let fetcher = OneSlowHost {
        slow: "https://slow.dz/",
        inner: fetcher(),
    };
    let ai: DynEnrichment = Arc::new(DisabledService);
    let sources = [
        SourceConfig::website("Slow", "https://slow.dz/"),
        SourceConfig::website("Sétif Info", "https://setif.news.dz/"),
    ];

    let started = std::time::Instant::now();
    let out = scrape_all(
        &fetcher,
        &sources,
        Lexicon::builtin(),
        &ai,
        false,
        Duration::from_millis(100),
    )
    .await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(out[0].status, ScrapeStatus::Error);
    assert!(out[0].error.as_deref().unwrap_or_default().contains("timed out"));
    assert!(out[0].candidates.is_empty());
    assert_eq!(out[1].status, ScrapeStatus::Success);
    assert_eq!(out[1].candidates.len(), 1);
}

#[tokio::test]
async fn delayed_fetcher_hits_monitor_timeout() {
    let slow = fetcher().with_delay(Duration::from_millis(500));
    let m = monitor_with(slow, Arc::new(DisabledService)).with_fetch_timeout(Duration::from_millis(50));
    let report = m
        .manual_scrape(&[SourceConfig::website("Sétif Info", "https://setif.news.dz/")])
        .await;
    assert_eq!(report.total_articles, 0);
    assert_eq!(report.results[0].status, ScrapeStatus::Error);
}
