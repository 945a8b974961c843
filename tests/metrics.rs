// tests/metrics.rs
use std::sync::Arc;

use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use fire_incident_monitor::analyze::ai_adapter::DisabledService;
use fire_incident_monitor::config::keywords::{Lexicon, LexiconHandle};
use fire_incident_monitor::ingest::fetch::StaticFetcher;
use fire_incident_monitor::ingest::types::SourceConfig;
use fire_incident_monitor::metrics::Metrics;
use fire_incident_monitor::notify::BroadcastHub;
use fire_incident_monitor::Monitor;

// The recorder is process-global, so this file holds a single test.
#[tokio::test]
async fn metrics_endpoint_exposes_pipeline_series() {
    let metrics = Metrics::init(300).expect("recorder installs once");

    let fetcher = StaticFetcher::new().with_page(
        "https://ok.dz/",
        r#"<article><h2><a href="/a">Incendie de forêt à Jijel : 200 hectares</a></h2></article>"#,
    );
    let hub = BroadcastHub::default();
    let _live = hub.subscribe();
    let monitor = Monitor::new(
        Arc::new(fetcher),
        LexiconHandle::new(Lexicon::embedded().unwrap()),
        Arc::new(DisabledService),
        Arc::new(hub.clone()),
    );
    let incidents = monitor
        .refresh(&[
            SourceConfig::website("OK", "https://ok.dz/"),
            SourceConfig::website("Down", "https://down.dz/"),
        ])
        .await;
    assert_eq!(incidents.len(), 1);

    let resp = metrics
        .router()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();

    for needle in [
        "scrape_candidates_total",
        "scrape_source_errors_total",
        "incidents_emitted_total 1",
        "scrape_source_ms",
        "scrape_refresh_interval_secs",
    ] {
        assert!(text.contains(needle), "missing series {needle} in:\n{text}");
    }
}
