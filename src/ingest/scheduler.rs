// src/ingest/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, gauge};
use tokio::task::JoinHandle;

use crate::monitor::Monitor;
use crate::store::{ScrapingMode, SourceStore};

pub const DEFAULT_REFRESH_SECS: u64 = 300;

/// Spawn the auto-mode refresher. Each tick reads the stored mode and only
/// scrapes (and publishes) while it is `Auto`; manual mode leaves it idle.
pub fn spawn_auto_scheduler(
    monitor: Arc<Monitor>,
    store: Arc<dyn SourceStore>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;

            let mode = match store.mode().await {
                Ok(m) => m,
                Err(e) => {
                    tracing::warn!(target: "ingest", error = ?e, "scraping mode unavailable; skipping tick");
                    continue;
                }
            };
            if mode != ScrapingMode::Auto {
                tracing::debug!(target: "ingest", %mode, "manual mode; auto refresh skipped");
                continue;
            }

            let sources = match store.active_sources(None).await {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!(target: "ingest", error = ?e, "sources unavailable; skipping tick");
                    continue;
                }
            };

            let incidents = monitor.refresh(&sources).await;
            let now = chrono::Utc::now().timestamp().max(0);

            counter!("scrape_runs_total").increment(1);
            gauge!("scrape_last_run_ts").set(now as f64);

            tracing::info!(
                target: "ingest",
                sources = sources.len(),
                incidents = incidents.len(),
                "auto refresh tick"
            );
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::ai_adapter::DisabledService;
    use crate::config::keywords::{Lexicon, LexiconHandle};
    use crate::ingest::fetch::StaticFetcher;
    use crate::ingest::types::SourceConfig;
    use crate::notify::BroadcastHub;
    use crate::store::MemorySourceStore;

    const PAGE: &str =
        r#"<article><h2><a href="/t">Incendie de forêt à Tlemcen</a></h2><p>Alerte.</p></article>"#;

    fn setup() -> (Arc<Monitor>, Arc<MemorySourceStore>, BroadcastHub) {
        let hub = BroadcastHub::default();
        let monitor = Monitor::new(
            Arc::new(StaticFetcher::new().with_page("https://t.dz/", PAGE)),
            LexiconHandle::new(Lexicon::embedded().unwrap()),
            Arc::new(DisabledService),
            Arc::new(hub.clone()),
        );
        let store = MemorySourceStore::with_sources(vec![SourceConfig::website("T", "https://t.dz/")]);
        (Arc::new(monitor), Arc::new(store), hub)
    }

    #[tokio::test]
    async fn auto_mode_publishes() {
        let (monitor, store, hub) = setup();
        let mut rx = hub.subscribe();
        let handle = spawn_auto_scheduler(monitor, store, Duration::from_millis(20));
        let update = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("tick within 2s")
            .unwrap();
        handle.abort();
        assert_eq!(update.incidents.len(), 1);
        assert_eq!(update.incidents[0].location.wilaya, "Tlemcen");
    }

    #[tokio::test]
    async fn manual_mode_stays_idle() {
        let (monitor, store, hub) = setup();
        store.set_mode(ScrapingMode::Manual).await.unwrap();
        let mut rx = hub.subscribe();
        let handle = spawn_auto_scheduler(monitor, store, Duration::from_millis(20));
        let got = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await;
        handle.abort();
        assert!(got.is_err(), "no update expected in manual mode");
    }
}
