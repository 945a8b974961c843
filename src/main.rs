//! Fire Incident Monitor: binary entrypoint.
//! Boots the Axum HTTP server, wiring sources, the pipeline, the auto
//! scheduler and the metrics endpoint.

use std::sync::Arc;
use std::time::Duration;

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fire_incident_monitor::analyze::build_service_from_config;
use fire_incident_monitor::config::ai::{AiConfig, DEFAULT_AI_CONFIG_PATH};
use fire_incident_monitor::config::keywords::{keywords_path, start_hot_reload_thread, Lexicon, LexiconHandle};
use fire_incident_monitor::ingest::fetch::HttpFetcher;
use fire_incident_monitor::ingest::scheduler::{spawn_auto_scheduler, DEFAULT_REFRESH_SECS};
use fire_incident_monitor::metrics::Metrics;
use fire_incident_monitor::notify::{BroadcastHub, DynSink, Fanout, WebhookSink};
use fire_incident_monitor::store::{MemorySourceStore, SourceStore};
use fire_incident_monitor::{router, AppState, Monitor};

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - FIRE_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("FIRE_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("fire_incident_monitor=info,warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

fn refresh_interval() -> u64 {
    std::env::var("FIRE_REFRESH_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|s| *s > 0)
        .unwrap_or(DEFAULT_REFRESH_SECS)
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    // --- Keyword lexicon (optionally hot-reloaded) ---
    let lexicon = Lexicon::load().map_err(shuttle_runtime::Error::Custom)?;
    let lexicon = LexiconHandle::new(lexicon);
    start_hot_reload_thread(lexicon.clone(), keywords_path());

    // --- Sources ---
    let store: Arc<dyn SourceStore> =
        Arc::new(MemorySourceStore::from_configured_sources().map_err(shuttle_runtime::Error::Custom)?);

    // --- Enrichment ---
    let ai_config = AiConfig::load_or_disabled(DEFAULT_AI_CONFIG_PATH);
    let ai = build_service_from_config(&ai_config);

    // --- Live updates: websocket hub, plus a webhook when configured ---
    let hub = BroadcastHub::default();
    let sink: DynSink = match std::env::var("FIRE_WEBHOOK_URL") {
        Ok(url) if !url.trim().is_empty() => {
            let sinks: Vec<DynSink> = vec![Arc::new(hub.clone()), Arc::new(WebhookSink::new(url))];
            Arc::new(Fanout::new(sinks))
        }
        _ => Arc::new(hub.clone()),
    };

    let fetcher = HttpFetcher::new().map_err(shuttle_runtime::Error::Custom)?;
    let monitor = Arc::new(Monitor::new(Arc::new(fetcher), lexicon, ai, sink));

    let refresh_secs = refresh_interval();
    let metrics = Metrics::init(refresh_secs).map_err(shuttle_runtime::Error::Custom)?;

    spawn_auto_scheduler(
        monitor.clone(),
        store.clone(),
        Duration::from_secs(refresh_secs),
    );

    let state = AppState {
        monitor,
        store,
        hub,
    };
    let app = router(state).merge(metrics.router());

    Ok(app.into())
}
