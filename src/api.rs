// src/api.rs
//! Thin HTTP boundary over [`Monitor`] and [`SourceStore`].
//! Errors are answered as `{"detail": "..."}` with a matching status code.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::broadcast::{self, error::RecvError};
use tower_http::cors::CorsLayer;
use tracing::{debug, warn};

use crate::incident::{by_wilaya, high_confidence, FireStats, Incident, HIGH_CONFIDENCE};
use crate::monitor::{AiStatus, ManualScrapeResponse, Monitor};
use crate::notify::{BroadcastHub, LiveUpdate};
use crate::store::{NewSource, ScrapingMode, SourceStore, StoredSource};

#[derive(Clone)]
pub struct AppState {
    pub monitor: Arc<Monitor>,
    pub store: Arc<dyn SourceStore>,
    /// Live-update hub; websocket sessions subscribe here.
    pub hub: BroadcastHub,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/fires/active", get(active_fires))
        .route("/api/fires/active/by-wilaya/{name}", get(fires_by_wilaya))
        .route("/api/fires/active/high-confidence", get(high_confidence_fires))
        .route("/api/fires/stats", get(fire_stats))
        .route("/scraping/sources", get(list_sources).post(add_source))
        .route("/scraping/sources/{id}", put(update_source).delete(delete_source))
        .route("/scraping/sources/{id}/toggle", post(toggle_source))
        .route("/scraping/manual-scrape", post(manual_scrape))
        .route("/scraping/mode", get(get_mode).post(set_mode))
        .route("/scraping/ai-status", get(ai_status))
        .route("/ws/fire-updates", get(fire_updates_ws))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Boundary error: status code plus a client-facing message.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }

    fn not_found(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            detail: detail.into(),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        warn!(error = ?e, "request failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: format!("{e:#}"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

async fn fire_updates_ws(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let rx = state.hub.subscribe();
    ws.on_upgrade(move |socket| forward_updates(socket, rx))
}

/// Push every hub batch to the socket as JSON until either side goes away.
async fn forward_updates(mut socket: WebSocket, mut rx: broadcast::Receiver<LiveUpdate>) {
    loop {
        match rx.recv().await {
            Ok(update) => {
                let text = match serde_json::to_string(&update) {
                    Ok(t) => t,
                    Err(e) => {
                        warn!(error = ?e, "live update not serializable");
                        continue;
                    }
                };
                if socket.send(WsMessage::Text(text.into())).await.is_err() {
                    debug!("websocket client went away");
                    break;
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                debug!(skipped, "websocket client lagging, batches skipped");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

async fn current_incidents(state: &AppState) -> Result<Vec<Incident>, ApiError> {
    let sources = state.store.active_sources(None).await?;
    Ok(state.monitor.collect_incidents(&sources).await)
}

async fn active_fires(State(state): State<AppState>) -> ApiResult<Vec<Incident>> {
    Ok(Json(current_incidents(&state).await?))
}

async fn fires_by_wilaya(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Vec<Incident>> {
    let all = current_incidents(&state).await?;
    Ok(Json(by_wilaya(&all, &name).into_iter().cloned().collect()))
}

#[derive(Debug, Deserialize)]
struct ConfidenceQuery {
    min_confidence: Option<f64>,
}

async fn high_confidence_fires(
    State(state): State<AppState>,
    Query(q): Query<ConfidenceQuery>,
) -> ApiResult<Vec<Incident>> {
    let min = q.min_confidence.unwrap_or(HIGH_CONFIDENCE);
    if !(0.0..=1.0).contains(&min) {
        return Err(ApiError::bad_request("min_confidence must be between 0 and 1"));
    }
    let all = current_incidents(&state).await?;
    Ok(Json(high_confidence(&all, min).into_iter().cloned().collect()))
}

async fn fire_stats(State(state): State<AppState>) -> ApiResult<FireStats> {
    let all = current_incidents(&state).await?;
    Ok(Json(FireStats::from_incidents(&all)))
}

async fn list_sources(State(state): State<AppState>) -> ApiResult<Vec<StoredSource>> {
    Ok(Json(state.store.list().await?))
}

fn validated(source: NewSource) -> Result<NewSource, ApiError> {
    source
        .validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    Ok(source)
}

async fn add_source(
    State(state): State<AppState>,
    Json(body): Json<NewSource>,
) -> ApiResult<StoredSource> {
    let body = validated(body)?;
    Ok(Json(state.store.add(body).await?))
}

async fn update_source(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<NewSource>,
) -> ApiResult<StoredSource> {
    let body = validated(body)?;
    match state.store.update(id, body).await? {
        Some(s) => Ok(Json(s)),
        None => Err(ApiError::not_found("Source not found")),
    }
}

#[derive(Debug, Serialize)]
struct Message {
    message: &'static str,
}

async fn delete_source(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Message> {
    if state.store.delete(id).await? {
        Ok(Json(Message {
            message: "Source deleted successfully",
        }))
    } else {
        Err(ApiError::not_found("Source not found"))
    }
}

#[derive(Debug, Serialize)]
struct ToggleOut {
    is_active: bool,
}

async fn toggle_source(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<ToggleOut> {
    match state.store.toggle(id).await? {
        Some(is_active) => Ok(Json(ToggleOut { is_active })),
        None => Err(ApiError::not_found("Source not found")),
    }
}

#[derive(Debug, Default, Deserialize)]
struct ManualScrapeReq {
    #[serde(default)]
    source_ids: Option<Vec<i64>>,
}

async fn manual_scrape(
    State(state): State<AppState>,
    body: Option<Json<ManualScrapeReq>>,
) -> ApiResult<ManualScrapeResponse> {
    let req = body.map(|Json(b)| b).unwrap_or_default();
    let ids = req.source_ids.filter(|ids| !ids.is_empty());
    let sources = state.store.active_sources(ids.as_deref()).await?;
    Ok(Json(state.monitor.manual_scrape(&sources).await))
}

#[derive(Debug, Serialize)]
struct ModeOut {
    mode: ScrapingMode,
}

#[derive(Debug, Deserialize)]
struct ModeReq {
    mode: String,
}

#[derive(Debug, Serialize)]
struct ModeSet {
    mode: ScrapingMode,
    message: String,
    persisted: bool,
}

async fn get_mode(State(state): State<AppState>) -> ApiResult<ModeOut> {
    Ok(Json(ModeOut {
        mode: state.store.mode().await?,
    }))
}

async fn set_mode(State(state): State<AppState>, Json(body): Json<ModeReq>) -> ApiResult<ModeSet> {
    let mode: ScrapingMode = body
        .mode
        .parse()
        .map_err(|e: anyhow::Error| ApiError::bad_request(e.to_string()))?;
    let mode = state.store.set_mode(mode).await?;
    Ok(Json(ModeSet {
        mode,
        message: format!("Scraping mode saved as {mode}"),
        persisted: true,
    }))
}

async fn ai_status(State(state): State<AppState>) -> Json<AiStatus> {
    Json(state.monitor.ai_status())
}
