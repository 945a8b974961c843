// src/store.rs
//! Source configuration and scraping-mode persistence.
//!
//! The pipeline only needs [`SourceStore`]; [`MemorySourceStore`] backs the
//! service and the tests. Ids are assigned sequentially from 1.
//!
//! At startup the store is seeded from a sources file: `[[sources]]` tables
//! (or a JSON array for `.json` paths), each entry shaped like a
//! `POST /scraping/sources` body and validated the same way.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};
use url::Url;

use crate::ingest::types::{default_selectors, SourceConfig, SourceKind};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrapingMode {
    #[default]
    Auto,
    Manual,
}

impl ScrapingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScrapingMode::Auto => "auto",
            ScrapingMode::Manual => "manual",
        }
    }
}

impl fmt::Display for ScrapingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScrapingMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "auto" => Ok(ScrapingMode::Auto),
            "manual" => Ok(ScrapingMode::Manual),
            _ => Err(anyhow!("Mode must be 'auto' or 'manual'")),
        }
    }
}

/// A source as submitted by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSource {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub source_type: SourceKind,
    #[serde(default = "default_selectors")]
    pub selectors: Vec<String>,
}

impl NewSource {
    /// Name must be non-empty and the URL an absolute http(s) URL.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("source name must not be empty");
        }
        let url = Url::parse(self.url.trim()).map_err(|e| anyhow!("invalid source url: {e}"))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("invalid source url: scheme must be http or https");
        }
        Ok(())
    }
}

/// A persisted source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredSource {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub source_type: SourceKind,
    pub selectors: Vec<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl StoredSource {
    pub fn to_config(&self) -> SourceConfig {
        SourceConfig {
            id: Some(self.id),
            name: self.name.clone(),
            url: self.url.clone(),
            kind: self.source_type,
            selectors: self.selectors.clone(),
        }
    }
}

pub const ENV_SOURCES_PATH: &str = "FIRE_SOURCES_PATH";
pub const DEFAULT_SOURCES_PATH: &str = "config/sources.toml";

/// Seed file location: `$FIRE_SOURCES_PATH` or [`DEFAULT_SOURCES_PATH`].
pub fn sources_path() -> PathBuf {
    std::env::var(ENV_SOURCES_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_SOURCES_PATH))
}

#[derive(Debug, Default, Deserialize)]
struct SeedFile {
    #[serde(default)]
    sources: Vec<NewSource>,
}

/// Parse a seed file. `.json` holds a bare array, anything else is TOML.
pub fn read_seed_file(path: &Path) -> Result<Vec<NewSource>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading sources from {}", path.display()))?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("parsing JSON sources in {}", path.display()))
    } else {
        let seed: SeedFile = toml::from_str(&content)
            .with_context(|| format!("parsing TOML sources in {}", path.display()))?;
        Ok(seed.sources)
    }
}

#[async_trait]
pub trait SourceStore: Send + Sync {
    async fn list(&self) -> Result<Vec<StoredSource>>;
    /// Active sources as pipeline configs, optionally restricted to `ids`.
    async fn active_sources(&self, ids: Option<&[i64]>) -> Result<Vec<SourceConfig>>;
    async fn add(&self, source: NewSource) -> Result<StoredSource>;
    async fn update(&self, id: i64, source: NewSource) -> Result<Option<StoredSource>>;
    async fn delete(&self, id: i64) -> Result<bool>;
    /// Flip `is_active`; returns the new value, `None` if the id is unknown.
    async fn toggle(&self, id: i64) -> Result<Option<bool>>;
    async fn mode(&self) -> Result<ScrapingMode>;
    async fn set_mode(&self, mode: ScrapingMode) -> Result<ScrapingMode>;
}

#[derive(Debug, Default)]
struct State {
    sources: Vec<StoredSource>,
    next_id: i64,
    mode: ScrapingMode,
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[derive(Debug, Default)]
pub struct MemorySourceStore {
    state: RwLock<State>,
}

impl MemorySourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with configured sources, all active.
    pub fn with_sources(sources: Vec<SourceConfig>) -> Self {
        let ts = now();
        let stored = sources
            .into_iter()
            .enumerate()
            .map(|(i, s)| StoredSource {
                id: i as i64 + 1,
                name: s.name,
                url: s.url,
                source_type: s.kind,
                selectors: s.selectors,
                is_active: true,
                created_at: ts.clone(),
                updated_at: ts.clone(),
            })
            .collect::<Vec<_>>();
        let next_id = stored.len() as i64;
        Self {
            state: RwLock::new(State {
                sources: stored,
                next_id,
                mode: ScrapingMode::default(),
            }),
        }
    }

    /// Seed from submitted-style entries. Invalid entries are skipped with a
    /// warning; a repeated URL keeps its first entry.
    pub fn seeded(entries: Vec<NewSource>) -> Self {
        let mut seen = HashSet::new();
        let mut sources = Vec::with_capacity(entries.len());
        for entry in entries {
            if let Err(e) = entry.validate() {
                warn!(name = %entry.name, url = %entry.url, error = %e, "seed source skipped");
                continue;
            }
            let url = entry.url.trim().to_string();
            if !seen.insert(url.clone()) {
                continue;
            }
            sources.push(SourceConfig {
                id: None,
                name: entry.name.trim().to_string(),
                url,
                kind: entry.source_type,
                selectors: entry.selectors,
            });
        }
        info!(count = sources.len(), "sources seeded");
        Self::with_sources(sources)
    }

    /// Seed from [`sources_path`]. A missing default file means an empty
    /// store; a missing `$FIRE_SOURCES_PATH` target is an error.
    pub fn from_configured_sources() -> Result<Self> {
        let path = sources_path();
        if !path.exists() {
            if std::env::var_os(ENV_SOURCES_PATH).is_some() {
                bail!("{ENV_SOURCES_PATH} points to missing file {}", path.display());
            }
            info!(path = %path.display(), "no sources file, starting empty");
            return Ok(Self::new());
        }
        info!(path = %path.display(), "seeding sources");
        Ok(Self::seeded(read_seed_file(&path)?))
    }
}

#[async_trait]
impl SourceStore for MemorySourceStore {
    async fn list(&self) -> Result<Vec<StoredSource>> {
        Ok(self.state.read().await.sources.clone())
    }

    async fn active_sources(&self, ids: Option<&[i64]>) -> Result<Vec<SourceConfig>> {
        let st = self.state.read().await;
        Ok(st
            .sources
            .iter()
            .filter(|s| s.is_active)
            .filter(|s| ids.map_or(true, |ids| ids.contains(&s.id)))
            .map(StoredSource::to_config)
            .collect())
    }

    async fn add(&self, source: NewSource) -> Result<StoredSource> {
        source.validate()?;
        let mut st = self.state.write().await;
        st.next_id += 1;
        let ts = now();
        let stored = StoredSource {
            id: st.next_id,
            name: source.name.trim().to_string(),
            url: source.url.trim().to_string(),
            source_type: source.source_type,
            selectors: source.selectors,
            is_active: true,
            created_at: ts.clone(),
            updated_at: ts,
        };
        st.sources.push(stored.clone());
        Ok(stored)
    }

    async fn update(&self, id: i64, source: NewSource) -> Result<Option<StoredSource>> {
        source.validate()?;
        let mut st = self.state.write().await;
        let Some(s) = st.sources.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        s.name = source.name.trim().to_string();
        s.url = source.url.trim().to_string();
        s.source_type = source.source_type;
        s.selectors = source.selectors;
        s.updated_at = now();
        Ok(Some(s.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut st = self.state.write().await;
        let before = st.sources.len();
        st.sources.retain(|s| s.id != id);
        Ok(st.sources.len() != before)
    }

    async fn toggle(&self, id: i64) -> Result<Option<bool>> {
        let mut st = self.state.write().await;
        Ok(st.sources.iter_mut().find(|s| s.id == id).map(|s| {
            s.is_active = !s.is_active;
            s.updated_at = now();
            s.is_active
        }))
    }

    async fn mode(&self) -> Result<ScrapingMode> {
        Ok(self.state.read().await.mode)
    }

    async fn set_mode(&self, mode: ScrapingMode) -> Result<ScrapingMode> {
        self.state.write().await.mode = mode;
        Ok(mode)
    }
}
