// src/config/keywords.rs
//! Versioned keyword lexicon (`config/keywords.toml`).
//!
//! The default lexicon is compiled into the binary; `FIRE_KEYWORDS_PATH`
//! points at an override file. With `FIRE_KEYWORDS_HOT_RELOAD=1` in a dev
//! environment the file is polled every 2s and swapped in atomically.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, RwLock};
use std::thread;
use std::time::{Duration, SystemTime};

use anyhow::Context;
use serde::Deserialize;
use tracing::{info, warn};

use crate::analyze::classify::{Classifier, SeveritySection, StatusSection};
use crate::analyze::location::{LocationResolver, LocationSection};
use crate::relevance::{RelevanceScorer, RelevanceSection};

pub const ENV_KEYWORDS_PATH: &str = "FIRE_KEYWORDS_PATH";
pub const ENV_KEYWORDS_HOT_RELOAD: &str = "FIRE_KEYWORDS_HOT_RELOAD";
pub const DEFAULT_KEYWORDS_PATH: &str = "config/keywords.toml";

pub const EMBEDDED_KEYWORDS: &str = include_str!("../../config/keywords.toml");

/// Raw TOML schema.
#[derive(Debug, Clone, Deserialize)]
pub struct KeywordConfig {
    pub version: u32,
    pub relevance: RelevanceSection,
    #[serde(default)]
    pub location: LocationSection,
    #[serde(default)]
    pub severity: SeveritySection,
    #[serde(default)]
    pub status: StatusSection,
}

/// Everything the pipeline compiles out of one lexicon file.
#[derive(Debug, Clone)]
pub struct Lexicon {
    pub version: u32,
    pub relevance: RelevanceScorer,
    pub locator: LocationResolver,
    pub classifier: Classifier,
}

impl Lexicon {
    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        let cfg: KeywordConfig = toml::from_str(toml_str).context("parsing keyword lexicon")?;
        Self::from_config(&cfg)
    }

    pub fn from_config(cfg: &KeywordConfig) -> anyhow::Result<Self> {
        Ok(Self {
            version: cfg.version,
            relevance: RelevanceScorer::new(&cfg.relevance)?,
            locator: LocationResolver::new(&cfg.location)?,
            classifier: Classifier::new(&cfg.severity, &cfg.status),
        })
    }

    /// The lexicon shipped inside the binary.
    pub fn embedded() -> anyhow::Result<Self> {
        Self::from_toml_str(EMBEDDED_KEYWORDS)
    }

    /// Shared compiled copy of the embedded lexicon.
    ///
    /// Panics only if the embedded file is broken, which its own tests catch.
    pub fn builtin() -> &'static Lexicon {
        static BUILTIN: OnceLock<Lexicon> = OnceLock::new();
        BUILTIN.get_or_init(|| Lexicon::embedded().expect("embedded keywords.toml must compile"))
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read keyword lexicon at {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// `$FIRE_KEYWORDS_PATH` when set, otherwise the embedded lexicon.
    pub fn load() -> anyhow::Result<Self> {
        match std::env::var(ENV_KEYWORDS_PATH) {
            Ok(p) => Self::from_path(Path::new(&p)),
            Err(_) => Self::embedded(),
        }
    }
}

/// Path polled by the hot-reload thread.
pub fn keywords_path() -> PathBuf {
    std::env::var(ENV_KEYWORDS_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_KEYWORDS_PATH))
}

/* ----------------------------
Thread-safe handle + hot reload
---------------------------- */

/// Shared, swappable lexicon. Readers take a cheap `Arc` snapshot per run.
#[derive(Clone)]
pub struct LexiconHandle {
    inner: Arc<RwLock<Arc<Lexicon>>>,
}

impl LexiconHandle {
    pub fn new(lexicon: Lexicon) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(lexicon))),
        }
    }

    pub fn snapshot(&self) -> Arc<Lexicon> {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn replace(&self, lexicon: Lexicon) {
        let mut guard = match self.inner.write() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Arc::new(lexicon);
    }
}

/// Returns true if we should enable hot reload (dev/local only).
fn hot_reload_enabled() -> bool {
    let want = std::env::var(ENV_KEYWORDS_HOT_RELOAD)
        .ok()
        .map(|v| v == "1")
        .unwrap_or(false);
    if !want {
        return false;
    }
    if cfg!(debug_assertions) {
        return true;
    }
    matches!(
        std::env::var("SHUTTLE_ENV")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "local" | "development" | "dev"
    )
}

/// Start a polling watcher on `path` that swaps a freshly compiled lexicon
/// into `handle` whenever the file's mtime moves forward.
pub fn start_hot_reload_thread(handle: LexiconHandle, path: PathBuf) {
    if !hot_reload_enabled() {
        return;
    }

    thread::spawn(move || {
        let poll = Duration::from_secs(2);
        let mut last_mtime: Option<SystemTime> = None;

        loop {
            if let Ok(mtime) = fs::metadata(&path).and_then(|m| m.modified()) {
                let changed = match last_mtime {
                    None => {
                        last_mtime = Some(mtime);
                        false
                    }
                    Some(prev) => mtime > prev,
                };
                if changed {
                    match Lexicon::from_path(&path) {
                        Ok(lexicon) => {
                            info!(version = lexicon.version, path = %path.display(), "keyword lexicon reloaded");
                            handle.replace(lexicon);
                        }
                        Err(e) => warn!(error = ?e, "keyword lexicon reload rejected"),
                    }
                    last_mtime = Some(mtime);
                }
            }
            thread::sleep(poll);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::classify::{Severity, Status};

    #[test]
    fn embedded_lexicon_compiles() {
        let lex = Lexicon::embedded().unwrap();
        assert_eq!(lex.version, 1);
        assert_eq!(lex.relevance.threshold(), 3);
        assert!(lex.relevance.is_relevant("Un grand incendie a détruit plusieurs maisons"));
        assert_eq!(
            lex.classifier.classify_status("الوضع تحت السيطرة", ""),
            Status::Contained
        );
        assert_eq!(
            lex.classifier.classify_severity("Feu de forêt à Jijel", ""),
            Severity::Critical
        );
    }

    #[test]
    fn handle_swaps_snapshots() {
        let handle = LexiconHandle::new(Lexicon::embedded().unwrap());
        let before = handle.snapshot();
        let smaller = Lexicon::from_toml_str(
            r#"
version = 2
[relevance]
critical = ["blaze"]
"#,
        )
        .unwrap();
        handle.replace(smaller);
        assert_eq!(before.version, 1);
        assert_eq!(handle.snapshot().version, 2);
        assert!(!handle.snapshot().relevance.is_relevant("Un grand incendie a détruit"));
    }

    #[test]
    fn bad_pattern_is_rejected() {
        let err = Lexicon::from_toml_str(
            r#"
version = 1
[relevance]
patterns = ['(unclosed']
"#,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("pattern #0"));
    }

    #[serial_test::serial]
    #[test]
    fn load_prefers_env_path() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("kw.toml");
        fs::write(&p, "version = 9\n[relevance]\ncritical = [\"fire\"]\n").unwrap();
        std::env::set_var(ENV_KEYWORDS_PATH, &p);
        let lex = Lexicon::load().unwrap();
        std::env::remove_var(ENV_KEYWORDS_PATH);
        assert_eq!(lex.version, 9);
        assert_eq!(Lexicon::load().unwrap().version, 1);
    }
}
