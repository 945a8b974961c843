//! AI enrichment adapter: service abstraction, Gemini client, deterministic mock,
//! and the fallback wrapper the pipeline calls.
//!
//! Enrichment is strictly additive. Any failure returns the original candidates.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use metrics::counter;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::ai::AiConfig;
use crate::ingest::types::Candidate;

/// Candidates scored below this by the service are dropped.
pub const MIN_AI_CONFIDENCE: f64 = 0.3;

// Accepts strings, numbers, booleans; null and empty strings become None.
fn lenient_string<'de, D>(de: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(de)?;
    Ok(match v {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Some(other) => Some(other.to_string()),
    })
}

/// Structured fields an enrichment service may add to a candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiEnrichment {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub fire_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub casualties: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub emergency_services: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub affected_area: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub weather_conditions: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub evacuation_info: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub damage_assessment: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub date_mentioned: Option<String>,
}

/// External annotator. One batched call per invocation.
#[async_trait]
pub trait EnrichmentService: Send + Sync {
    fn is_available(&self) -> bool;
    async fn analyze_batch(&self, candidates: Vec<Candidate>) -> Result<Vec<Candidate>>;
    /// Human-readable name for status endpoints and logs.
    fn service_name(&self) -> &'static str;
}

pub type DynEnrichment = Arc<dyn EnrichmentService>;

/// What the pipeline gets back from [`enrich`].
#[derive(Debug, Clone)]
pub struct EnrichOutcome {
    pub candidates: Vec<Candidate>,
    /// True when the service answered and its results were merged.
    pub enhanced: bool,
}

/// Enrich `candidates`, keeping those the service scores at or above
/// [`MIN_AI_CONFIDENCE`]. On failure the input comes back untouched.
pub async fn enrich(service: &DynEnrichment, candidates: Vec<Candidate>) -> EnrichOutcome {
    let originals = candidates.clone();
    let n = originals.len();
    match service.analyze_batch(candidates).await {
        Ok(mut out) => {
            out.retain(|c| c.confidence >= MIN_AI_CONFIDENCE);
            info!(
                target: "enrich",
                service = service.service_name(),
                sent = n,
                kept = out.len(),
                "enrichment applied"
            );
            EnrichOutcome {
                candidates: out,
                enhanced: true,
            }
        }
        Err(e) => {
            warn!(target: "enrich", service = service.service_name(), error = ?e, "enrichment failed; using raw candidates");
            counter!("enrich_failures_total").increment(1);
            EnrichOutcome {
                candidates: originals,
                enhanced: false,
            }
        }
    }
}

/// Factory: build a service according to config and environment variables.
///
/// * If `AI_TEST_MODE=mock`, returns the deterministic mock.
/// * Else if `config.enabled==false`, returns the disabled service.
/// * Else builds the configured provider; a provider that cannot be built is disabled.
pub fn build_service_from_config(config: &AiConfig) -> DynEnrichment {
    if std::env::var("AI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Arc::new(MockEnrichment::new());
    }

    if !config.enabled {
        return Arc::new(DisabledService);
    }

    match config.provider.as_str() {
        "gemini" => match GeminiService::new(config) {
            Ok(svc) => Arc::new(svc),
            Err(e) => {
                warn!(target: "enrich", error = ?e, "gemini client not built; enrichment disabled");
                Arc::new(DisabledService)
            }
        },
        "mock" => Arc::new(MockEnrichment::new()),
        _ => Arc::new(DisabledService),
    }
}

// ------------------------------------------------------------
// Disabled + mock
// ------------------------------------------------------------

/// Never available; used when AI is off.
pub struct DisabledService;

#[async_trait]
impl EnrichmentService for DisabledService {
    fn is_available(&self) -> bool {
        false
    }
    async fn analyze_batch(&self, _candidates: Vec<Candidate>) -> Result<Vec<Candidate>> {
        bail!("enrichment disabled")
    }
    fn service_name(&self) -> &'static str {
        "disabled"
    }
}

/// Deterministic stand-in: stamps every candidate with a fixed score and fields.
#[derive(Debug, Clone, Default)]
pub struct MockEnrichment {
    pub confidence: Option<f64>,
    pub enrichment: AiEnrichment,
    pub fail: bool,
}

impl MockEnrichment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_confidence(confidence: f64) -> Self {
        Self {
            confidence: Some(confidence),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn enrichment(mut self, enrichment: AiEnrichment) -> Self {
        self.enrichment = enrichment;
        self
    }
}

#[async_trait]
impl EnrichmentService for MockEnrichment {
    fn is_available(&self) -> bool {
        true
    }
    async fn analyze_batch(&self, candidates: Vec<Candidate>) -> Result<Vec<Candidate>> {
        if self.fail {
            bail!("mock enrichment failure");
        }
        Ok(candidates
            .into_iter()
            .map(|mut c| {
                if let Some(conf) = self.confidence {
                    c.confidence = conf;
                }
                c.ai_result = Some(self.enrichment.clone());
                c.ai_enhanced = true;
                c
            })
            .collect())
    }
    fn service_name(&self) -> &'static str {
        "mock"
    }
}

// ------------------------------------------------------------
// Gemini
// ------------------------------------------------------------

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Google Gemini `generateContent` client. Requires an API key.
pub struct GeminiService {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiService {
    pub fn new(cfg: &AiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("building gemini http client")?;
        Ok(Self {
            http,
            api_key: cfg.api_key.trim().to_string(),
            model: cfg.model.clone(),
        })
    }
}

/// One annotated item as returned by the model.
#[derive(Debug, Clone, Deserialize)]
pub struct AnnotatedItem {
    pub index: usize,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(flatten)]
    pub enrichment: AiEnrichment,
}

fn build_prompt(candidates: &[Candidate]) -> String {
    let mut prompt = String::from(
        "You review Algerian news items (French, Arabic or English) for real fire incidents.\n\
         For each item return an object with: index (as given), confidence (0.0-1.0 that it \
         reports an actual current fire in Algeria), fire_type, casualties, emergency_services, \
         affected_area, cause, weather_conditions, evacuation_info, damage_assessment, \
         date_mentioned. Use null for unknown fields. Answer with a JSON array only.\n\n",
    );
    for (i, c) in candidates.iter().enumerate() {
        prompt.push_str(&format!("[{i}] {}\n", c.content));
    }
    prompt
}

/// Model output may arrive wrapped in a markdown code fence.
fn strip_code_fence(text: &str) -> &str {
    let t = text.trim();
    let t = t
        .strip_prefix("```json")
        .or_else(|| t.strip_prefix("```"))
        .unwrap_or(t);
    t.strip_suffix("```").unwrap_or(t).trim()
}

pub fn parse_annotations(text: &str) -> Result<Vec<AnnotatedItem>> {
    serde_json::from_str(strip_code_fence(text)).context("parsing enrichment json")
}

/// Merge annotations back by index; out-of-range indices are ignored.
pub fn merge_annotations(mut candidates: Vec<Candidate>, items: Vec<AnnotatedItem>) -> Vec<Candidate> {
    for item in items {
        let Some(c) = candidates.get_mut(item.index) else {
            continue;
        };
        if let Some(conf) = item.confidence {
            c.confidence = conf.clamp(0.0, 1.0);
        }
        c.ai_result = Some(item.enrichment);
        c.ai_enhanced = true;
    }
    candidates
}

#[async_trait]
impl EnrichmentService for GeminiService {
    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn analyze_batch(&self, candidates: Vec<Candidate>) -> Result<Vec<Candidate>> {
        if !self.is_available() {
            bail!("gemini api key missing");
        }

        #[derive(Serialize)]
        struct Part<'a> {
            text: &'a str,
        }
        #[derive(Serialize)]
        struct Content<'a> {
            parts: Vec<Part<'a>>,
        }
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct GenerationConfig {
            response_mime_type: &'static str,
            temperature: f32,
        }
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Req<'a> {
            contents: Vec<Content<'a>>,
            generation_config: GenerationConfig,
        }
        #[derive(Deserialize)]
        struct Resp {
            #[serde(default)]
            candidates: Vec<RespCandidate>,
        }
        #[derive(Deserialize)]
        struct RespCandidate {
            content: RespContent,
        }
        #[derive(Deserialize)]
        struct RespContent {
            #[serde(default)]
            parts: Vec<RespPart>,
        }
        #[derive(Deserialize)]
        struct RespPart {
            #[serde(default)]
            text: String,
        }

        let prompt = build_prompt(&candidates);
        let req = Req {
            contents: vec![Content {
                parts: vec![Part { text: &prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                temperature: 0.1,
            },
        };

        let url = format!("{GEMINI_ENDPOINT}/{}:generateContent", self.model);
        let resp = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&req)
            .send()
            .await
            .context("gemini request")?;
        let status = resp.status();
        if !status.is_success() {
            bail!("gemini HTTP {}", status.as_u16());
        }
        let body: Resp = resp.json().await.context("gemini response body")?;
        let text = body
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .unwrap_or_default();
        if text.trim().is_empty() {
            bail!("gemini returned no content");
        }
        let items = parse_annotations(text)?;
        Ok(merge_annotations(candidates, items))
    }

    fn service_name(&self) -> &'static str {
        "Google Gemini"
    }
}
