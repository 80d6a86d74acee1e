use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::MatchError;

/// Source keys every config must declare, in output order.
pub const LEFT: &str = "left";
pub const RIGHT: &str = "right";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct MatchConfig {
    pub name: String,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    pub sources: BTreeMap<String, SourceConfig>,
    #[serde(default)]
    pub text: TextConfig,
    #[serde(default)]
    pub scorer: ScorerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_threshold() -> f64 {
    0.3
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Output column prefix. Defaults to the source key.
    #[serde(default)]
    pub label: Option<String>,
    pub file: String,
    pub columns: ColumnMapping,
    #[serde(default)]
    pub dedupe: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnMapping {
    pub destination: String,
    pub activity: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub source_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Text representation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    pub separator: String,
    pub include_description: bool,
    pub description_label: String,
    pub strip_accents: bool,
    pub query_prefix: String,
    pub passage_prefix: String,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            separator: " | ".into(),
            include_description: false,
            description_label: "Contexto: ".into(),
            strip_accents: false,
            query_prefix: String::new(),
            passage_prefix: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Scorer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorerKind {
    Tfidf,
    Embedding,
    Funnel,
}

impl Default for ScorerKind {
    fn default() -> Self {
        Self::Tfidf
    }
}

impl std::fmt::Display for ScorerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tfidf => write!(f, "tfidf"),
            Self::Embedding => write!(f, "embedding"),
            Self::Funnel => write!(f, "funnel"),
        }
    }
}

impl std::str::FromStr for ScorerKind {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tfidf" => Ok(Self::Tfidf),
            "embedding" => Ok(Self::Embedding),
            "funnel" => Ok(Self::Funnel),
            other => Err(MatchError::ConfigValidation(format!(
                "unknown scorer kind \"{other}\" (expected tfidf, embedding or funnel)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    pub kind: ScorerKind,
    pub sentinel: f64,
    pub tfidf: TfidfConfig,
    pub embedding: EmbeddingConfig,
    pub funnel: FunnelConfig,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            kind: ScorerKind::Tfidf,
            sentinel: -100.0,
            tfidf: TfidfConfig::default(),
            embedding: EmbeddingConfig::default(),
            funnel: FunnelConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TfidfConfig {
    pub ngram_min: usize,
    pub ngram_max: usize,
}

impl Default for TfidfConfig {
    fn default() -> Self {
        Self { ngram_min: 2, ngram_max: 4 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self { dimensions: 512 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FunnelConfig {
    pub top_k: usize,
    pub activation: Activation,
}

impl Default for FunnelConfig {
    fn default() -> Self {
        Self { top_k: 50, activation: Activation::Identity }
    }
}

/// Applied to raw re-ranker output before it lands in the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Identity,
    Sigmoid,
}

impl Activation {
    pub fn apply(self, raw: f64) -> f64 {
        match self {
            Self::Identity => raw,
            Self::Sigmoid => 1.0 / (1.0 + (-raw).exp()),
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub json: Option<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl MatchConfig {
    pub fn from_toml(input: &str) -> Result<Self, MatchError> {
        let config: MatchConfig =
            toml::from_str(input).map_err(|e| MatchError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        for key in self.sources.keys() {
            if key != LEFT && key != RIGHT {
                return Err(MatchError::ConfigValidation(format!(
                    "unknown source '{key}' (expected 'left' and 'right')"
                )));
            }
        }

        for key in [LEFT, RIGHT] {
            let source = self.sources.get(key).ok_or_else(|| {
                MatchError::ConfigValidation(format!("missing source '{key}'"))
            })?;
            if source.file.trim().is_empty() {
                return Err(MatchError::ConfigValidation(format!("source '{key}': file is empty")));
            }
            if source.columns.destination.is_empty() || source.columns.activity.is_empty() {
                return Err(MatchError::ConfigValidation(format!(
                    "source '{key}': destination and activity columns are required"
                )));
            }
        }

        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(MatchError::ConfigValidation(format!(
                "threshold must be a finite number >= 0, got {}",
                self.threshold
            )));
        }

        if !self.scorer.sentinel.is_finite() || self.threshold <= self.scorer.sentinel {
            return Err(MatchError::ConfigValidation(format!(
                "threshold ({}) must be above the sentinel ({})",
                self.threshold, self.scorer.sentinel
            )));
        }

        let tf = &self.scorer.tfidf;
        if tf.ngram_min == 0 || tf.ngram_min > tf.ngram_max {
            return Err(MatchError::ConfigValidation(format!(
                "tfidf n-gram range {}..={} is invalid",
                tf.ngram_min, tf.ngram_max
            )));
        }

        if self.scorer.embedding.dimensions == 0 {
            return Err(MatchError::ConfigValidation("embedding dimensions must be >= 1".into()));
        }

        if self.scorer.funnel.top_k == 0 {
            return Err(MatchError::ConfigValidation("funnel top_k must be >= 1".into()));
        }

        Ok(())
    }

    pub fn source(&self, key: &str) -> Result<&SourceConfig, MatchError> {
        self.sources
            .get(key)
            .ok_or_else(|| MatchError::ConfigValidation(format!("missing source '{key}'")))
    }

    /// Output prefix for a source: its label, or the key itself.
    pub fn label(&self, key: &str) -> String {
        self.sources
            .get(key)
            .and_then(|s| s.label.clone())
            .unwrap_or_else(|| key.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
