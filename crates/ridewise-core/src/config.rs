//! Engine configuration loaded from `ridewise.toml`.
//!
//! Selects the sentiment backend and the reputation fusion strategy, and
//! points at the model artifacts they load. Every key is optional; an empty
//! file (or no file) yields the keywords-only scorer with fixed-weight fusion,
//! which needs no model artifacts.
//!
//! ## Example
//!
//! ```toml
//! [sentiment]
//! backend = "zero-shot"
//! model-dir = "models/nli-distilroberta"
//! max-length = 128
//! hypothesis = "The driver gave the rider a positive experience."
//!
//! [predictor]
//! strategy = "learned"
//! model-path = "models/reputation.onnx"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Fixed-weight fusion default: the numeric rating is a direct rider action.
pub const DEFAULT_NUMERIC_WEIGHT: f32 = 0.7;

/// Fixed-weight fusion default: sentiment corroborates but is noisier.
pub const DEFAULT_SENTIMENT_WEIGHT: f32 = 0.3;

const WEIGHT_SUM_TOLERANCE: f32 = 1e-4;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Which text classifier produces the sentiment polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SentimentBackend {
    /// Three-way NLI classifier: entailment − contradiction.
    ZeroShot,
    /// Binary classifier with recurrent pooling: positive − negative.
    Pooled,
    /// No language model; only the keyword rules move the score.
    #[default]
    Keywords,
}

impl SentimentBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ZeroShot => "zero-shot",
            Self::Pooled => "pooled",
            Self::Keywords => "keywords",
        }
    }

    /// Whether this backend loads an ONNX model.
    pub fn needs_model(&self) -> bool {
        !matches!(self, Self::Keywords)
    }
}

/// How the numeric rating and sentiment are fused into one prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FusionStrategy {
    /// `numeric_weight * numeric + sentiment_weight * sentiment`.
    #[default]
    Fixed,
    /// Pretrained regression model over `[numeric, sentiment]`.
    Learned,
}

impl FusionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Learned => "learned",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct SentimentConfig {
    pub backend: SentimentBackend,
    /// Directory containing `model.onnx` and `tokenizer.json`.
    pub model_dir: Option<PathBuf>,
    /// Token budget per input; longer feedback is truncated.
    pub max_length: usize,
    /// Maximum number of texts per forward pass.
    pub batch_size: usize,
    /// Zero-shot hypothesis paired with each feedback text.
    pub hypothesis: String,
    pub entailment_index: usize,
    pub contradiction_index: usize,
    pub positive_index: usize,
    pub negative_index: usize,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            backend: SentimentBackend::default(),
            model_dir: None,
            max_length: 128,
            batch_size: 32,
            hypothesis: "The driver gave the rider a positive experience.".to_string(),
            // MNLI label order: contradiction, neutral, entailment.
            entailment_index: 2,
            contradiction_index: 0,
            positive_index: 1,
            negative_index: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct PredictorConfig {
    pub strategy: FusionStrategy,
    pub numeric_weight: f32,
    pub sentiment_weight: f32,
    /// Regression model for the learned strategy.
    pub model_path: Option<PathBuf>,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            strategy: FusionStrategy::default(),
            numeric_weight: DEFAULT_NUMERIC_WEIGHT,
            sentiment_weight: DEFAULT_SENTIMENT_WEIGHT,
            model_path: None,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct EngineConfig {
    /// File this config was read from (for display).
    #[serde(skip)]
    pub source: Option<PathBuf>,
    pub sentiment: SentimentConfig,
    pub predictor: PredictorConfig,
}

impl EngineConfig {
    /// Read and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.source = Some(path.to_path_buf());
        config.validate()?;
        debug!(
            path = %path.display(),
            backend = config.sentiment.backend.as_str(),
            strategy = config.predictor.strategy.as_str(),
            "loaded engine config"
        );
        Ok(config)
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.sentiment;
        if s.backend.needs_model() && s.model_dir.is_none() {
            return Err(ConfigError::Invalid(format!(
                "sentiment backend '{}' requires model-dir",
                s.backend.as_str()
            )));
        }
        if s.max_length == 0 {
            return Err(ConfigError::Invalid("max-length must be positive".into()));
        }
        if s.batch_size == 0 {
            return Err(ConfigError::Invalid("batch-size must be positive".into()));
        }
        match s.backend {
            SentimentBackend::ZeroShot => {
                check_indices(
                    "entailment-index",
                    s.entailment_index,
                    "contradiction-index",
                    s.contradiction_index,
                    3,
                )?;
            }
            SentimentBackend::Pooled => {
                check_indices(
                    "positive-index",
                    s.positive_index,
                    "negative-index",
                    s.negative_index,
                    2,
                )?;
            }
            SentimentBackend::Keywords => {}
        }

        let p = &self.predictor;
        match p.strategy {
            FusionStrategy::Fixed => check_weights(p.numeric_weight, p.sentiment_weight)?,
            FusionStrategy::Learned if p.model_path.is_none() => {
                return Err(ConfigError::Invalid(
                    "learned fusion requires predictor model-path".into(),
                ));
            }
            FusionStrategy::Learned => {}
        }

        Ok(())
    }

    /// Format config for verbose display.
    pub fn display_summary(&self) -> String {
        let mut lines = Vec::new();

        match &self.source {
            Some(source) => lines.push(format!("   Config: {}", source.display())),
            None => lines.push("   Config: (defaults)".to_string()),
        }

        let mut sentiment = format!("   Sentiment: {}", self.sentiment.backend.as_str());
        if let Some(dir) = &self.sentiment.model_dir {
            sentiment.push_str(&format!(" ({})", dir.display()));
        }
        lines.push(sentiment);

        let predictor = match self.predictor.strategy {
            FusionStrategy::Fixed => format!(
                "   Fusion: fixed ({:.2} numeric + {:.2} sentiment)",
                self.predictor.numeric_weight, self.predictor.sentiment_weight
            ),
            FusionStrategy::Learned => format!(
                "   Fusion: learned ({})",
                self.predictor
                    .model_path
                    .as_deref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default()
            ),
        };
        lines.push(predictor);

        lines.join("\n")
    }
}

/// Validate fixed fusion weights: finite, non-negative, summing to 1.
pub fn check_weights(numeric: f32, sentiment: f32) -> Result<(), ConfigError> {
    if !numeric.is_finite() || !sentiment.is_finite() || numeric < 0.0 || sentiment < 0.0 {
        return Err(ConfigError::Invalid(format!(
            "fusion weights must be finite and non-negative, got {numeric} and {sentiment}"
        )));
    }
    if ((numeric + sentiment) - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(ConfigError::Invalid(format!(
            "fusion weights must sum to 1, got {numeric} + {sentiment}"
        )));
    }
    Ok(())
}

fn check_indices(
    a_name: &str,
    a: usize,
    b_name: &str,
    b: usize,
    classes: usize,
) -> Result<(), ConfigError> {
    if a >= classes || b >= classes {
        return Err(ConfigError::Invalid(format!(
            "{a_name} and {b_name} must be below {classes}"
        )));
    }
    if a == b {
        return Err(ConfigError::Invalid(format!(
            "{a_name} and {b_name} must differ"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config.sentiment.backend, SentimentBackend::Keywords);
        assert_eq!(config.predictor.strategy, FusionStrategy::Fixed);
        assert_eq!(config.predictor.numeric_weight, 0.7);
        assert_eq!(config.predictor.sentiment_weight, 0.3);
        assert_eq!(config.sentiment.max_length, 128);
    }

    #[test]
    fn parses_kebab_case_keys() {
        let config = EngineConfig::from_toml_str(
            r#"
            [sentiment]
            backend = "zero-shot"
            model-dir = "models/nli"
            max-length = 64
            batch-size = 8

            [predictor]
            strategy = "learned"
            model-path = "models/reputation.onnx"
            "#,
        )
        .unwrap();
        assert_eq!(config.sentiment.backend, SentimentBackend::ZeroShot);
        assert_eq!(config.sentiment.model_dir, Some(PathBuf::from("models/nli")));
        assert_eq!(config.sentiment.max_length, 64);
        assert_eq!(config.sentiment.batch_size, 8);
        assert_eq!(config.predictor.strategy, FusionStrategy::Learned);
    }

    #[test]
    fn model_backend_requires_model_dir() {
        let err = EngineConfig::from_toml_str("[sentiment]\nbackend = \"pooled\"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("model-dir")));
    }

    #[test]
    fn learned_fusion_requires_model_path() {
        let err = EngineConfig::from_toml_str("[predictor]\nstrategy = \"learned\"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("model-path")));
    }

    #[test]
    fn fixed_weights_must_sum_to_one() {
        let err = EngineConfig::from_toml_str(
            "[predictor]\nnumeric-weight = 0.5\nsentiment-weight = 0.2",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("sum to 1")));

        assert!(check_weights(0.5, 0.5).is_ok());
        assert!(check_weights(-0.5, 1.5).is_err());
        assert!(check_weights(f32::NAN, 0.3).is_err());
    }

    #[test]
    fn class_indices_must_differ() {
        let err = EngineConfig::from_toml_str(
            "[sentiment]\nbackend = \"zero-shot\"\nmodel-dir = \"m\"\nentailment-index = 1\ncontradiction-index = 1",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("differ")));
    }

    #[test]
    fn unknown_keys_rejected() {
        let err = EngineConfig::from_toml_str("[sentiment]\nbackend = \"keywords\"\nmodel = \"x\"")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn load_from_file_records_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ridewise.toml");
        std::fs::write(&path, "[predictor]\nnumeric-weight = 0.6\nsentiment-weight = 0.4\n")
            .unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.source.as_deref(), Some(path.as_path()));
        assert_eq!(config.predictor.numeric_weight, 0.6);
        assert!(config.display_summary().contains("0.60 numeric"));
    }

    #[test]
    fn load_missing_file_errors() {
        let err = EngineConfig::load(Path::new("/nonexistent/ridewise.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
