use std::fmt::Display;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failures of model loading and inference.
///
/// Load-time variants are fatal for the engine; inference-time variants are
/// either absorbed by the sentiment scorer or reported as contract violations
/// by the predictor.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model artifact not found: {0}")]
    ArtifactMissing(PathBuf),

    #[error("invalid model artifact {path}: {reason}")]
    ArtifactInvalid { path: PathBuf, reason: String },

    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    #[error("invalid fusion weights: {0}")]
    InvalidWeights(String),

    #[error("tokenize: {0}")]
    Tokenize(String),

    #[error("inference failed: {0}")]
    Inference(String),
}

impl ModelError {
    #[cfg_attr(not(feature = "onnx"), allow(dead_code))]
    pub(crate) fn invalid(path: &Path, reason: impl Display) -> Self {
        Self::ArtifactInvalid {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    #[cfg_attr(not(feature = "onnx"), allow(dead_code))]
    pub(crate) fn inference(reason: impl Display) -> Self {
        Self::Inference(reason.to_string())
    }

    pub(crate) fn shape(expected: impl Display, actual: impl Display) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}
