//! Local inference: feedback sentiment scoring and reputation prediction.
//!
//! Without the `onnx` feature only the keyword scorer and the fixed-weight
//! predictor are available.

mod error;
pub mod keywords;
mod predictor;
mod sentiment;

pub use error::ModelError;
pub use predictor::{FixedWeightPredictor, ReputationPredictor};
pub use sentiment::{
    DEFAULT_BATCH_SIZE, NEUTRAL_SENTIMENT, NeutralPolarity, PolarityModel, SENTIMENT_MAX,
    SENTIMENT_MIN, SentimentScorer,
};

#[cfg(feature = "onnx")]
mod pooled;
#[cfg(feature = "onnx")]
mod regressor;
#[cfg(feature = "onnx")]
mod session;
#[cfg(feature = "onnx")]
mod zero_shot;

#[cfg(feature = "onnx")]
pub use pooled::PooledClassifier;
#[cfg(feature = "onnx")]
pub use regressor::OnnxRegressor;
#[cfg(feature = "onnx")]
pub use zero_shot::ZeroShotClassifier;
