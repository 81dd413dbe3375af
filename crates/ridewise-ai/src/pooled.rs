//! Sentiment from a fine-tuned sequence classifier (e.g. SST-2 heads).
//!
//! Polarity is the positive-class probability minus the negative-class
//! probability.

use std::path::Path;

use ridewise_core::SentimentConfig;

use crate::ModelError;
use crate::sentiment::PolarityModel;
use crate::session::TextClassifier;

/// Single-sequence sentiment classifier.
pub struct PooledClassifier {
    classifier: TextClassifier,
    positive_index: usize,
    negative_index: usize,
}

impl PooledClassifier {
    /// Load `model.onnx` and `tokenizer.json` from `model_dir`.
    pub fn load(model_dir: &Path, config: &SentimentConfig) -> Result<Self, ModelError> {
        let min_classes = config.positive_index.max(config.negative_index) + 1;
        let classifier = TextClassifier::load(model_dir, config.max_length, min_classes)?;
        Ok(Self {
            classifier,
            positive_index: config.positive_index,
            negative_index: config.negative_index,
        })
    }
}

impl PolarityModel for PooledClassifier {
    fn name(&self) -> &str {
        "pooled"
    }

    fn polarity_batch(&self, texts: &[&str]) -> Result<Vec<f32>, ModelError> {
        let probs = self.classifier.probabilities(texts.to_vec())?;
        Ok(probs
            .iter()
            .map(|row| row[self.positive_index] - row[self.negative_index])
            .collect())
    }
}
