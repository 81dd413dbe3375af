//! Zero-shot sentiment via a natural-language-inference model.
//!
//! Each feedback text is paired with a fixed hypothesis ("The driver gave the
//! rider a positive experience."). Polarity is the entailment probability minus
//! the contradiction probability, which already lies in [-1, 1].

use std::path::Path;

use ridewise_core::SentimentConfig;

use crate::ModelError;
use crate::sentiment::PolarityModel;
use crate::session::TextClassifier;

/// NLI cross-encoder scored against a single hypothesis.
pub struct ZeroShotClassifier {
    classifier: TextClassifier,
    hypothesis: String,
    entailment_index: usize,
    contradiction_index: usize,
}

impl ZeroShotClassifier {
    /// Load `model.onnx` and `tokenizer.json` from `model_dir`.
    pub fn load(model_dir: &Path, config: &SentimentConfig) -> Result<Self, ModelError> {
        let min_classes = config.entailment_index.max(config.contradiction_index) + 1;
        let classifier = TextClassifier::load(model_dir, config.max_length, min_classes)?;
        Ok(Self {
            classifier,
            hypothesis: config.hypothesis.clone(),
            entailment_index: config.entailment_index,
            contradiction_index: config.contradiction_index,
        })
    }
}

impl PolarityModel for ZeroShotClassifier {
    fn name(&self) -> &str {
        "zero-shot"
    }

    fn polarity_batch(&self, texts: &[&str]) -> Result<Vec<f32>, ModelError> {
        let pairs: Vec<(&str, &str)> = texts
            .iter()
            .map(|text| (*text, self.hypothesis.as_str()))
            .collect();
        let probs = self.classifier.probabilities(pairs)?;
        Ok(probs
            .iter()
            .map(|row| row[self.entailment_index] - row[self.contradiction_index])
            .collect())
    }
}
