//! Feedback sentiment scoring.
//!
//! A [`PolarityModel`] turns feedback text into a signed polarity in [-1, 1].
//! [`SentimentScorer`] wraps one, applies the keyword rules, and rescales the
//! result to the rating scale [1, 5] with 3 as neutral. The scorer never fails:
//! missing or blank feedback, and any text the model cannot process, score
//! exactly [`NEUTRAL_SENTIMENT`].

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, warn};

use crate::ModelError;
use crate::keywords;

/// Lowest sentiment score.
pub const SENTIMENT_MIN: f32 = 1.0;

/// Highest sentiment score.
pub const SENTIMENT_MAX: f32 = 5.0;

/// Score for absent, blank or unscorable feedback.
pub const NEUTRAL_SENTIMENT: f32 = 3.0;

/// Default number of texts per forward pass.
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// A text classifier reduced to one signed polarity per text.
///
/// Implementations must be usable from several threads at once: ONNX sessions
/// are kept behind a mutex by the implementations in this crate.
pub trait PolarityModel: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Polarity in [-1, 1] for each text, in input order.
    fn polarity_batch(&self, texts: &[&str]) -> Result<Vec<f32>, ModelError>;
}

/// Backend that reports zero polarity for every text.
///
/// With it, only the keyword rules move a score away from neutral.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeutralPolarity;

impl PolarityModel for NeutralPolarity {
    fn name(&self) -> &str {
        "keywords"
    }

    fn polarity_batch(&self, texts: &[&str]) -> Result<Vec<f32>, ModelError> {
        Ok(vec![0.0; texts.len()])
    }
}

/// Maps feedback text to a sentiment score on [1, 5].
pub struct SentimentScorer {
    model: Box<dyn PolarityModel>,
    batch_size: usize,
}

impl SentimentScorer {
    pub fn new(model: Box<dyn PolarityModel>) -> Self {
        Self {
            model,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Scorer without a language model.
    pub fn keywords_only() -> Self {
        Self::new(Box::new(NeutralPolarity))
    }

    /// Cap the number of texts sent to the model per forward pass.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Name of the underlying polarity backend.
    pub fn backend(&self) -> &str {
        self.model.name()
    }

    /// Score a single feedback string.
    pub fn score(&self, feedback: Option<&str>) -> f32 {
        self.score_batch(&[feedback])
            .first()
            .copied()
            .unwrap_or(NEUTRAL_SENTIMENT)
    }

    /// Score many feedback strings, one output per input.
    ///
    /// Distinct non-blank texts are sorted and scored once each, so the model
    /// sees the same batches whatever the input order and repeated feedback
    /// ("good", "ok") costs one inference.
    pub fn score_batch(&self, feedback: &[Option<&str>]) -> Vec<f32> {
        let distinct: BTreeSet<&str> = feedback.iter().filter_map(|f| normalize(*f)).collect();
        let texts: Vec<&str> = distinct.into_iter().collect();

        let mut scores: HashMap<&str, f32> = HashMap::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            for (text, polarity) in chunk.iter().zip(self.polarities(chunk)) {
                let score = match polarity {
                    Some(p) => to_sentiment(text, p),
                    None => NEUTRAL_SENTIMENT,
                };
                scores.insert(*text, score);
            }
        }

        let blank = feedback.len() - feedback.iter().filter(|f| normalize(**f).is_some()).count();
        if blank > 0 {
            debug!(blank, "feedback missing or blank, scored neutral");
        }

        feedback
            .iter()
            .map(|f| {
                normalize(*f)
                    .and_then(|text| scores.get(text).copied())
                    .unwrap_or(NEUTRAL_SENTIMENT)
            })
            .collect()
    }

    /// Model polarity per text; `None` where the model failed.
    ///
    /// A failing batch is retried one text at a time so a single bad input
    /// only degrades itself.
    fn polarities(&self, chunk: &[&str]) -> Vec<Option<f32>> {
        match self.model.polarity_batch(chunk) {
            Ok(values) if values.len() == chunk.len() => {
                values.into_iter().map(|p| finite(self.model.name(), p)).collect()
            }
            Ok(values) => {
                warn!(
                    backend = self.model.name(),
                    expected = chunk.len(),
                    got = values.len(),
                    "polarity batch size mismatch, retrying per text"
                );
                self.polarities_one_by_one(chunk)
            }
            Err(e) => {
                warn!(
                    backend = self.model.name(),
                    error = %e,
                    "polarity batch failed, retrying per text"
                );
                self.polarities_one_by_one(chunk)
            }
        }
    }

    fn polarities_one_by_one(&self, chunk: &[&str]) -> Vec<Option<f32>> {
        chunk
            .iter()
            .map(|text| match self.model.polarity_batch(&[*text]) {
                Ok(values) if values.len() == 1 => finite(self.model.name(), values[0]),
                Ok(_) => None,
                Err(e) => {
                    warn!(backend = self.model.name(), error = %e, "feedback scored neutral");
                    None
                }
            })
            .collect()
    }
}

impl std::fmt::Debug for SentimentScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentimentScorer")
            .field("backend", &self.model.name())
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

/// Keyword-adjust a polarity and rescale it from [-1, 1] to [1, 5].
fn to_sentiment(text: &str, polarity: f32) -> f32 {
    let adjusted = keywords::adjust(text, polarity.clamp(-1.0, 1.0));
    (NEUTRAL_SENTIMENT + 2.0 * adjusted).clamp(SENTIMENT_MIN, SENTIMENT_MAX)
}

fn normalize(feedback: Option<&str>) -> Option<&str> {
    feedback.map(str::trim).filter(|text| !text.is_empty())
}

fn finite(backend: &str, polarity: f32) -> Option<f32> {
    if polarity.is_finite() {
        Some(polarity)
    } else {
        warn!(backend, polarity, "non-finite polarity, scored neutral");
        None
    }
}
