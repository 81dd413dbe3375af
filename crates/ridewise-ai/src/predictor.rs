//! Reputation prediction from per-driver features.
//!
//! A feature row is `[avg_numeric_rating, avg_sentiment_score]`. Predictors map
//! each row to one predicted rating; they never reorder, drop, or invent rows.

use ridewise_core::{DEFAULT_NUMERIC_WEIGHT, DEFAULT_SENTIMENT_WEIGHT, FEATURE_COUNT, check_weights};

use crate::ModelError;

/// Maps driver feature rows to predicted ratings, one per row, in order.
pub trait ReputationPredictor: Send + Sync {
    /// Short strategy name for logs.
    fn name(&self) -> &str;

    /// Predict a rating for every row of `features`.
    fn predict_batch(&self, features: &[[f32; FEATURE_COUNT]]) -> Result<Vec<f32>, ModelError>;

    /// Predict a rating for a single driver.
    fn predict(&self, features: [f32; FEATURE_COUNT]) -> Result<f32, ModelError> {
        let values = self.predict_batch(&[features])?;
        match values.as_slice() {
            [value] => Ok(*value),
            other => Err(ModelError::shape("1 prediction", other.len())),
        }
    }
}

/// Weighted blend of the two features.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedWeightPredictor {
    numeric_weight: f32,
    sentiment_weight: f32,
}

impl FixedWeightPredictor {
    /// Weights must be non-negative and sum to 1.
    pub fn new(numeric_weight: f32, sentiment_weight: f32) -> Result<Self, ModelError> {
        check_weights(numeric_weight, sentiment_weight)
            .map_err(|e| ModelError::InvalidWeights(e.to_string()))?;
        Ok(Self {
            numeric_weight,
            sentiment_weight,
        })
    }
}

impl Default for FixedWeightPredictor {
    fn default() -> Self {
        Self {
            numeric_weight: DEFAULT_NUMERIC_WEIGHT,
            sentiment_weight: DEFAULT_SENTIMENT_WEIGHT,
        }
    }
}

impl ReputationPredictor for FixedWeightPredictor {
    fn name(&self) -> &str {
        "fixed"
    }

    fn predict_batch(&self, features: &[[f32; FEATURE_COUNT]]) -> Result<Vec<f32>, ModelError> {
        Ok(features
            .iter()
            .map(|[numeric, sentiment]| {
                self.numeric_weight * numeric + self.sentiment_weight * sentiment
            })
            .collect())
    }
}
