//! Driver reputation engine: rating aggregation, reputation prediction, and
//! trip ranking.
//!
//! A [`ReputationEngine`] owns the sentiment scorer and the predictor. Both
//! are loaded once, read-only afterwards, and shared across requests behind
//! an `Arc`.

mod aggregate;
mod error;
mod ranker;

use std::collections::BTreeMap;
use std::sync::Arc;

use ridewise_ai::{FixedWeightPredictor, ReputationPredictor, SentimentScorer};
use ridewise_core::{
    DriverSummary, EngineConfig, FusionStrategy, RatingRecord, ReputationScore, SentimentBackend,
    TripListing, UserId,
};
use tracing::info;

pub use aggregate::RatingAggregator;
pub use error::EngineError;
pub use ranker::{TripRanker, order, predict_all};

/// Per-driver summaries and the reputations predicted from them.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverReport {
    pub summaries: BTreeMap<UserId, DriverSummary>,
    pub reputations: BTreeMap<UserId, ReputationScore>,
}

/// Loaded models plus the ranking pipeline built on them.
pub struct ReputationEngine {
    scorer: SentimentScorer,
    predictor: Box<dyn ReputationPredictor>,
}

impl ReputationEngine {
    /// Assemble an engine from already-loaded components.
    pub fn new(scorer: SentimentScorer, predictor: Box<dyn ReputationPredictor>) -> Self {
        Self { scorer, predictor }
    }

    /// Keyword sentiment and the default 0.7/0.3 fixed-weight fusion.
    pub fn keywords_only() -> Self {
        Self::new(
            SentimentScorer::keywords_only(),
            Box::new(FixedWeightPredictor::default()),
        )
    }

    /// Validate `config` and load every model it names.
    ///
    /// This is the only place model artifacts are read; any failure here is
    /// fatal for the engine.
    pub fn from_config(config: &EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;

        let scorer = load_scorer(config)?.with_batch_size(config.sentiment.batch_size);
        let predictor = load_predictor(config)?;

        info!(
            sentiment = scorer.backend(),
            predictor = predictor.name(),
            "reputation engine ready"
        );
        Ok(Self::new(scorer, predictor))
    }

    pub fn scorer(&self) -> &SentimentScorer {
        &self.scorer
    }

    pub fn predictor(&self) -> &dyn ReputationPredictor {
        self.predictor.as_ref()
    }

    pub fn aggregator(&self) -> RatingAggregator<'_> {
        RatingAggregator::new(&self.scorer)
    }

    pub fn ranker(&self) -> TripRanker<'_> {
        TripRanker::new(self.aggregator(), self.predictor.as_ref())
    }

    /// Per-driver summaries, ordered by driver id.
    pub fn aggregate(&self, ratings: &[RatingRecord]) -> BTreeMap<UserId, DriverSummary> {
        self.aggregator().aggregate(ratings)
    }

    /// Predicted reputation of every rated driver.
    pub fn reputations(
        &self,
        ratings: &[RatingRecord],
    ) -> Result<BTreeMap<UserId, ReputationScore>, EngineError> {
        self.ranker().reputations(ratings)
    }

    /// Summaries and reputations from a single aggregation pass.
    pub fn report(&self, ratings: &[RatingRecord]) -> Result<DriverReport, EngineError> {
        let summaries = self.aggregate(ratings);
        let reputations = predict_all(self.predictor(), &summaries)?;
        info!(
            ratings = ratings.len(),
            drivers = summaries.len(),
            "driver report"
        );
        Ok(DriverReport {
            summaries,
            reputations,
        })
    }

    /// [`report`](Self::report) on Tokio's blocking pool, for async callers.
    pub async fn report_blocking(
        self: Arc<Self>,
        ratings: Vec<RatingRecord>,
    ) -> Result<DriverReport, EngineError> {
        tokio::task::spawn_blocking(move || self.report(&ratings))
            .await
            .map_err(|e| EngineError::TaskPanicked(e.to_string()))?
    }

    /// Rank `trips` by their drivers' predicted reputation.
    pub fn rank(
        &self,
        trips: Vec<TripListing>,
        ratings: &[RatingRecord],
    ) -> Result<Vec<TripListing>, EngineError> {
        let trip_count = trips.len();
        let ranked = self.ranker().rank(trips, ratings)?;
        let rated = ranked
            .iter()
            .filter(|t| t.driver_overall_rating.is_some())
            .count();
        info!(
            trips = trip_count,
            ratings = ratings.len(),
            rated,
            "ranked trips"
        );
        Ok(ranked)
    }

    /// [`rank`](Self::rank) on Tokio's blocking pool, for async callers.
    pub async fn rank_blocking(
        self: Arc<Self>,
        trips: Vec<TripListing>,
        ratings: Vec<RatingRecord>,
    ) -> Result<Vec<TripListing>, EngineError> {
        tokio::task::spawn_blocking(move || self.rank(trips, &ratings))
            .await
            .map_err(|e| EngineError::TaskPanicked(e.to_string()))?
    }
}

impl std::fmt::Debug for ReputationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReputationEngine")
            .field("scorer", &self.scorer)
            .field("predictor", &self.predictor.name())
            .finish()
    }
}

fn load_scorer(config: &EngineConfig) -> Result<SentimentScorer, EngineError> {
    let sentiment = &config.sentiment;
    match sentiment.backend {
        SentimentBackend::Keywords => Ok(SentimentScorer::keywords_only()),
        #[cfg(feature = "onnx")]
        backend => {
            let model_dir = sentiment.model_dir.as_deref().ok_or_else(|| {
                ridewise_core::ConfigError::Invalid(format!(
                    "sentiment backend '{}' requires model-dir",
                    backend.as_str()
                ))
            })?;
            let init = |source| EngineError::Initialization {
                component: "sentiment model",
                source,
            };
            let model: Box<dyn ridewise_ai::PolarityModel> = match backend {
                SentimentBackend::ZeroShot => Box::new(
                    ridewise_ai::ZeroShotClassifier::load(model_dir, sentiment).map_err(init)?,
                ),
                _ => Box::new(
                    ridewise_ai::PooledClassifier::load(model_dir, sentiment).map_err(init)?,
                ),
            };
            Ok(SentimentScorer::new(model))
        }
        #[cfg(not(feature = "onnx"))]
        backend => Err(EngineError::BackendUnavailable {
            backend: backend.as_str(),
            feature: "onnx",
        }),
    }
}

fn load_predictor(config: &EngineConfig) -> Result<Box<dyn ReputationPredictor>, EngineError> {
    let predictor = &config.predictor;
    match predictor.strategy {
        FusionStrategy::Fixed => {
            let fixed =
                FixedWeightPredictor::new(predictor.numeric_weight, predictor.sentiment_weight)
                    .map_err(|source| EngineError::Initialization {
                        component: "fixed-weight predictor",
                        source,
                    })?;
            Ok(Box::new(fixed))
        }
        #[cfg(feature = "onnx")]
        FusionStrategy::Learned => {
            let model_path = predictor.model_path.as_deref().ok_or_else(|| {
                ridewise_core::ConfigError::Invalid(
                    "learned fusion requires predictor model-path".into(),
                )
            })?;
            let regressor = ridewise_ai::OnnxRegressor::load(model_path).map_err(|source| {
                EngineError::Initialization {
                    component: "reputation regressor",
                    source,
                }
            })?;
            Ok(Box::new(regressor))
        }
        #[cfg(not(feature = "onnx"))]
        FusionStrategy::Learned => Err(EngineError::BackendUnavailable {
            backend: FusionStrategy::Learned.as_str(),
            feature: "onnx",
        }),
    }
}
