pub mod config;
pub mod model;
pub mod rank_key;
pub mod schema;

pub use config::{
    ConfigError, DEFAULT_NUMERIC_WEIGHT, DEFAULT_SENTIMENT_WEIGHT, EngineConfig, FusionStrategy,
    PredictorConfig, SentimentBackend, SentimentConfig, check_weights,
};
pub use model::{
    DriverSummary, FEATURE_COUNT, RatingRecord, ReputationScore, TripId, TripListing, UserId,
};
pub use rank_key::RankKey;
pub use schema::SchemaError;
