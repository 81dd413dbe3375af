use ridewise_ai::ModelError;
use ridewise_core::{ConfigError, UserId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A model could not be loaded; the engine cannot start.
    #[error("failed to initialise {component}: {source}")]
    Initialization {
        component: &'static str,
        #[source]
        source: ModelError,
    },

    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("backend '{backend}' requires the '{feature}' feature")]
    BackendUnavailable {
        backend: &'static str,
        feature: &'static str,
    },

    #[error("prediction failed: {0}")]
    Prediction(#[source] ModelError),

    #[error("predictor returned a non-finite rating for driver {driver_id}")]
    NonFinitePrediction { driver_id: UserId },

    #[error("ranking task failed: {0}")]
    TaskPanicked(String),
}
