use std::path::PathBuf;

use ridewise_core::{SchemaError, TripId, UserId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("data file not found: {0}")]
    NotFound(PathBuf),

    #[error("no results for query")]
    NoResults,

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(
        "rating by user {rated_by_user_id} on trip {trip_id} is {rating}, expected 1 to 5"
    )]
    InvalidRating {
        trip_id: TripId,
        rated_by_user_id: UserId,
        rating: u8,
    },

    #[cfg(feature = "duckdb")]
    #[error("duckdb error: {0}")]
    DuckDb(#[from] ::duckdb::Error),

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("{0}")]
    Other(String),
}
