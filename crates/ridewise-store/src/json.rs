//! JSON data directory: `ratings.json` and `trips.json`, each an array of
//! rows in the stored wire shape (`rating`, `user_id`, ...).

use std::path::{Path, PathBuf};

use ridewise_core::{RatingRecord, TripListing};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::{RatingSource, StoreError, TripSource, validate_ratings};

/// File-backed source reading a data directory on every call.
#[derive(Debug, Clone)]
pub struct JsonStore {
    data_dir: PathBuf,
}

impl JsonStore {
    pub const RATINGS_FILE: &str = "ratings.json";
    pub const TRIPS_FILE: &str = "trips.json";

    /// Open a data directory. The files themselves are read lazily.
    pub fn open(data_dir: &Path) -> Result<Self, StoreError> {
        if !data_dir.is_dir() {
            return Err(StoreError::NotFound(data_dir.to_path_buf()));
        }
        Ok(Self {
            data_dir: data_dir.to_path_buf(),
        })
    }

    fn read_rows<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>, StoreError> {
        let path = self.data_dir.join(file);
        if !path.exists() {
            return Err(StoreError::NotFound(path));
        }
        let content = std::fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        let rows: Vec<T> = serde_json::from_str(&content).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        info!(count = rows.len(), file = %path.display(), "loaded rows");
        Ok(rows)
    }
}

impl RatingSource for JsonStore {
    fn all_rating_records(&self) -> Result<Vec<RatingRecord>, StoreError> {
        validate_ratings(self.read_rows(Self::RATINGS_FILE)?)
    }
}

impl TripSource for JsonStore {
    fn all_trip_listings(&self) -> Result<Vec<TripListing>, StoreError> {
        let mut listings: Vec<TripListing> = self.read_rows(Self::TRIPS_FILE)?;
        // Ratings are computed, never read back from storage.
        for listing in &mut listings {
            listing.driver_overall_rating = None;
        }
        Ok(listings)
    }
}
