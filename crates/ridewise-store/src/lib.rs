//! Persistence collaborators of the reputation engine: where ratings and trip
//! listings come from.
//!
//! The engine never talks to storage itself; callers load through
//! [`RatingSource`] and [`TripSource`] and pass the results in.

mod error;
mod json;

pub use error::StoreError;
pub use json::JsonStore;

#[cfg(feature = "duckdb")]
mod duck;
#[cfg(feature = "duckdb")]
pub use duck::DuckStore;

use ridewise_core::{RatingRecord, TripListing};

/// Every trip listing: trip joined with its driver and vehicle.
pub trait TripSource {
    fn all_trip_listings(&self) -> Result<Vec<TripListing>, StoreError>;
}

/// Every rating record.
pub trait RatingSource {
    fn all_rating_records(&self) -> Result<Vec<RatingRecord>, StoreError>;
}

/// Reject records whose star rating lies outside `1..=5`.
pub fn validate_ratings(records: Vec<RatingRecord>) -> Result<Vec<RatingRecord>, StoreError> {
    if let Some(bad) = records.iter().find(|r| !r.has_valid_rating()) {
        return Err(StoreError::InvalidRating {
            trip_id: bad.trip_id,
            rated_by_user_id: bad.rated_by_user_id,
            rating: bad.numeric_rating,
        });
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(numeric: u8) -> RatingRecord {
        RatingRecord {
            trip_id: 4,
            rated_by_user_id: 8,
            driver_id: Some(2),
            numeric_rating: numeric,
            feedback: None,
        }
    }

    #[test]
    fn valid_ratings_pass_through() {
        let records = validate_ratings(vec![rating(1), rating(5)]).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn out_of_range_rating_rejected() {
        let err = validate_ratings(vec![rating(3), rating(0)]).unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidRating {
                trip_id: 4,
                rated_by_user_id: 8,
                rating: 0
            }
        ));
    }
}
