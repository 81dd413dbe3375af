//! Shared ride-sharing types exchanged between the store, the engine and the CLI.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Primary key of a user (riders and drivers share the `users` table).
pub type UserId = i64;

/// Primary key of a trip.
pub type TripId = i64;

/// Lowest star rating a rider can submit.
pub const MIN_NUMERIC_RATING: u8 = 1;

/// Highest star rating a rider can submit.
pub const MAX_NUMERIC_RATING: u8 = 5;

/// A post-trip review submitted by a rider.
///
/// Owned by persistence and immutable once written. `driver_id` is nullable in
/// the stored data; a review without one cannot be attributed to any driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingRecord {
    pub trip_id: TripId,
    pub rated_by_user_id: UserId,
    #[serde(default)]
    pub driver_id: Option<UserId>,
    /// Star rating in `1..=5`. Stored under the column name `rating`.
    #[serde(rename = "rating")]
    pub numeric_rating: u8,
    #[serde(default)]
    pub feedback: Option<String>,
}

impl RatingRecord {
    /// Whether the star rating lies in the accepted `1..=5` range.
    pub fn has_valid_rating(&self) -> bool {
        (MIN_NUMERIC_RATING..=MAX_NUMERIC_RATING).contains(&self.numeric_rating)
    }
}

/// A trip joined with its driver's name/picture and its vehicle's type/image.
///
/// This is the listing riders browse. The engine only fills
/// `driver_overall_rating`; every other field passes through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripListing {
    pub id: TripId,
    /// The driver offering the trip. Stored under the column name `user_id`.
    #[serde(rename = "user_id")]
    pub driver_id: UserId,
    pub vehicle_id: i64,
    pub pickup_location: String,
    pub drop_location: String,
    pub date: NaiveDateTime,
    pub seats_available: i32,
    pub price: f64,
    #[serde(default)]
    pub ride_fare: Option<f64>,
    #[serde(default)]
    pub estimated_time: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub is_canceled: bool,
    pub driver_name: String,
    #[serde(default)]
    pub driver_profile_picture: Option<String>,
    pub vehicle_type: String,
    #[serde(default)]
    pub vehicle_image: Option<String>,
    /// Predicted reputation of the driver; `None` for unrated drivers.
    #[serde(default)]
    pub driver_overall_rating: Option<f32>,
}

fn default_status() -> String {
    "Scheduled".to_string()
}

/// Per-driver statistics derived from that driver's rating records.
///
/// Transient: recomputed for every ranking request, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DriverSummary {
    pub driver_id: UserId,
    pub avg_numeric_rating: f32,
    pub avg_sentiment_score: f32,
    /// Number of rating records for this driver. Always at least 1.
    pub sample_count: usize,
}

impl DriverSummary {
    /// Feature vector consumed by reputation predictors:
    /// `[avg_numeric_rating, avg_sentiment_score]`.
    pub fn features(&self) -> [f32; FEATURE_COUNT] {
        [self.avg_numeric_rating, self.avg_sentiment_score]
    }
}

/// Arity of the predictor input built by [`DriverSummary::features`].
pub const FEATURE_COUNT: usize = 2;

/// The fused reputation of a driver with at least one rating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReputationScore {
    pub driver_id: UserId,
    pub predicted_rating: f32,
}
