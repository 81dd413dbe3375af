//! Trip ordering by predicted driver reputation.

use std::collections::BTreeMap;

use ridewise_ai::{ModelError, ReputationPredictor};
use ridewise_core::{
    DriverSummary, FEATURE_COUNT, RankKey, RatingRecord, ReputationScore, TripListing, UserId,
};

use crate::EngineError;
use crate::aggregate::RatingAggregator;

/// Attaches reputations to trip listings and orders them.
///
/// Scored trips come first, highest predicted rating first; trips whose driver
/// has no ratings come last. Ties keep their input order.
#[derive(Clone, Copy)]
pub struct TripRanker<'a> {
    aggregator: RatingAggregator<'a>,
    predictor: &'a dyn ReputationPredictor,
}

impl<'a> TripRanker<'a> {
    pub fn new(aggregator: RatingAggregator<'a>, predictor: &'a dyn ReputationPredictor) -> Self {
        Self {
            aggregator,
            predictor,
        }
    }

    /// Predicted reputation of every driver with at least one rating.
    pub fn reputations(
        &self,
        ratings: &[RatingRecord],
    ) -> Result<BTreeMap<UserId, ReputationScore>, EngineError> {
        let summaries = self.aggregator.aggregate(ratings);
        predict_all(self.predictor, &summaries)
    }

    /// Annotate `trips` with `driver_overall_rating` and sort them.
    pub fn rank(
        &self,
        trips: Vec<TripListing>,
        ratings: &[RatingRecord],
    ) -> Result<Vec<TripListing>, EngineError> {
        let reputations = self.reputations(ratings)?;
        Ok(order(trips, &reputations))
    }
}

/// Run the predictor once over every summary.
///
/// A wrong output count or a non-finite rating is an error; nothing is
/// clamped or defaulted.
pub fn predict_all(
    predictor: &dyn ReputationPredictor,
    summaries: &BTreeMap<UserId, DriverSummary>,
) -> Result<BTreeMap<UserId, ReputationScore>, EngineError> {
    let features: Vec<[f32; FEATURE_COUNT]> = summaries.values().map(|s| s.features()).collect();
    let predictions = predictor
        .predict_batch(&features)
        .map_err(EngineError::Prediction)?;

    if predictions.len() != summaries.len() {
        return Err(EngineError::Prediction(ModelError::ShapeMismatch {
            expected: format!("{} predictions", summaries.len()),
            actual: predictions.len().to_string(),
        }));
    }

    summaries
        .keys()
        .zip(predictions)
        .map(|(&driver_id, predicted_rating)| {
            if !predicted_rating.is_finite() {
                return Err(EngineError::NonFinitePrediction { driver_id });
            }
            Ok((
                driver_id,
                ReputationScore {
                    driver_id,
                    predicted_rating,
                },
            ))
        })
        .collect()
}

/// Attach each driver's rating (or `None`) and stable-sort by [`RankKey`].
pub fn order(
    trips: Vec<TripListing>,
    reputations: &BTreeMap<UserId, ReputationScore>,
) -> Vec<TripListing> {
    let mut trips: Vec<TripListing> = trips
        .into_iter()
        .map(|mut trip| {
            trip.driver_overall_rating = reputations
                .get(&trip.driver_id)
                .map(|r| r.predicted_rating);
            trip
        })
        .collect();
    trips.sort_by_key(|trip| RankKey::for_rating(trip.driver_overall_rating));
    trips
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ridewise_ai::{FixedWeightPredictor, SentimentScorer};

    fn trip(id: i64, driver_id: UserId) -> TripListing {
        TripListing {
            id,
            driver_id,
            vehicle_id: 1,
            pickup_location: "Central Station".into(),
            drop_location: "Airport".into(),
            date: NaiveDate::from_ymd_opt(2025, 3, 14)
                .unwrap()
                .and_hms_opt(8, 30, 0)
                .unwrap(),
            seats_available: 3,
            price: 12.5,
            ride_fare: None,
            estimated_time: None,
            status: "Scheduled".into(),
            is_completed: false,
            is_canceled: false,
            driver_name: format!("driver-{driver_id}"),
            driver_profile_picture: None,
            vehicle_type: "Sedan".into(),
            vehicle_image: None,
            driver_overall_rating: None,
        }
    }

    fn rating(driver_id: UserId, numeric: u8, feedback: &str) -> RatingRecord {
        RatingRecord {
            trip_id: 1,
            rated_by_user_id: 100,
            driver_id: Some(driver_id),
            numeric_rating: numeric,
            feedback: Some(feedback.to_string()),
        }
    }

    fn score(driver_id: UserId, predicted_rating: f32) -> (UserId, ReputationScore) {
        (
            driver_id,
            ReputationScore {
                driver_id,
                predicted_rating,
            },
        )
    }

    #[test]
    fn scored_descending_then_unrated() {
        let reputations = BTreeMap::from([score(1, 3.0), score(2, 4.5)]);
        let ranked = order(vec![trip(10, 1), trip(20, 9), trip(30, 2)], &reputations);

        let ids: Vec<i64> = ranked.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![30, 10, 20]);
        assert_eq!(ranked[0].driver_overall_rating, Some(4.5));
        assert_eq!(ranked[2].driver_overall_rating, None);
    }

    #[test]
    fn ties_and_unrated_keep_input_order() {
        let reputations = BTreeMap::from([score(1, 4.0), score(2, 4.0)]);
        let trips = vec![trip(1, 7), trip(2, 2), trip(3, 8), trip(4, 1), trip(5, 2)];
        let ids: Vec<i64> = order(trips, &reputations).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 4, 5, 1, 3]);
    }

    #[test]
    fn signed_zero_ratings_tie() {
        let reputations = BTreeMap::from([score(1, 0.0), score(2, -0.0)]);
        let ids: Vec<i64> = order(vec![trip(10, 2), trip(20, 1)], &reputations)
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![10, 20]);
    }

    #[test]
    fn empty_trips_rank_empty() {
        let reputations = BTreeMap::from([score(1, 4.0)]);
        assert!(order(vec![], &reputations).is_empty());
    }

    #[test]
    fn ranks_by_blended_reputation() {
        let scorer = SentimentScorer::keywords_only();
        let predictor = FixedWeightPredictor::default();
        let ranker = TripRanker::new(RatingAggregator::new(&scorer), &predictor);

        let ratings = vec![
            rating(1, 5, "excellent and smooth"),
            rating(1, 4, "good"),
            rating(2, 2, "rude and late"),
        ];
        let trips = vec![trip(10, 2), trip(20, 1), trip(30, 3)];

        let ranked = ranker.rank(trips, &ratings).unwrap();
        let ids: Vec<i64> = ranked.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![20, 10, 30]);

        let d1 = ranked[0].driver_overall_rating.unwrap();
        let d2 = ranked[1].driver_overall_rating.unwrap();
        assert!((d1 - 4.47).abs() < 1e-4, "d1 = {d1}");
        assert!((d2 - 1.88).abs() < 1e-4, "d2 = {d2}");
        assert_eq!(ranked[2].driver_overall_rating, None);
    }

    #[test]
    fn ranking_is_repeatable() {
        let scorer = SentimentScorer::keywords_only();
        let predictor = FixedWeightPredictor::default();
        let ranker = TripRanker::new(RatingAggregator::new(&scorer), &predictor);
        let ratings = vec![rating(1, 3, "ok"), rating(2, 3, "ok"), rating(3, 5, "great")];
        let trips: Vec<TripListing> = (0..8).map(|i| trip(i, i % 4)).collect();

        let first = ranker.rank(trips.clone(), &ratings).unwrap();
        let second = ranker.rank(trips, &ratings).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unrated_drivers_get_no_reputation() {
        let scorer = SentimentScorer::keywords_only();
        let predictor = FixedWeightPredictor::default();
        let ranker = TripRanker::new(RatingAggregator::new(&scorer), &predictor);
        let reputations = ranker.reputations(&[rating(4, 5, "nice")]).unwrap();
        assert_eq!(reputations.keys().copied().collect::<Vec<_>>(), vec![4]);
        assert!(ranker.reputations(&[]).unwrap().is_empty());
    }

    struct Constant(f32);

    impl ReputationPredictor for Constant {
        fn name(&self) -> &str {
            "constant"
        }

        fn predict_batch(&self, features: &[[f32; FEATURE_COUNT]]) -> Result<Vec<f32>, ModelError> {
            Ok(vec![self.0; features.len()])
        }
    }

    struct Short;

    impl ReputationPredictor for Short {
        fn name(&self) -> &str {
            "short"
        }

        fn predict_batch(&self, _: &[[f32; FEATURE_COUNT]]) -> Result<Vec<f32>, ModelError> {
            Ok(vec![])
        }
    }

    #[test]
    fn non_finite_prediction_is_an_error() {
        let scorer = SentimentScorer::keywords_only();
        let predictor = Constant(f32::NAN);
        let ranker = TripRanker::new(RatingAggregator::new(&scorer), &predictor);
        let err = ranker
            .rank(vec![trip(1, 5)], &[rating(5, 4, "fine")])
            .unwrap_err();
        assert!(matches!(err, EngineError::NonFinitePrediction { driver_id: 5 }));
    }

    #[test]
    fn wrong_prediction_count_is_an_error() {
        let scorer = SentimentScorer::keywords_only();
        let ranker = TripRanker::new(RatingAggregator::new(&scorer), &Short);
        let err = ranker.reputations(&[rating(5, 4, "fine")]).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Prediction(ModelError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn predictions_pass_through_unclamped() {
        let scorer = SentimentScorer::keywords_only();
        let predictor = Constant(7.25);
        let ranker = TripRanker::new(RatingAggregator::new(&scorer), &predictor);
        let reputations = ranker.reputations(&[rating(5, 4, "fine")]).unwrap();
        assert_eq!(reputations[&5].predicted_rating, 7.25);
    }
}
