//! Per-driver reduction of rating records.

use std::collections::BTreeMap;

use ridewise_ai::SentimentScorer;
use ridewise_core::{DriverSummary, RatingRecord, UserId};
use tracing::debug;

/// Groups rating records by driver and averages their ratings and sentiment.
///
/// The result is identical, bit for bit, for every permutation of the input:
/// the sentiment scorer sees the same batches whatever the record order,
/// numeric ratings are summed as integers, and sentiment scores are sorted
/// before summation.
#[derive(Debug, Clone, Copy)]
pub struct RatingAggregator<'a> {
    scorer: &'a SentimentScorer,
}

#[derive(Default)]
struct Accumulator {
    numeric_sum: u64,
    sentiments: Vec<f32>,
}

impl<'a> RatingAggregator<'a> {
    pub fn new(scorer: &'a SentimentScorer) -> Self {
        Self { scorer }
    }

    /// One summary per driver with at least one attributed record, keyed and
    /// ordered by driver id.
    pub fn aggregate(&self, ratings: &[RatingRecord]) -> BTreeMap<UserId, DriverSummary> {
        let attributed: Vec<(UserId, &RatingRecord)> = ratings
            .iter()
            .filter_map(|r| r.driver_id.map(|driver_id| (driver_id, r)))
            .collect();

        let unattributed = ratings.len() - attributed.len();
        if unattributed > 0 {
            debug!(unattributed, "ratings without a driver skipped");
        }

        let feedback: Vec<Option<&str>> = attributed
            .iter()
            .map(|(_, r)| r.feedback.as_deref())
            .collect();
        let sentiments = self.scorer.score_batch(&feedback);

        let mut groups: BTreeMap<UserId, Accumulator> = BTreeMap::new();
        for ((driver_id, record), sentiment) in attributed.iter().zip(sentiments) {
            let acc = groups.entry(*driver_id).or_default();
            acc.numeric_sum += u64::from(record.numeric_rating);
            acc.sentiments.push(sentiment);
        }

        groups
            .into_iter()
            .map(|(driver_id, mut acc)| {
                let count = acc.sentiments.len();
                acc.sentiments.sort_by(f32::total_cmp);
                let sentiment_sum: f64 = acc.sentiments.iter().map(|&s| f64::from(s)).sum();
                let summary = DriverSummary {
                    driver_id,
                    avg_numeric_rating: (acc.numeric_sum as f64 / count as f64) as f32,
                    avg_sentiment_score: (sentiment_sum / count as f64) as f32,
                    sample_count: count,
                };
                (driver_id, summary)
            })
            .collect()
    }
}
