//! Ordering key for ranked trip listings.
//!
//! Converts an optional driver rating into a key whose ascending order is the
//! order riders see listings in:
//!
//! - Rated drivers first, highest rating first
//! - Unrated drivers last
//!
//! Sorting with a stable sort on this key leaves equal ratings and unrated
//! listings in their input order.

use std::cmp::Ordering;

/// Sort key for one listing. Ascending key order is display order.
#[derive(Debug, Clone, Copy)]
pub enum RankKey {
    /// The driver has a predicted rating.
    Rated(f32),
    /// The driver has no rating history.
    Unrated,
}

impl RankKey {
    /// Build the key for a listing's `driver_overall_rating`.
    pub fn for_rating(rating: Option<f32>) -> Self {
        match rating {
            Some(value) => Self::Rated(value),
            None => Self::Unrated,
        }
    }
}

impl Ord for RankKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            // Descending by rating; -0.0 and 0.0 tie.
            (Self::Rated(a), Self::Rated(b)) => {
                b.partial_cmp(a).unwrap_or_else(|| b.total_cmp(a))
            }
            (Self::Rated(_), Self::Unrated) => Ordering::Less,
            (Self::Unrated, Self::Rated(_)) => Ordering::Greater,
            (Self::Unrated, Self::Unrated) => Ordering::Equal,
        }
    }
}

impl PartialOrd for RankKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for RankKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RankKey {}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: assert a list of ratings produces keys in strictly ascending order.
    fn assert_display_order(ratings: &[Option<f32>]) {
        let keys: Vec<RankKey> = ratings.iter().map(|r| RankKey::for_rating(*r)).collect();
        for i in 1..keys.len() {
            assert!(
                keys[i - 1] < keys[i],
                "Expected {:?} before {:?}, got {:?} >= {:?}",
                ratings[i - 1],
                ratings[i],
                keys[i - 1],
                keys[i],
            );
        }
    }

    #[test]
    fn higher_ratings_first() {
        assert_display_order(&[Some(4.9), Some(4.2), Some(3.0), Some(1.1)]);
    }

    #[test]
    fn unrated_after_every_rating() {
        assert_display_order(&[Some(5.0), Some(1.0), Some(-3.0), None]);
    }

    #[test]
    fn equal_ratings_compare_equal() {
        assert_eq!(RankKey::for_rating(Some(4.0)), RankKey::for_rating(Some(4.0)));
        assert_eq!(RankKey::for_rating(None), RankKey::for_rating(None));
    }

    #[test]
    fn signed_zeros_compare_equal() {
        assert_eq!(RankKey::for_rating(Some(-0.0)), RankKey::for_rating(Some(0.0)));
        assert_display_order(&[Some(0.0), Some(-0.5), None]);
    }

    #[test]
    fn stable_sort_keeps_ties_in_input_order() {
        let mut listings = vec![
            ("a", None),
            ("b", Some(3.5)),
            ("c", Some(4.0)),
            ("d", None),
            ("e", Some(3.5)),
        ];
        listings.sort_by_key(|(_, rating)| RankKey::for_rating(*rating));
        let order: Vec<&str> = listings.iter().map(|(name, _)| *name).collect();
        assert_eq!(order, ["c", "b", "e", "a", "d"]);
    }
}
