//! Utility functions for the matchmaking crate

use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Calculate the absolute difference between two ratings
pub fn rating_difference(rating1: f64, rating2: f64) -> f64 {
    (rating1 - rating2).abs()
}

/// Order two ratings by their distance to a target, closest first
pub fn compare_distance_to(target: f64, rating1: f64, rating2: f64) -> Ordering {
    rating_difference(rating1, target)
        .partial_cmp(&rating_difference(rating2, target))
        .unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_difference() {
        assert_eq!(rating_difference(1500.0, 1400.0), 100.0);
        assert_eq!(rating_difference(1400.0, 1500.0), 100.0);
        assert_eq!(rating_difference(1500.0, 1500.0), 0.0);
    }

    #[test]
    fn test_compare_distance_to() {
        assert_eq!(compare_distance_to(800.0, 810.0, 700.0), Ordering::Less);
        assert_eq!(compare_distance_to(800.0, 700.0, 810.0), Ordering::Greater);
        assert_eq!(compare_distance_to(800.0, 790.0, 810.0), Ordering::Equal);
        assert_eq!(compare_distance_to(800.0, f64::NAN, 810.0), Ordering::Equal);
    }
}
