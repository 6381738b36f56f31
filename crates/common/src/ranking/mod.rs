//! Hotness scoring
//!
//! Combines engagement counters with a linear recency decay:
//!
//! ```text
//! score = 0.3 * views + 0.2 * likes + 0.2 * comments + 0.2 * favorites + 0.1 * time_factor
//! time_factor = max(0, 100 - hours_since_creation * 0.1)
//! ```
//!
//! Scores are deterministic for a given `now`, so callers pass the clock in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Starting value of the recency term for a brand-new article
pub const TIME_FACTOR_BASE: f64 = 100.0;

/// Recency lost per whole hour of age
pub const TIME_DECAY_PER_HOUR: f64 = 0.1;

/// Per-signal weights of the hotness formula
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HotnessWeights {
    pub views: f64,
    pub likes: f64,
    pub comments: f64,
    pub favorites: f64,
    pub recency: f64,
}

impl Default for HotnessWeights {
    fn default() -> Self {
        Self {
            views: 0.3,
            likes: 0.2,
            comments: 0.2,
            favorites: 0.2,
            recency: 0.1,
        }
    }
}

/// Engagement counters of one article
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementMetrics {
    pub view_count: u64,
    pub like_count: u64,
    pub favorite_count: u64,
    pub comment_count: u64,
}

/// Whole hours elapsed since `created_at`, never negative
pub fn hours_since(created_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - created_at).num_hours().max(0)
}

/// Recency term; articles without a creation time get none
pub fn time_factor(created_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    match created_at {
        Some(created_at) => {
            let hours = hours_since(created_at, now) as f64;
            (TIME_FACTOR_BASE - hours * TIME_DECAY_PER_HOUR).max(0.0)
        }
        None => 0.0,
    }
}

impl HotnessWeights {
    pub fn score(
        &self,
        metrics: &EngagementMetrics,
        created_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> f64 {
        self.views * metrics.view_count as f64
            + self.likes * metrics.like_count as f64
            + self.comments * metrics.comment_count as f64
            + self.favorites * metrics.favorite_count as f64
            + self.recency * time_factor(created_at, now)
    }
}

/// Score with the default weights
pub fn hotness_score(
    metrics: &EngagementMetrics,
    created_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> f64 {
    HotnessWeights::default().score(metrics, created_at, now)
}

/// Round to two decimals for presentation
pub fn round_score(score: f64) -> f64 {
    (score * 100.0).round() / 100.0
}

/// Stable sort by descending score; equal scores keep their input order
pub fn rank_by_score<T>(items: &mut [(T, f64)]) {
    items.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn metrics(views: u64, likes: u64, favorites: u64, comments: u64) -> EngagementMetrics {
        EngagementMetrics {
            view_count: views,
            like_count: likes,
            favorite_count: favorites,
            comment_count: comments,
        }
    }

    #[test]
    fn test_reference_score() {
        let now = Utc::now();
        let created = now - Duration::hours(10);
        let score = hotness_score(&metrics(100, 10, 5, 5), Some(created), now);
        // 30 + 2 + 1 + 1 + 0.1 * 99
        assert!((score - 43.9).abs() < 1e-9, "got {}", score);
        assert_eq!(round_score(score), 43.9);
    }

    #[test]
    fn test_time_factor_bounds() {
        let now = Utc::now();
        assert_eq!(time_factor(Some(now), now), 100.0);
        assert_eq!(time_factor(Some(now - Duration::hours(1000)), now), 0.0);
        assert_eq!(time_factor(Some(now - Duration::hours(5000)), now), 0.0);
        assert_eq!(time_factor(None, now), 0.0);
        // clock skew: a future creation time counts as brand new
        assert_eq!(time_factor(Some(now + Duration::hours(3)), now), 100.0);
    }

    #[test]
    fn test_partial_hours_truncate() {
        let now = Utc::now();
        let created = now - Duration::minutes(119);
        assert_eq!(hours_since(created, now), 1);
        assert!((time_factor(Some(created), now) - 99.9).abs() < 1e-9);
    }

    #[test]
    fn test_more_engagement_never_lowers_score() {
        let now = Utc::now();
        let created = Some(now - Duration::hours(48));
        let base = hotness_score(&metrics(10, 2, 1, 1), created, now);

        assert!(hotness_score(&metrics(11, 2, 1, 1), created, now) > base);
        assert!(hotness_score(&metrics(10, 3, 1, 1), created, now) > base);
        assert!(hotness_score(&metrics(10, 2, 2, 1), created, now) > base);
        assert!(hotness_score(&metrics(10, 2, 1, 2), created, now) > base);
    }

    #[test]
    fn test_older_article_never_scores_higher() {
        let now = Utc::now();
        let m = metrics(5, 1, 0, 0);
        let newer = hotness_score(&m, Some(now - Duration::hours(2)), now);
        let older = hotness_score(&m, Some(now - Duration::hours(200)), now);
        assert!(older < newer);
    }

    #[test]
    fn test_rank_by_score_is_stable_descending() {
        let now = Utc::now();
        // A: fresh but idle; B: a day old with some traffic
        let a = hotness_score(&metrics(0, 0, 0, 0), Some(now), now);
        let b = hotness_score(&metrics(50, 5, 0, 0), Some(now - Duration::hours(24)), now);
        assert_eq!(round_score(a), 10.0);
        assert!((b - 25.76).abs() < 1e-9);

        let mut ranked = vec![("A", a), ("B", b), ("C", a)];
        rank_by_score(&mut ranked);
        let order: Vec<&str> = ranked.iter().map(|(name, _)| *name).collect();
        assert_eq!(order, vec!["B", "A", "C"]);
    }
}
