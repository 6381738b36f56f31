//! Metrics and observability utilities
//!
//! Provides Prometheus metrics with SLO-aligned histograms
//! and standardized naming conventions.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all PostForge metrics
pub const METRICS_PREFIX: &str = "postforge";

/// SLO-aligned histogram buckets for request latency (in seconds)
/// Targets: P50 < 50ms, P99 < 150ms
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms
    0.050,  // 50ms - P50 target
    0.075,  // 75ms
    0.100,  // 100ms
    0.150,  // 150ms - P99 target
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
    10.00,  // 10s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Listing metrics
    describe_histogram!(
        format!("{}_list_assembly_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Time to assemble an article list page on a cache miss"
    );

    describe_counter!(
        format!("{}_metric_fallbacks_total", METRICS_PREFIX),
        Unit::Count,
        "Engagement counts replaced by zero after a failed query"
    );

    // Engagement metrics
    describe_counter!(
        format!("{}_interactions_total", METRICS_PREFIX),
        Unit::Count,
        "Like, favorite and comment mutations"
    );

    describe_counter!(
        format!("{}_article_writes_total", METRICS_PREFIX),
        Unit::Count,
        "Article create, update, delete and publish-toggle operations"
    );

    describe_counter!(
        format!("{}_messages_total", METRICS_PREFIX),
        Unit::Count,
        "Direct message sends, reads and recalls"
    );

    describe_counter!(
        format!("{}_admin_actions_total", METRICS_PREFIX),
        Unit::Count,
        "Administrative account and role changes"
    );

    // Cache metrics
    describe_counter!(
        format!("{}_cache_hits_total", METRICS_PREFIX),
        Unit::Count,
        "Total cache hits"
    );

    describe_counter!(
        format!("{}_cache_misses_total", METRICS_PREFIX),
        Unit::Count,
        "Total cache misses"
    );

    describe_counter!(
        format!("{}_cache_errors_total", METRICS_PREFIX),
        Unit::Count,
        "Cache operations that failed and were bypassed"
    );

    describe_counter!(
        format!("{}_cache_invalidations_total", METRICS_PREFIX),
        Unit::Count,
        "Cache keys removed by invalidation"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record list assembly on a cache miss
pub fn record_list_assembly(duration_secs: f64, sort: &str) {
    histogram!(
        format!("{}_list_assembly_duration_seconds", METRICS_PREFIX),
        "sort" => sort.to_string()
    )
    .record(duration_secs);
}

/// Helper to record an engagement count that fell back to zero
pub fn record_metric_fallback(metric: &'static str) {
    counter!(
        format!("{}_metric_fallbacks_total", METRICS_PREFIX),
        "metric" => metric
    )
    .increment(1);
}

/// Helper to record a like/favorite/comment mutation
pub fn record_interaction(kind: &'static str, action: &'static str) {
    counter!(
        format!("{}_interactions_total", METRICS_PREFIX),
        "kind" => kind,
        "action" => action
    )
    .increment(1);
}

/// Helper to record an article write
pub fn record_article_write(operation: &'static str) {
    counter!(
        format!("{}_article_writes_total", METRICS_PREFIX),
        "operation" => operation
    )
    .increment(1);
}

/// Helper to record a direct message action
pub fn record_message(action: &'static str) {
    counter!(
        format!("{}_messages_total", METRICS_PREFIX),
        "action" => action
    )
    .increment(1);
}

/// Helper to record an administrative action
pub fn record_admin_action(action: &'static str) {
    counter!(
        format!("{}_admin_actions_total", METRICS_PREFIX),
        "action" => action
    )
    .increment(1);
}

/// Helper to record cache metrics
pub fn record_cache(hit: bool, cache_name: &str) {
    if hit {
        counter!(
            format!("{}_cache_hits_total", METRICS_PREFIX),
            "cache" => cache_name.to_string()
        )
        .increment(1);
    } else {
        counter!(
            format!("{}_cache_misses_total", METRICS_PREFIX),
            "cache" => cache_name.to_string()
        )
        .increment(1);
    }
}

/// Helper to record a cache operation that failed
pub fn record_cache_error(operation: &'static str) {
    counter!(
        format!("{}_cache_errors_total", METRICS_PREFIX),
        "operation" => operation
    )
    .increment(1);
}

/// Helper to record keys removed by invalidation
pub fn record_cache_invalidation(scope: &'static str, removed: u64) {
    counter!(
        format!("{}_cache_invalidations_total", METRICS_PREFIX),
        "scope" => scope
    )
    .increment(removed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_buckets() {
        // Verify buckets are sorted and contain SLO targets
        let mut prev = 0.0;
        for &bucket in LATENCY_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }

        assert!(LATENCY_BUCKETS.contains(&0.050));
        assert!(LATENCY_BUCKETS.contains(&0.150));
    }

    #[test]
    fn test_recorders_without_exporter() {
        // no recorder installed: every helper must be a no-op
        let metrics = RequestMetrics::start("GET", "/api/articles");
        metrics.finish(200);
        record_cache(true, "article");
        record_cache_error("get");
        record_cache_invalidation("list", 3);
        record_metric_fallback("like_count");
        record_list_assembly(0.01, "hot");
    }
}
