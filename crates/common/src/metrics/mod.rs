//! Metrics and observability utilities
//!
//! Provides Prometheus metrics with SLO-aligned histograms
//! and standardized naming conventions.

use crate::db::LikeState;
use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all Inkpress metrics
pub const METRICS_PREFIX: &str = "inkpress";

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

/// Buckets for assistant latency (an external LLM call, typically slower)
pub const ASSISTANT_BUCKETS: &[f64] = &[
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.000,  // 2s
    5.000,  // 5s
    10.00,  // 10s
    20.00,  // 20s
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

    // Content metrics
    describe_counter!(
        format!("{}_articles_created_total", METRICS_PREFIX),
        Unit::Count,
        "Total articles created"
    );

    describe_counter!(
        format!("{}_articles_deleted_total", METRICS_PREFIX),
        Unit::Count,
        "Total articles deleted (with their cascades)"
    );

    describe_counter!(
        format!("{}_comments_created_total", METRICS_PREFIX),
        Unit::Count,
        "Total comments created"
    );

    // Engagement metrics
    describe_counter!(
        format!("{}_likes_toggled_total", METRICS_PREFIX),
        Unit::Count,
        "Total like toggles, labelled by resulting state"
    );

    describe_counter!(
        format!("{}_article_views_total", METRICS_PREFIX),
        Unit::Count,
        "Total article detail views recorded"
    );

    // Assistant metrics
    describe_counter!(
        format!("{}_assistant_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total assistant requests, labelled by outcome"
    );

    describe_histogram!(
        format!("{}_assistant_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Assistant upstream latency in seconds"
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

/// Record an article creation
pub fn record_article_created() {
    counter!(format!("{}_articles_created_total", METRICS_PREFIX)).increment(1);
}

/// Record an article deletion
pub fn record_article_deleted() {
    counter!(format!("{}_articles_deleted_total", METRICS_PREFIX)).increment(1);
}

/// Record a comment creation
pub fn record_comment_created() {
    counter!(format!("{}_comments_created_total", METRICS_PREFIX)).increment(1);
}

/// Record a like toggle with its resulting state
pub fn record_like_toggle(state: LikeState) {
    let state = match state {
        LikeState::Liked => "liked",
        LikeState::Unliked => "unliked",
    };

    counter!(
        format!("{}_likes_toggled_total", METRICS_PREFIX),
        "state" => state
    )
    .increment(1);
}

/// Record one article detail view
pub fn record_article_view() {
    counter!(format!("{}_article_views_total", METRICS_PREFIX)).increment(1);
}

/// Record an assistant round-trip
pub fn record_assistant(duration_secs: f64, success: bool) {
    let outcome = if success { "success" } else { "degraded" };

    counter!(
        format!("{}_assistant_requests_total", METRICS_PREFIX),
        "outcome" => outcome
    )
    .increment(1);

    if success {
        histogram!(format!("{}_assistant_duration_seconds", METRICS_PREFIX)).record(duration_secs);
    }
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

        // P50 target (50ms) should be in buckets
        assert!(LATENCY_BUCKETS.contains(&0.050));
        // P99 target (150ms) should be in buckets
        assert!(LATENCY_BUCKETS.contains(&0.150));
    }

    #[test]
    fn test_request_metrics() {
        let metrics = RequestMetrics::start("GET", "/articles");
        std::thread::sleep(std::time::Duration::from_millis(10));
        metrics.finish(200);
        // Just verify it runs without panic
    }
}
