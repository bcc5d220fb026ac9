//! Metrics and observability utilities
//!
//! Standardized metric names for the GraphQL surface and the
//! reconciliation task.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};

/// Metrics prefix for all Libris metrics
pub const METRICS_PREFIX: &str = "libris";

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_graphql_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of GraphQL requests"
    );

    describe_histogram!(
        format!("{}_graphql_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "GraphQL request latency in seconds"
    );

    describe_counter!(
        format!("{}_reconcile_runs_total", METRICS_PREFIX),
        Unit::Count,
        "Total reconciliation passes"
    );

    describe_counter!(
        format!("{}_reconcile_repairs_total", METRICS_PREFIX),
        Unit::Count,
        "Total aggregate fields repaired by reconciliation"
    );

    tracing::info!("Metrics registered");
}

/// Record one GraphQL request
pub fn record_graphql_request(duration_secs: f64, ok: bool) {
    let status = if ok { "ok" } else { "error" };

    counter!(
        format!("{}_graphql_requests_total", METRICS_PREFIX),
        "status" => status
    )
    .increment(1);

    histogram!(format!("{}_graphql_request_duration_seconds", METRICS_PREFIX)).record(duration_secs);
}

/// Record one reconciliation pass
pub fn record_reconcile_run(repairs: u64) {
    counter!(format!("{}_reconcile_runs_total", METRICS_PREFIX)).increment(1);
    counter!(format!("{}_reconcile_repairs_total", METRICS_PREFIX)).increment(repairs);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_a_noop() {
        // No recorder installed in tests; calls must not panic.
        record_graphql_request(0.01, true);
        record_graphql_request(0.5, false);
        record_reconcile_run(3);
    }
}
