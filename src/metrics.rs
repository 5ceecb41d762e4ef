//! Metrics for board recomputation and parlay validation.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! host process installs a recorder.

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use tracing::debug;

// === Metric Name Constants ===

/// Board recompute latency metric name.
pub const METRIC_BOARD_REFRESH_LATENCY: &str = "board_refresh_latency_ms";
/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_latency_ms";
/// Snapshots processed counter metric name.
pub const METRIC_SNAPSHOTS_PROCESSED: &str = "snapshots_processed_total";
/// Undecodable snapshots dropped counter metric name.
pub const METRIC_SNAPSHOTS_REJECTED: &str = "snapshots_rejected_total";
/// Conflicting legs removed counter metric name.
pub const METRIC_CONFLICTS_REMOVED: &str = "conflicts_removed_total";
/// Build requests submitted counter metric name.
pub const METRIC_BUILDS_SUBMITTED: &str = "parlay_builds_submitted_total";
/// Server rejections counter metric name.
pub const METRIC_SERVER_REJECTIONS: &str = "parlay_server_rejections_total";
/// Stale responses counter metric name.
pub const METRIC_STALE_RESPONSES: &str = "parlay_stale_responses_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_BOARD_REFRESH_LATENCY,
        "Time to recompute the odds board from a snapshot batch in milliseconds"
    );
    describe_histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "HTTP request latency in milliseconds"
    );

    describe_counter!(
        METRIC_SNAPSHOTS_PROCESSED,
        "Total number of odds snapshots fed into board recomputation"
    );
    describe_counter!(
        METRIC_SNAPSHOTS_REJECTED,
        "Total number of snapshot records dropped because they failed to decode"
    );
    describe_counter!(
        METRIC_CONFLICTS_REMOVED,
        "Total number of conflicting legs removed from selections"
    );
    describe_counter!(
        METRIC_BUILDS_SUBMITTED,
        "Total number of parlay build requests submitted"
    );
    describe_counter!(
        METRIC_SERVER_REJECTIONS,
        "Total number of parlay builds rejected by the server"
    );
    describe_counter!(
        METRIC_STALE_RESPONSES,
        "Total number of build responses ignored as superseded"
    );

    debug!("Metrics initialized");
}

/// Record HTTP request latency.
pub fn record_http_latency(start: Instant, endpoint: &str) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_HTTP_REQUEST_LATENCY, "endpoint" => endpoint.to_string()).record(latency_ms);
}

/// Add to the snapshots processed counter.
pub fn inc_snapshots_processed(count: usize) {
    counter!(METRIC_SNAPSHOTS_PROCESSED).increment(count as u64);
}

/// Add to the snapshots rejected counter.
pub fn inc_snapshots_rejected(count: usize) {
    if count > 0 {
        counter!(METRIC_SNAPSHOTS_REJECTED).increment(count as u64);
    }
}

/// Add to the conflicts removed counter.
pub fn inc_conflicts_removed(count: usize) {
    counter!(METRIC_CONFLICTS_REMOVED).increment(count as u64);
}

/// Increment builds submitted counter.
pub fn inc_builds_submitted() {
    counter!(METRIC_BUILDS_SUBMITTED).increment(1);
}

/// Increment server rejections counter.
pub fn inc_server_rejections() {
    counter!(METRIC_SERVER_REJECTIONS).increment(1);
}

/// Increment stale responses counter.
pub fn inc_stale_responses() {
    counter!(METRIC_STALE_RESPONSES).increment(1);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric.
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        histogram!(self.metric_name).record(self.elapsed_ms());
    }
}

/// Create a latency timer for board recomputation.
pub fn timer_board_refresh() -> LatencyTimer {
    LatencyTimer::new(METRIC_BOARD_REFRESH_LATENCY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn latency_timer_measures_time() {
        let timer = timer_board_refresh();
        sleep(Duration::from_millis(10));
        assert!(timer.elapsed_ms() >= 9.0);
    }

    #[test]
    fn counters_are_noops_without_recorder() {
        init_metrics();
        inc_snapshots_processed(3);
        inc_snapshots_rejected(0);
        inc_conflicts_removed(1);
        inc_stale_responses();
    }
}
