//! Prometheus metrics for query latency and outcomes.
//!
//! Every metric is labelled with the [`QueryKind`] that produced it.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use tracing::{debug, info};

use crate::directory::QueryKind;

// === Metric Name Constants ===

/// Query latency metric name.
pub const METRIC_QUERY_LATENCY: &str = "gateway_query_latency_ms";
/// Queries executed counter metric name.
pub const METRIC_QUERIES: &str = "gateway_queries_total";
/// Failed queries counter metric name.
pub const METRIC_QUERY_FAILURES: &str = "gateway_query_failures_total";
/// Rows returned counter metric name.
pub const METRIC_ROWS_RETURNED: &str = "gateway_rows_returned_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_QUERY_LATENCY,
        "Store query latency in milliseconds"
    );
    describe_counter!(METRIC_QUERIES, "Total number of store queries issued");
    describe_counter!(
        METRIC_QUERY_FAILURES,
        "Total number of store queries that failed"
    );
    describe_counter!(
        METRIC_ROWS_RETURNED,
        "Total number of rows returned to clients"
    );

    debug!("Metrics initialized");
}

/// Install the Prometheus recorder with a scrape endpoint on `port`.
pub fn install_exporter(port: u16) -> Result<(), BuildError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    info!("Prometheus metrics listening on {}", addr);
    Ok(())
}

/// Record a successful query.
pub fn record_query_success(kind: QueryKind, start: Instant, rows: usize) {
    let label: &'static str = kind.into();
    histogram!(METRIC_QUERY_LATENCY, "query" => label).record(elapsed_ms(start));
    counter!(METRIC_QUERIES, "query" => label).increment(1);
    counter!(METRIC_ROWS_RETURNED, "query" => label).increment(rows as u64);
}

/// Record a failed query.
pub fn record_query_failure(kind: QueryKind, start: Instant) {
    let label: &'static str = kind.into();
    histogram!(METRIC_QUERY_LATENCY, "query" => label).record(elapsed_ms(start));
    counter!(METRIC_QUERIES, "query" => label).increment(1);
    counter!(METRIC_QUERY_FAILURES, "query" => label).increment(1);
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
