//! Metrics and observability utilities
//!
//! Records pipeline metrics through the `metrics` facade. The library never
//! installs a recorder; without one every call is a no-op.

use metrics::{counter, describe_counter, describe_histogram, gauge, histogram, Unit};
use std::time::Duration;

/// Metrics prefix for all PaperDigest metrics
pub const METRICS_PREFIX: &str = "paperdigest";

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_chunks_created_total", METRICS_PREFIX),
        Unit::Count,
        "Total chunks produced by the chunker"
    );

    describe_counter!(
        format!("{}_indexes_built_total", METRICS_PREFIX),
        Unit::Count,
        "Total per-paper indexes built or replaced"
    );

    describe_counter!(
        format!("{}_search_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Total multi-paper search queries"
    );

    describe_histogram!(
        format!("{}_search_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Search latency in seconds, embedding included"
    );

    describe_counter!(
        format!("{}_generation_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total text generation calls"
    );

    describe_histogram!(
        format!("{}_generation_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Text generation latency in seconds"
    );

    describe_counter!(
        format!("{}_generation_errors_total", METRICS_PREFIX),
        Unit::Count,
        "Total failed text generation calls"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record chunker output
pub fn record_chunks(chunks_created: usize, strategy: &str) {
    counter!(
        format!("{}_chunks_created_total", METRICS_PREFIX),
        "strategy" => strategy.to_string()
    )
    .increment(chunks_created as u64);
}

/// Helper to record an index build
pub fn record_index_build(chunk_count: usize) {
    counter!(format!("{}_indexes_built_total", METRICS_PREFIX)).increment(1);
    gauge!(format!("{}_last_index_chunks", METRICS_PREFIX)).set(chunk_count as f64);
}

/// Helper to record search metrics
pub fn record_search(duration: Duration, papers_queried: usize, result_count: usize) {
    counter!(format!("{}_search_queries_total", METRICS_PREFIX)).increment(1);

    histogram!(format!("{}_search_duration_seconds", METRICS_PREFIX))
        .record(duration.as_secs_f64());

    gauge!(format!("{}_search_papers_queried", METRICS_PREFIX)).set(papers_queried as f64);
    gauge!(format!("{}_search_results_count", METRICS_PREFIX)).set(result_count as f64);
}

/// Helper to record generation metrics
pub fn record_generation(duration: Duration, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_generation_requests_total", METRICS_PREFIX),
        "status" => status
    )
    .increment(1);

    if success {
        histogram!(format!("{}_generation_duration_seconds", METRICS_PREFIX))
            .record(duration.as_secs_f64());
    } else {
        counter!(format!("{}_generation_errors_total", METRICS_PREFIX)).increment(1);
    }
}
