use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus exporter and register all application metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("failed to install Prometheus recorder: {e}"))?;

    // Pre-register counters so they appear even before the first increment.
    counter!("portfolio_requests_total").absolute(0);
    counter!("ticks_dropped_total").absolute(0);
    counter!("source_fetch_failures_total").absolute(0);
    counter!("model_switches_total").absolute(0);
    counter!("price_cache_hits_total").absolute(0);

    // Histogram is lazily created on first record; force creation.
    histogram!("portfolio_build_seconds").record(0.0);

    Ok(handle)
}

/// A handle backed by a recorder that is not installed globally.
///
/// Renders an empty payload; lets several routers coexist in one process.
pub fn detached_handle() -> PrometheusHandle {
    PrometheusBuilder::new().build_recorder().handle()
}
