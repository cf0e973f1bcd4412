use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static PROM_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the process-wide Prometheus recorder. The recorder can only be
/// installed once per process; later calls return the same handle.
pub fn install_recorder() -> anyhow::Result<PrometheusHandle> {
    PROM_HANDLE
        .get_or_try_init(|| {
            PrometheusBuilder::new()
                .install_recorder()
                .map_err(|e| anyhow::anyhow!("failed to install Prometheus metrics recorder: {e}"))
        })
        .cloned()
}

/// Text exposition of everything recorded so far.
pub fn render(handle: &PrometheusHandle) -> String {
    handle.render()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_is_idempotent_and_renders_counters() {
        let handle = install_recorder().unwrap();
        let again = install_recorder().unwrap();

        metrics::counter!("prometheus_install_test_total").increment(3);

        assert!(render(&handle).contains("prometheus_install_test_total 3"));
        assert!(render(&again).contains("prometheus_install_test_total"));
    }
}
