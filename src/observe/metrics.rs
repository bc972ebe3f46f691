//! Prometheus metrics for index operations
//!
//! Records per-operation counters, probe-length and latency histograms into
//! a registry owned by the observer. Clones share the same registry.

use super::{IndexEvent, IndexObserver};
use crate::error::{Error, Result};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use tracing::error;

fn metrics_err(e: prometheus::Error) -> Error {
    Error::Metrics(e.to_string())
}

/// Observer that feeds a prometheus registry
#[derive(Clone)]
pub struct MetricsObserver {
    registry: Registry,
    operations: IntCounterVec,
    probes: HistogramVec,
    duration: HistogramVec,
    rehashed: IntCounter,
}

impl std::fmt::Debug for MetricsObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsObserver").finish()
    }
}

impl MetricsObserver {
    /// Create an observer with a fresh registry
    pub fn new() -> Result<Self> {
        Self::with_registry(Registry::new())
    }

    /// Register the index metrics into an existing registry
    pub fn with_registry(registry: Registry) -> Result<Self> {
        let operations = IntCounterVec::new(
            Opts::new("stockindex_operations_total", "Index operations by outcome"),
            &["operation", "outcome"],
        )
        .map_err(metrics_err)?;

        let probes = HistogramVec::new(
            HistogramOpts::new(
                "stockindex_probes",
                "Cells stepped past or records compared per operation",
            )
            .buckets(vec![0.0, 1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 64.0]),
            &["operation"],
        )
        .map_err(metrics_err)?;

        let duration = HistogramVec::new(
            HistogramOpts::new(
                "stockindex_operation_duration_seconds",
                "Index operation duration in seconds",
            )
            .buckets(vec![0.000_001, 0.000_01, 0.000_1, 0.001, 0.01, 0.1]),
            &["operation"],
        )
        .map_err(metrics_err)?;

        let rehashed = IntCounter::new(
            "stockindex_rehashed_records_total",
            "Records re-settled after deletions",
        )
        .map_err(metrics_err)?;

        registry
            .register(Box::new(operations.clone()))
            .map_err(metrics_err)?;
        registry.register(Box::new(probes.clone())).map_err(metrics_err)?;
        registry
            .register(Box::new(duration.clone()))
            .map_err(metrics_err)?;
        registry
            .register(Box::new(rehashed.clone()))
            .map_err(metrics_err)?;

        Ok(Self {
            registry,
            operations,
            probes,
            duration,
            rehashed,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Count of operations with the given labels
    pub fn operation_count(&self, operation: &str, outcome: &str) -> u64 {
        self.operations
            .get_metric_with_label_values(&[operation, outcome])
            .map(|counter| counter.get())
            .unwrap_or(0)
    }

    pub fn rehashed_total(&self) -> u64 {
        self.rehashed.get()
    }

    /// Export all metrics in Prometheus text format
    pub fn export(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(metrics_err)?;

        String::from_utf8(buffer)
            .map_err(|e| Error::Metrics(format!("UTF-8 conversion error: {}", e)))
    }
}

impl IndexObserver for MetricsObserver {
    fn observe(&mut self, event: &IndexEvent) {
        let operation = event.operation.as_str();

        match self
            .operations
            .get_metric_with_label_values(&[operation, event.outcome.as_str()])
        {
            Ok(counter) => counter.inc(),
            Err(e) => error!(error = %e, "Failed to record operation counter"),
        }

        if let Ok(histogram) = self.probes.get_metric_with_label_values(&[operation]) {
            histogram.observe(event.probes as f64);
        }
        if let Ok(histogram) = self.duration.get_metric_with_label_values(&[operation]) {
            histogram.observe(event.elapsed.as_secs_f64());
        }

        self.rehashed.inc_by(event.rehashed as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::{Operation, Outcome};

    #[test]
    fn test_metrics_counting() -> Result<()> {
        let metrics = MetricsObserver::new()?;
        let mut handle = metrics.clone();

        handle.observe(&IndexEvent::new(Operation::Upsert, "A-100", Outcome::Inserted));
        handle.observe(&IndexEvent::new(Operation::Upsert, "A-100", Outcome::Updated));
        handle.observe(&IndexEvent::new(Operation::Upsert, "B-100", Outcome::Inserted));
        handle.observe(
            &IndexEvent::new(Operation::Delete, "A-100", Outcome::Deleted).with_rehashed(3),
        );

        assert_eq!(metrics.operation_count("upsert", "inserted"), 2);
        assert_eq!(metrics.operation_count("upsert", "updated"), 1);
        assert_eq!(metrics.operation_count("delete", "deleted"), 1);
        assert_eq!(metrics.operation_count("find", "found"), 0);
        assert_eq!(metrics.rehashed_total(), 3);
        Ok(())
    }

    #[test]
    fn test_metrics_export() -> Result<()> {
        let mut metrics = MetricsObserver::new()?;
        metrics.observe(&IndexEvent::new(Operation::Find, "K-106", Outcome::Found).with_probes(1));

        let text = metrics.export()?;
        assert!(text.contains("stockindex_operations_total"));
        assert!(text.contains("operation=\"find\""));
        assert!(text.contains("stockindex_probes_bucket"));
        Ok(())
    }

    #[test]
    fn test_duplicate_registration_fails() -> Result<()> {
        let registry = Registry::new();
        let _first = MetricsObserver::with_registry(registry.clone())?;
        let second = MetricsObserver::with_registry(registry);
        assert!(matches!(second, Err(Error::Metrics(_))));
        Ok(())
    }
}
