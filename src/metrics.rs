//! Metrics collection and export for connection pools

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Metrics snapshot for a pool
///
/// # Examples
///
/// ```
/// use esox_connpool::{ConnectionSpec, Pool, ResourceFactory};
///
/// struct StringFactory;
/// impl ResourceFactory for StringFactory {
///     type Resource = String;
///     type Error = std::io::Error;
///     fn open(&self, spec: &ConnectionSpec) -> Result<String, Self::Error> {
///         Ok(spec.url().to_string())
///     }
///     fn close(&self, _resource: String) -> Result<(), Self::Error> {
///         Ok(())
///     }
/// }
///
/// let pool = Pool::new(StringFactory);
/// let spec = ConnectionSpec::new("db://host", "app", "secret");
///
/// let conn = pool.acquire(&spec).unwrap();
/// let metrics = pool.metrics();
/// assert_eq!(metrics.total_created, 1);
/// assert_eq!(metrics.checked_out_resources, 1);
/// # drop(conn);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PoolMetrics {
    /// Resources opened by the factory
    pub total_created: usize,

    /// Checkouts served from the pool without opening anything
    pub total_reused: usize,

    /// Releases that returned a resource to the pool
    pub total_recycled: usize,

    /// Resources closed by the sweeper for sitting idle too long
    pub idle_evictions: usize,

    /// Resources closed on release for exceeding the checkout limit
    pub overuse_evictions: usize,

    /// Resources closed by forced release or bulk eviction
    pub forced_closes: usize,

    /// Factory open calls that failed
    pub open_failures: usize,

    /// Checkout probes that failed
    pub validation_failures: usize,

    /// Current registry size
    pub total_resources: usize,

    /// Current available resources
    pub available_resources: usize,

    /// Current checked-out resources
    pub checked_out_resources: usize,
}

impl PoolMetrics {
    /// Export metrics as a HashMap
    pub fn export(&self) -> HashMap<String, String> {
        let mut metrics = HashMap::new();
        metrics.insert("total_created".to_string(), self.total_created.to_string());
        metrics.insert("total_reused".to_string(), self.total_reused.to_string());
        metrics.insert("total_recycled".to_string(), self.total_recycled.to_string());
        metrics.insert("idle_evictions".to_string(), self.idle_evictions.to_string());
        metrics.insert(
            "overuse_evictions".to_string(),
            self.overuse_evictions.to_string(),
        );
        metrics.insert("forced_closes".to_string(), self.forced_closes.to_string());
        metrics.insert("open_failures".to_string(), self.open_failures.to_string());
        metrics.insert(
            "validation_failures".to_string(),
            self.validation_failures.to_string(),
        );
        metrics.insert(
            "total_resources".to_string(),
            self.total_resources.to_string(),
        );
        metrics.insert(
            "available_resources".to_string(),
            self.available_resources.to_string(),
        );
        metrics.insert(
            "checked_out_resources".to_string(),
            self.checked_out_resources.to_string(),
        );
        metrics
    }
}

/// Metrics exporter for Prometheus format
pub struct MetricsExporter;

impl MetricsExporter {
    /// Export metrics in Prometheus exposition format
    pub fn export_prometheus(
        metrics: &PoolMetrics,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> String {
        let mut output = String::new();
        let labels = Self::format_labels(pool_name, tags);

        // Gauge metrics
        output.push_str("# HELP connpool_resources_total Current registry size\n");
        output.push_str("# TYPE connpool_resources_total gauge\n");
        output.push_str(&format!(
            "connpool_resources_total{{{}}} {}\n",
            labels, metrics.total_resources
        ));

        output.push_str("# HELP connpool_resources_available Current available resources\n");
        output.push_str("# TYPE connpool_resources_available gauge\n");
        output.push_str(&format!(
            "connpool_resources_available{{{}}} {}\n",
            labels, metrics.available_resources
        ));

        output.push_str("# HELP connpool_resources_checked_out Current checked-out resources\n");
        output.push_str("# TYPE connpool_resources_checked_out gauge\n");
        output.push_str(&format!(
            "connpool_resources_checked_out{{{}}} {}\n",
            labels, metrics.checked_out_resources
        ));

        // Counter metrics
        output.push_str("# HELP connpool_created_total Resources opened by the factory\n");
        output.push_str("# TYPE connpool_created_total counter\n");
        output.push_str(&format!(
            "connpool_created_total{{{}}} {}\n",
            labels, metrics.total_created
        ));

        output.push_str("# HELP connpool_reused_total Checkouts served from the pool\n");
        output.push_str("# TYPE connpool_reused_total counter\n");
        output.push_str(&format!(
            "connpool_reused_total{{{}}} {}\n",
            labels, metrics.total_reused
        ));

        output.push_str("# HELP connpool_recycled_total Releases returned to the pool\n");
        output.push_str("# TYPE connpool_recycled_total counter\n");
        output.push_str(&format!(
            "connpool_recycled_total{{{}}} {}\n",
            labels, metrics.total_recycled
        ));

        output.push_str("# HELP connpool_idle_evictions_total Resources closed for idling\n");
        output.push_str("# TYPE connpool_idle_evictions_total counter\n");
        output.push_str(&format!(
            "connpool_idle_evictions_total{{{}}} {}\n",
            labels, metrics.idle_evictions
        ));

        output.push_str("# HELP connpool_overuse_evictions_total Resources closed for overuse\n");
        output.push_str("# TYPE connpool_overuse_evictions_total counter\n");
        output.push_str(&format!(
            "connpool_overuse_evictions_total{{{}}} {}\n",
            labels, metrics.overuse_evictions
        ));

        output.push_str("# HELP connpool_forced_closes_total Forced and bulk closes\n");
        output.push_str("# TYPE connpool_forced_closes_total counter\n");
        output.push_str(&format!(
            "connpool_forced_closes_total{{{}}} {}\n",
            labels, metrics.forced_closes
        ));

        output.push_str("# HELP connpool_open_failures_total Factory open failures\n");
        output.push_str("# TYPE connpool_open_failures_total counter\n");
        output.push_str(&format!(
            "connpool_open_failures_total{{{}}} {}\n",
            labels, metrics.open_failures
        ));

        output.push_str("# HELP connpool_validation_failures_total Failed checkout probes\n");
        output.push_str("# TYPE connpool_validation_failures_total counter\n");
        output.push_str(&format!(
            "connpool_validation_failures_total{{{}}} {}\n",
            labels, metrics.validation_failures
        ));

        output
    }

    fn format_labels(pool_name: &str, tags: Option<&HashMap<String, String>>) -> String {
        let mut labels = vec![format!("pool=\"{}\"", pool_name)];

        if let Some(tags) = tags {
            for (key, value) in tags {
                labels.push(format!("{}=\"{}\"", key, value));
            }
        }

        labels.join(",")
    }
}

/// Internal metrics tracker
pub(crate) struct MetricsTracker {
    pub total_created: AtomicUsize,
    pub total_reused: AtomicUsize,
    pub total_recycled: AtomicUsize,
    pub idle_evictions: AtomicUsize,
    pub overuse_evictions: AtomicUsize,
    pub forced_closes: AtomicUsize,
    pub open_failures: AtomicUsize,
    pub validation_failures: AtomicUsize,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self {
            total_created: AtomicUsize::new(0),
            total_reused: AtomicUsize::new(0),
            total_recycled: AtomicUsize::new(0),
            idle_evictions: AtomicUsize::new(0),
            overuse_evictions: AtomicUsize::new(0),
            forced_closes: AtomicUsize::new(0),
            open_failures: AtomicUsize::new(0),
            validation_failures: AtomicUsize::new(0),
        }
    }

    pub fn snapshot(&self, total: usize, available: usize) -> PoolMetrics {
        PoolMetrics {
            total_created: self.total_created.load(Ordering::Relaxed),
            total_reused: self.total_reused.load(Ordering::Relaxed),
            total_recycled: self.total_recycled.load(Ordering::Relaxed),
            idle_evictions: self.idle_evictions.load(Ordering::Relaxed),
            overuse_evictions: self.overuse_evictions.load(Ordering::Relaxed),
            forced_closes: self.forced_closes.load(Ordering::Relaxed),
            open_failures: self.open_failures.load(Ordering::Relaxed),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
            total_resources: total,
            available_resources: available,
            checked_out_resources: total - available,
        }
    }
}

impl Default for MetricsTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prometheus_export_carries_labels_and_series() {
        let tracker = MetricsTracker::new();
        tracker.total_created.store(3, Ordering::Relaxed);
        let metrics = tracker.snapshot(3, 1);

        let mut tags = HashMap::new();
        tags.insert("service".to_string(), "api".to_string());

        let output = MetricsExporter::export_prometheus(&metrics, "primary", Some(&tags));
        assert!(output.contains("connpool_created_total{pool=\"primary\",service=\"api\"} 3"));
        assert!(output.contains("connpool_resources_available"));
        assert!(output.contains("connpool_resources_checked_out{pool=\"primary\",service=\"api\"} 2"));
    }

    #[test]
    fn export_map_covers_every_counter() {
        let metrics = MetricsTracker::new().snapshot(0, 0);
        let map = metrics.export();
        assert_eq!(map.len(), 11);
        assert_eq!(map["total_created"], "0");
    }
}
