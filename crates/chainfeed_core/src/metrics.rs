//! Ingestion telemetry.
//!
//! The pipeline reports three observations:
//!
//! - [`PARSE_DURATION`]: wall time for one file, tagged `type`, `success`
//!   and `version`
//! - [`TRANSACTION_SIZE`]: transaction payload bytes, tagged `type`
//! - [`TRANSACTION_LATENCY`]: time since consensus, tagged `type`
//!
//! Transport is up to the [`MetricsSink`] implementation.

use parking_lot::RwLock;
use std::time::Duration;
use tracing::info;

/// Metric name for per-file parse duration.
pub const PARSE_DURATION: &str = "chainfeed.parse.duration";

/// Metric name for transaction payload size.
pub const TRANSACTION_SIZE: &str = "chainfeed.transaction.size";

/// Metric name for consensus-to-ingestion latency.
pub const TRANSACTION_LATENCY: &str = "chainfeed.transaction.latency";

/// Key/value tags attached to an observation.
pub type Tags<'a> = &'a [(&'a str, &'a str)];

/// Receives timing and size observations.
pub trait MetricsSink: Send + Sync {
    /// Records a duration observation.
    fn record_duration(&self, name: &str, value: Duration, tags: Tags<'_>);

    /// Records a size observation in bytes.
    fn record_size(&self, name: &str, value: u64, tags: Tags<'_>);
}

/// Discards every observation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn record_duration(&self, _name: &str, _value: Duration, _tags: Tags<'_>) {}

    fn record_size(&self, _name: &str, _value: u64, _tags: Tags<'_>) {}
}

/// Value of a recorded observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricValue {
    /// A duration.
    Duration(Duration),
    /// A size in bytes.
    Size(u64),
}

/// One recorded observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSample {
    /// Metric name.
    pub name: String,
    /// Observed value.
    pub value: MetricValue,
    /// Tags in the order they were supplied.
    pub tags: Vec<(String, String)>,
}

impl MetricSample {
    /// Returns the value of tag `key`.
    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Keeps every observation in memory.
#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    samples: RwLock<Vec<MetricSample>>,
}

impl InMemoryMetrics {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every sample recorded so far.
    pub fn snapshot(&self) -> Vec<MetricSample> {
        self.samples.read().clone()
    }

    /// Returns the samples recorded under `name`.
    pub fn named(&self, name: &str) -> Vec<MetricSample> {
        self.samples
            .read()
            .iter()
            .filter(|s| s.name == name)
            .cloned()
            .collect()
    }

    /// Discards every recorded sample.
    pub fn reset(&self) {
        self.samples.write().clear();
    }

    fn push(&self, name: &str, value: MetricValue, tags: Tags<'_>) {
        self.samples.write().push(MetricSample {
            name: name.to_string(),
            value,
            tags: tags
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        });
    }
}

impl MetricsSink for InMemoryMetrics {
    fn record_duration(&self, name: &str, value: Duration, tags: Tags<'_>) {
        self.push(name, MetricValue::Duration(value), tags);
    }

    fn record_size(&self, name: &str, value: u64, tags: Tags<'_>) {
        self.push(name, MetricValue::Size(value), tags);
    }
}

/// Emits each observation as a `tracing` event on the `chainfeed::metrics` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMetrics;

fn render_tags(tags: Tags<'_>) -> String {
    tags.iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",")
}

impl MetricsSink for TracingMetrics {
    fn record_duration(&self, name: &str, value: Duration, tags: Tags<'_>) {
        info!(
            target: "chainfeed::metrics",
            metric = name,
            millis = value.as_secs_f64() * 1000.0,
            tags = %render_tags(tags),
            "metric"
        );
    }

    fn record_size(&self, name: &str, value: u64, tags: Tags<'_>) {
        info!(
            target: "chainfeed::metrics",
            metric = name,
            bytes = value,
            tags = %render_tags(tags),
            "metric"
        );
    }
}
