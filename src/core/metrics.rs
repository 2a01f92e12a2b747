//! Metric samples and sink implementations.
//!
//! Checkers push tagged numeric samples to a [`MetricSink`]. Delivery is
//! best-effort: a sink never reports failure back to the checker.

use std::collections::{BTreeMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;

/// A single field value of a sample.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    /// Integer field.
    Int(i64),
    /// Floating point field.
    Float(f64),
    /// String field.
    Text(String),
}

impl From<i64> for MetricValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for MetricValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for MetricValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for MetricValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Tagged sample destined for one measurement (bucket).
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Measurement name.
    pub bucket: String,
    /// Categorical dimensions (probe type, target, result).
    pub tags: BTreeMap<String, String>,
    /// Measured values (duration, bandwidth).
    pub values: BTreeMap<String, MetricValue>,
}

impl Sample {
    /// Start a sample for `bucket` with no tags or values.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            tags: BTreeMap::new(),
            values: BTreeMap::new(),
        }
    }

    /// Add a tag.
    #[must_use]
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Add a value.
    #[must_use]
    pub fn value(mut self, key: impl Into<String>, value: impl Into<MetricValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Look up a tag.
    #[must_use]
    pub fn tag_value(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

/// Metric sink abstraction.
#[async_trait]
pub trait MetricSink: Send + Sync {
    /// Record a sample. Failures are handled inside the sink.
    async fn record(&self, sample: Sample);
}

/// In-memory sink for testing and dev.
pub struct InMemoryMetricSink {
    samples: Mutex<VecDeque<Sample>>,
    max_samples: usize,
}

impl InMemoryMetricSink {
    /// Create a new in-memory sink with a bounded buffer.
    ///
    /// A capacity of zero discards every sample.
    #[must_use]
    pub fn new(max_samples: usize) -> Self {
        Self {
            samples: Mutex::new(VecDeque::with_capacity(max_samples.min(1024))),
            max_samples,
        }
    }

    /// Retrieve a snapshot of stored samples.
    #[must_use]
    pub fn samples(&self) -> Vec<Sample> {
        self.samples.lock().iter().cloned().collect()
    }

    /// Number of stored samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }

    /// Whether no sample has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.lock().is_empty()
    }
}

#[async_trait]
impl MetricSink for InMemoryMetricSink {
    async fn record(&self, sample: Sample) {
        if self.max_samples == 0 {
            return;
        }
        let mut samples = self.samples.lock();
        if samples.len() >= self.max_samples {
            samples.pop_front();
        }
        samples.push_back(sample);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_builder() {
        let sample = Sample::new("network-monitor")
            .tag("type", "ping")
            .tag("host", "1.1.1.1")
            .value("duration", 12_i64)
            .value("loss", 0.5);

        assert_eq!(sample.bucket, "network-monitor");
        assert_eq!(sample.tag_value("type"), Some("ping"));
        assert_eq!(sample.values.get("duration"), Some(&MetricValue::Int(12)));
        assert_eq!(sample.values.get("loss"), Some(&MetricValue::Float(0.5)));
    }

    #[tokio::test]
    async fn test_in_memory_sink_is_bounded() {
        let sink = InMemoryMetricSink::new(2);
        for i in 0..3_i64 {
            sink.record(Sample::new("b").value("n", i)).await;
        }

        let samples = sink.samples();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].values.get("n"), Some(&MetricValue::Int(1)));
        assert_eq!(samples[1].values.get("n"), Some(&MetricValue::Int(2)));
    }

    #[tokio::test]
    async fn test_zero_capacity_sink_stores_nothing() {
        let sink = InMemoryMetricSink::new(0);
        sink.record(Sample::new("b").value("n", 1_i64)).await;

        assert!(sink.is_empty());
        assert_eq!(sink.len(), 0);
    }
}
