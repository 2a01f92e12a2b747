//! Network probes implementing [`Checker`](crate::core::Checker).
//!
//! Every probe receives its configuration and a shared [`MetricSink`] at
//! construction and reports each target's outcome as a sample. A probe that
//! cannot reach its target still succeeds as a run; it returns its interval and
//! the failure shows up in the metrics.

mod command;
pub mod http;
pub mod iperf;
pub mod iperf3;
pub mod ping;
pub mod speedtest;

use std::sync::Arc;

use crate::core::{MetricSink, Sample};

pub use http::{HttpChecker, Scheme};
pub use iperf::IperfChecker;
pub use iperf3::Iperf3Checker;
pub use ping::PingChecker;
pub use speedtest::SpeedtestChecker;

/// Destination of a probe's samples: a sink plus the measurement name.
#[derive(Clone)]
pub struct Emitter {
    sink: Arc<dyn MetricSink>,
    bucket: String,
}

impl Emitter {
    /// Create an emitter writing to `bucket` through `sink`.
    pub fn new(sink: Arc<dyn MetricSink>, bucket: impl Into<String>) -> Self {
        Self {
            sink,
            bucket: bucket.into(),
        }
    }

    /// Start a sample for this emitter's bucket.
    #[must_use]
    pub fn sample(&self) -> Sample {
        Sample::new(&self.bucket)
    }

    /// Push a sample to the sink.
    pub async fn emit(&self, sample: Sample) {
        self.sink.record(sample).await;
    }
}

/// Transfer direction of a bandwidth test, seen from this host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Client sends to the server.
    Upload,
    /// Server sends to the client (`-R`).
    Download,
}

impl Direction {
    /// Both directions in the order they are measured.
    pub const BOTH: [Self; 2] = [Self::Upload, Self::Download];

    /// Tag value for this direction.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Download => "download",
        }
    }
}

/// Round to two decimals, as reported bandwidth and latency values are.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Milliseconds elapsed since `start`, saturating.
pub(crate) fn elapsed_ms(start: std::time::Instant) -> i64 {
    i64::try_from(start.elapsed().as_millis()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert!((round2(93.456) - 93.46).abs() < f64::EPSILON);
        assert!((round2(0.004) - 0.0).abs() < f64::EPSILON);
    }
}
