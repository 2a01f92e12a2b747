//! Internet bandwidth through the Ookla `speedtest` CLI.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::SpeedtestConfig;
use crate::core::{CheckError, Checker, Sample};

use super::{command, elapsed_ms, round2, Emitter};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Transfer {
    bandwidth: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Latency {
    latency: Option<f64>,
    jitter: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Server {
    name: Option<String>,
}

/// Subset of the `speedtest --format=json` report.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpeedtestReport {
    download: Transfer,
    upload: Transfer,
    ping: Latency,
    packet_loss: Option<f64>,
    server: Server,
}

impl SpeedtestReport {
    /// Parse the JSON printed by the CLI.
    ///
    /// # Errors
    ///
    /// Returns `CheckError::Parse` when the output is not valid JSON.
    pub fn parse(stdout: &str) -> Result<Self, CheckError> {
        serde_json::from_str(stdout).map_err(|e| CheckError::Parse(e.to_string()))
    }

    /// Download rate in Mbps.
    #[must_use]
    pub fn download_mbps(&self) -> f64 {
        to_mbps(self.download.bandwidth)
    }

    /// Upload rate in Mbps.
    #[must_use]
    pub fn upload_mbps(&self) -> f64 {
        to_mbps(self.upload.bandwidth)
    }

    /// Name of the server measured against.
    #[must_use]
    pub fn server_name(&self) -> &str {
        self.server.name.as_deref().unwrap_or("unknown")
    }

    /// Fill a success sample with this report's values.
    #[must_use]
    pub fn to_sample(&self, sample: Sample, duration_ms: i64) -> Sample {
        let rounded = |v: Option<f64>| v.map_or(0.0, round2);
        sample
            .tag("type", "speedtest")
            .tag("server", self.server_name())
            .tag("result", "success")
            .value("duration", duration_ms)
            .value("download", round2(self.download_mbps()))
            .value("upload", round2(self.upload_mbps()))
            .value("ping_latency", rounded(self.ping.latency))
            .value("ping_jitter", rounded(self.ping.jitter))
            .value("ping_high", rounded(self.ping.high))
            .value("ping_low", rounded(self.ping.low))
            .value("packet_loss", rounded(self.packet_loss))
    }
}

/// Bytes per second to megabits per second.
fn to_mbps(bytes_per_sec: Option<f64>) -> f64 {
    bytes_per_sec.map_or(0.0, |b| b * 8.0 / 1_000_000.0)
}

/// Runs a full speedtest once per interval.
pub struct SpeedtestChecker {
    cfg: SpeedtestConfig,
    emitter: Emitter,
    program: String,
}

impl SpeedtestChecker {
    /// Create a speedtest checker.
    #[must_use]
    pub fn new(cfg: SpeedtestConfig, emitter: Emitter) -> Self {
        Self {
            cfg,
            emitter,
            program: "speedtest".into(),
        }
    }

    /// Use a different speedtest executable.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    async fn measure(&self) -> Result<SpeedtestReport, CheckError> {
        let args = ["--accept-license", "--accept-gdpr", "--format=json"].map(String::from);
        let limit = Duration::from_secs(self.cfg.timeout_secs);
        let stdout = command::run(&self.program, &args, limit).await?;
        SpeedtestReport::parse(&stdout)
    }
}

#[async_trait]
impl Checker for SpeedtestChecker {
    fn name(&self) -> &str {
        "speedtest"
    }

    fn enabled(&self) -> bool {
        self.cfg.enabled
    }

    async fn check(&self) -> Result<u64, CheckError> {
        info!(timeout_secs = self.cfg.timeout_secs, "Starting speedtest");
        let start = Instant::now();
        let outcome = self.measure().await;
        let duration_ms = elapsed_ms(start);

        let sample = match outcome {
            Ok(report) => {
                info!(
                    server = report.server_name(),
                    download_mbps = round2(report.download_mbps()),
                    upload_mbps = round2(report.upload_mbps()),
                    duration_ms,
                    "speedtest succeeded"
                );
                report.to_sample(self.emitter.sample(), duration_ms)
            }
            Err(CheckError::Timeout(secs)) => {
                warn!(secs, "speedtest timed out");
                self.emitter
                    .sample()
                    .tag("type", "speedtest")
                    .tag("result", "timeout")
                    .value("duration", duration_ms)
            }
            Err(e) => {
                warn!(error = %e, "speedtest failed");
                self.emitter
                    .sample()
                    .tag("type", "speedtest")
                    .tag("result", "error")
                    .tag("error_type", command::error_type(&e))
                    .value("duration", duration_ms)
            }
        };
        self.emitter.emit(sample).await;

        Ok(self.cfg.interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MetricValue;

    const REPORT: &str = r#"{
        "type": "result",
        "ping": {"jitter": 0.512, "latency": 9.876, "low": 9.1, "high": 10.444},
        "download": {"bandwidth": 12500000, "bytes": 150000000, "elapsed": 12000},
        "upload": {"bandwidth": 2500000, "bytes": 30000000, "elapsed": 12000},
        "packetLoss": 0,
        "server": {"id": 1, "name": "Example ISP", "location": "Town"}
    }"#;

    #[test]
    fn test_parse_report() {
        let report = SpeedtestReport::parse(REPORT).unwrap();
        assert!((report.download_mbps() - 100.0).abs() < 1e-9);
        assert!((report.upload_mbps() - 20.0).abs() < 1e-9);
        assert_eq!(report.server_name(), "Example ISP");
    }

    #[test]
    fn test_report_sample_values() {
        let report = SpeedtestReport::parse(REPORT).unwrap();
        let sample = report.to_sample(Sample::new("net"), 12345);

        assert_eq!(sample.tag_value("server"), Some("Example ISP"));
        assert_eq!(sample.tag_value("result"), Some("success"));
        assert_eq!(sample.values["duration"], MetricValue::Int(12345));
        assert_eq!(sample.values["download"], MetricValue::Float(100.0));
        assert_eq!(sample.values["ping_latency"], MetricValue::Float(9.88));
        assert_eq!(sample.values["ping_high"], MetricValue::Float(10.44));
        assert_eq!(sample.values["packet_loss"], MetricValue::Float(0.0));
    }

    #[test]
    fn test_missing_sections_default_to_zero() {
        let report = SpeedtestReport::parse("{}").unwrap();
        assert!(report.download_mbps().abs() < f64::EPSILON);
        assert_eq!(report.server_name(), "unknown");
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = SpeedtestReport::parse("not json").unwrap_err();
        assert!(matches!(err, CheckError::Parse(_)));
        assert_eq!(command::error_type(&err), "json_error");
    }
}
