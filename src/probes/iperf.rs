//! Bandwidth against iperf (v2) servers.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::IperfConfig;
use crate::core::{CheckError, Checker};

use super::{command, elapsed_ms, round2, Direction, Emitter};

/// One data row of `iperf -y C` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IperfRecord {
    /// Stream id, `-1` on the aggregate row of a parallel run.
    pub thread_id: String,
    /// Bytes transferred.
    pub bytes: i64,
    /// Bits per second.
    pub bandwidth: i64,
}

/// Summary of one direction of a test.
#[derive(Debug, Clone, PartialEq)]
pub struct IperfSummary {
    /// Bandwidth in Mbps.
    pub bandwidth_mbps: f64,
    /// Number of parallel streams.
    pub threads: i64,
    /// Bytes transferred.
    pub bytes: i64,
}

/// Parse the CSV report; rows with fewer than nine columns are skipped.
///
/// # Errors
///
/// Returns `CheckError::Parse` when a byte or bandwidth column is not numeric.
pub fn parse_csv(output: &str) -> Result<Vec<IperfRecord>, CheckError> {
    output
        .lines()
        .map(|line| line.trim().split(',').collect::<Vec<_>>())
        .filter(|cols| cols.len() >= 9)
        .map(|cols| {
            let number = |idx: usize| {
                cols[idx]
                    .trim()
                    .parse::<i64>()
                    .map_err(|e| CheckError::Parse(format!("column {idx} ({}): {e}", cols[idx])))
            };
            Ok(IperfRecord {
                thread_id: cols[5].trim().to_string(),
                bytes: number(7)?,
                bandwidth: number(8)?,
            })
        })
        .collect()
}

/// Summarize parsed rows; the last row carries the totals.
#[must_use]
pub fn summarize(records: &[IperfRecord]) -> Option<IperfSummary> {
    let last = records.last()?;
    let threads = if last.thread_id == "-1" {
        i64::try_from(records.len() - 1).unwrap_or(i64::MAX)
    } else {
        1
    };

    #[allow(clippy::cast_precision_loss)]
    let bandwidth_mbps = last.bandwidth as f64 / 1_000_000.0;

    Some(IperfSummary {
        bandwidth_mbps: round2(bandwidth_mbps),
        threads,
        bytes: last.bytes,
    })
}

/// Measures upload and download against each configured server.
pub struct IperfChecker {
    cfg: IperfConfig,
    emitter: Emitter,
    program: String,
}

impl IperfChecker {
    /// Create an iperf checker.
    #[must_use]
    pub fn new(cfg: IperfConfig, emitter: Emitter) -> Self {
        Self {
            cfg,
            emitter,
            program: "iperf".into(),
        }
    }

    /// Use a different iperf executable.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn args(&self, server: &str, direction: Direction) -> Vec<String> {
        let mut args = vec![
            "-c".to_string(),
            server.to_string(),
            "-t".to_string(),
            self.cfg.duration_secs.to_string(),
            "-P".to_string(),
            self.cfg.jobs.to_string(),
            "-y".to_string(),
            "C".to_string(),
        ];
        if direction == Direction::Download {
            args.push("-R".to_string());
        }
        args
    }

    async fn run_test(&self, server: &str, direction: Direction) -> Result<Option<IperfSummary>, CheckError> {
        info!(server, direction = direction.as_str(), jobs = self.cfg.jobs, "Running iperf test");
        let limit = Duration::from_secs(self.cfg.timeout_secs);
        let stdout = command::run(&self.program, &self.args(server, direction), limit).await?;
        Ok(summarize(&parse_csv(&stdout)?))
    }

    /// Run one direction; `false` stops the remaining tests of this run.
    async fn measure(&self, server: &str, direction: Direction) -> bool {
        let start = Instant::now();
        let outcome = self.run_test(server, direction).await;
        let duration_ms = elapsed_ms(start);
        let base = self
            .emitter
            .sample()
            .tag("type", "iperf")
            .tag("direction", direction.as_str())
            .tag("server", server);

        let (sample, ok) = match outcome {
            Ok(Some(summary)) => {
                info!(
                    server,
                    direction = direction.as_str(),
                    bandwidth_mbps = summary.bandwidth_mbps,
                    threads = summary.threads,
                    duration_ms,
                    "iperf test completed"
                );
                let sample = base
                    .tag("result", "success")
                    .value("bandwidth", summary.bandwidth_mbps)
                    .value("threads", summary.threads)
                    .value("bytes", summary.bytes)
                    .value("duration", duration_ms);
                (sample, true)
            }
            Ok(None) => {
                warn!(server, direction = direction.as_str(), "iperf reported no data");
                return true;
            }
            Err(CheckError::Timeout(secs)) => {
                warn!(server, direction = direction.as_str(), secs, "iperf timed out");
                (base.tag("result", "timeout").value("duration", duration_ms), false)
            }
            Err(e) => {
                warn!(server, direction = direction.as_str(), error = %e, "iperf failed");
                let sample = base
                    .tag("result", "error")
                    .tag("error_type", command::error_type(&e))
                    .value("duration", duration_ms);
                (sample, false)
            }
        };
        self.emitter.emit(sample).await;
        ok
    }
}

#[async_trait]
impl Checker for IperfChecker {
    fn name(&self) -> &str {
        "iperf"
    }

    fn enabled(&self) -> bool {
        self.cfg.enabled
    }

    async fn check(&self) -> Result<u64, CheckError> {
        'servers: for server in &self.cfg.targets {
            for direction in Direction::BOTH {
                if !self.measure(server, direction).await {
                    break 'servers;
                }
            }
        }
        Ok(self.cfg.interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SINGLE: &str = "20240101120000,10.0.0.2,5001,10.0.0.1,5001,3,0.0-10.0,1179648000,943718400\n";

    const PARALLEL: &str = "\
20240101120000,10.0.0.2,5001,10.0.0.1,5001,3,0.0-10.0,600000000,480000000
20240101120000,10.0.0.2,5002,10.0.0.1,5001,4,0.0-10.0,500000000,400000000
20240101120000,10.0.0.2,0,10.0.0.1,5001,-1,0.0-10.0,1100000000,880000000
";

    #[test]
    fn test_single_stream_summary() {
        let records = parse_csv(SINGLE).unwrap();
        let summary = summarize(&records).unwrap();
        assert_eq!(summary.threads, 1);
        assert_eq!(summary.bytes, 1_179_648_000);
        assert!((summary.bandwidth_mbps - 943.72).abs() < 1e-9);
    }

    #[test]
    fn test_parallel_summary_uses_aggregate_row() {
        let records = parse_csv(PARALLEL).unwrap();
        assert_eq!(records.len(), 3);
        let summary = summarize(&records).unwrap();
        assert_eq!(summary.threads, 2);
        assert_eq!(summary.bytes, 1_100_000_000);
        assert!((summary.bandwidth_mbps - 880.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_rows_skipped() {
        let records = parse_csv("connect failed\n1,2,3\n").unwrap();
        assert!(records.is_empty());
        assert!(summarize(&records).is_none());
    }

    #[test]
    fn test_non_numeric_bytes_rejected() {
        let err = parse_csv("a,b,c,d,e,3,0-10,lots,100").unwrap_err();
        assert!(matches!(err, CheckError::Parse(_)));
    }

    #[test]
    fn test_download_adds_reverse_flag() {
        let cfg = IperfConfig {
            enabled: true,
            targets: vec!["srv".into()],
            timeout_secs: 30,
            duration_secs: 10,
            jobs: 2,
            interval_secs: 3600,
        };
        let sink = std::sync::Arc::new(crate::core::InMemoryMetricSink::new(4));
        let checker = IperfChecker::new(cfg, Emitter::new(sink, "net"));

        let up = checker.args("srv", Direction::Upload);
        let down = checker.args("srv", Direction::Download);
        assert_eq!(up.join(" "), "-c srv -t 10 -P 2 -y C");
        assert_eq!(down.last().map(String::as_str), Some("-R"));
    }
}
