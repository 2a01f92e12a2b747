//! Bandwidth against a single iperf3 server.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::Iperf3Config;
use crate::core::{CheckError, Checker, Sample};

use super::{command, elapsed_ms, round2, Direction, Emitter};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Connection {
    remote_host: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Start {
    connected: Vec<Connection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Sum {
    bits_per_second: f64,
    retransmits: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct End {
    sum_sent: Sum,
    sum_received: Sum,
}

/// Subset of the `iperf3 -J` report.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Iperf3Report {
    start: Start,
    end: End,
}

impl Iperf3Report {
    /// Parse the JSON printed by the tool.
    ///
    /// # Errors
    ///
    /// Returns `CheckError::Parse` when the output is not valid JSON.
    pub fn parse(stdout: &str) -> Result<Self, CheckError> {
        serde_json::from_str(stdout).map_err(|e| CheckError::Parse(e.to_string()))
    }

    /// Host the client connected to, falling back to `server`.
    #[must_use]
    pub fn remote_host<'a>(&'a self, server: &'a str) -> &'a str {
        self.start
            .connected
            .first()
            .and_then(|c| c.remote_host.as_deref())
            .unwrap_or(server)
    }

    /// Bandwidth in Mbps; upload is read from the sender side, download from the receiver.
    #[must_use]
    pub fn bandwidth_mbps(&self, direction: Direction) -> f64 {
        let bps = match direction {
            Direction::Upload => self.end.sum_sent.bits_per_second,
            Direction::Download => self.end.sum_received.bits_per_second,
        };
        round2(bps / 1_000_000.0)
    }

    /// Retransmitted segments reported by the sender.
    #[must_use]
    pub const fn retransmits(&self) -> i64 {
        self.end.sum_sent.retransmits
    }

    /// Fill a success sample for `direction`.
    #[must_use]
    pub fn to_sample(&self, sample: Sample, server: &str, direction: Direction, duration_ms: i64) -> Sample {
        sample
            .tag("type", "iperf3")
            .tag("direction", direction.as_str())
            .tag("result", "success")
            .tag("server", server)
            .value("server", self.remote_host(server))
            .value("bandwidth", self.bandwidth_mbps(direction))
            .value("retransmits", self.retransmits())
            .value("duration", duration_ms)
    }
}

/// Measures upload then download against the configured server.
pub struct Iperf3Checker {
    cfg: Iperf3Config,
    emitter: Emitter,
    program: String,
}

impl Iperf3Checker {
    /// Create an iperf3 checker.
    #[must_use]
    pub fn new(cfg: Iperf3Config, emitter: Emitter) -> Self {
        Self {
            cfg,
            emitter,
            program: "iperf3".into(),
        }
    }

    /// Use a different iperf3 executable.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn args(&self, server: &str, direction: Direction) -> Vec<String> {
        let mut args = vec![
            "-c".to_string(),
            server.to_string(),
            "-J".to_string(),
            "--time".to_string(),
            self.cfg.duration_secs.to_string(),
            "-P".to_string(),
            self.cfg.jobs.to_string(),
        ];
        if direction == Direction::Download {
            args.push("-R".to_string());
        }
        args
    }

    async fn run_test(&self, server: &str, direction: Direction) -> Result<Iperf3Report, CheckError> {
        info!(server, direction = direction.as_str(), jobs = self.cfg.jobs, "Running iperf3 test");
        let limit = Duration::from_secs(self.cfg.timeout_secs);
        let stdout = command::run(&self.program, &self.args(server, direction), limit).await?;
        Iperf3Report::parse(&stdout)
    }

    async fn measure(&self, server: &str, direction: Direction) -> bool {
        let start = Instant::now();
        let outcome = self.run_test(server, direction).await;
        let duration_ms = elapsed_ms(start);

        let (sample, ok) = match outcome {
            Ok(report) => {
                info!(
                    server,
                    direction = direction.as_str(),
                    bandwidth_mbps = report.bandwidth_mbps(direction),
                    retransmits = report.retransmits(),
                    duration_ms,
                    "iperf3 test completed"
                );
                (report.to_sample(self.emitter.sample(), server, direction, duration_ms), true)
            }
            Err(CheckError::Timeout(secs)) => {
                warn!(server, direction = direction.as_str(), secs, "iperf3 timed out");
                (failure(&self.emitter, direction, "timeout", duration_ms), false)
            }
            Err(e) => {
                warn!(server, direction = direction.as_str(), error = %e, "iperf3 failed");
                let sample = failure(&self.emitter, direction, "error", duration_ms)
                    .value("error_type", command::error_type(&e));
                (sample, false)
            }
        };
        self.emitter.emit(sample).await;
        ok
    }
}

fn failure(emitter: &Emitter, direction: Direction, result: &str, duration_ms: i64) -> Sample {
    emitter
        .sample()
        .tag("type", "iperf3")
        .tag("direction", direction.as_str())
        .tag("result", result)
        .value("duration", duration_ms)
}

#[async_trait]
impl Checker for Iperf3Checker {
    fn name(&self) -> &str {
        "iperf3"
    }

    fn enabled(&self) -> bool {
        self.cfg.enabled
    }

    async fn check(&self) -> Result<u64, CheckError> {
        let Some(server) = self.cfg.server.as_deref().filter(|s| !s.is_empty()) else {
            warn!("iperf3 server not specified");
            let sample = self
                .emitter
                .sample()
                .tag("type", "iperf3")
                .tag("result", "error")
                .value("error_type", "server_not_specified")
                .value("duration", 0_i64);
            self.emitter.emit(sample).await;
            return Ok(self.cfg.interval_secs);
        };

        for direction in Direction::BOTH {
            if !self.measure(server, direction).await {
                break;
            }
        }
        Ok(self.cfg.interval_secs)
    }
}
