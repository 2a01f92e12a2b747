//! ICMP reachability through the system `ping` tool.

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::config::PingConfig;
use crate::core::{CheckError, Checker};

use super::{command, Emitter};

/// Grace period on top of the ping timeout before the tool is killed.
const KILL_GRACE: Duration = Duration::from_secs(2);

/// Outcome of pinging one host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PingOutcome {
    /// Echo reply received after this many milliseconds.
    Reply(f64),
    /// No reply within the timeout.
    Timeout,
    /// The host could not be pinged (resolution failure, tool missing).
    Failed,
}

impl PingOutcome {
    const fn result(&self) -> &'static str {
        match self {
            Self::Reply(_) => "success",
            Self::Timeout => "timeout",
            Self::Failed => "failed",
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn duration_ms(&self) -> i64 {
        match self {
            Self::Reply(ms) => *ms as i64,
            Self::Timeout | Self::Failed => -1,
        }
    }
}

/// Pings each configured host once per run.
pub struct PingChecker {
    cfg: PingConfig,
    emitter: Emitter,
    program: String,
}

impl PingChecker {
    /// Create a ping checker.
    #[must_use]
    pub fn new(cfg: PingConfig, emitter: Emitter) -> Self {
        Self {
            cfg,
            emitter,
            program: "ping".into(),
        }
    }

    /// Use a different ping executable.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    async fn ping(&self, host: &str) -> PingOutcome {
        let args = vec![
            "-c".to_string(),
            "1".to_string(),
            "-W".to_string(),
            self.cfg.timeout_secs.to_string(),
            host.to_string(),
        ];
        let limit = Duration::from_secs(self.cfg.timeout_secs) + KILL_GRACE;
        match command::run(&self.program, &args, limit).await {
            Ok(stdout) => parse_reply_time(&stdout).map_or(PingOutcome::Timeout, PingOutcome::Reply),
            // ping exits with 1 when no reply arrived
            Err(CheckError::Process { code: Some(1), .. } | CheckError::Timeout(_)) => {
                PingOutcome::Timeout
            }
            Err(_) => PingOutcome::Failed,
        }
    }
}

#[async_trait]
impl Checker for PingChecker {
    fn name(&self) -> &str {
        "ping"
    }

    fn enabled(&self) -> bool {
        self.cfg.enabled
    }

    async fn check(&self) -> Result<u64, CheckError> {
        for host in &self.cfg.targets {
            let outcome = self.ping(host).await;
            info!(host = %host, result = outcome.result(), duration_ms = outcome.duration_ms(), "ping");

            let sample = self
                .emitter
                .sample()
                .tag("type", "ping")
                .tag("host", host.as_str())
                .tag("result", outcome.result())
                .value("duration", outcome.duration_ms());
            self.emitter.emit(sample).await;
        }
        Ok(self.cfg.interval_secs)
    }
}

/// Extract the round-trip time from `ping` output (`time=12.3 ms`).
#[must_use]
pub fn parse_reply_time(stdout: &str) -> Option<f64> {
    let start = stdout.find("time=").or_else(|| stdout.find("time<"))? + 5;
    let rest = &stdout[start..];
    let end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(rest.len());
    rest[..end].parse().ok()
}
