//! Probe and metric-sink configuration loaded from the environment.

use std::env;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::SchedulerConfig;

/// Load `.env` file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Parse a duration such as `30`, `30s`, `5m` or `1h` into seconds.
#[must_use]
pub fn parse_seconds(value: &str) -> Option<u64> {
    let value = value.trim();
    let (digits, multiplier) = match value.as_bytes().last()? {
        b's' => (&value[..value.len() - 1], 1),
        b'm' => (&value[..value.len() - 1], 60),
        b'h' => (&value[..value.len() - 1], 3600),
        _ => (value, 1),
    };
    digits.trim().parse::<u64>().ok()?.checked_mul(multiplier)
}

/// Parse a permissive boolean flag (`true`, `1`, `yes`, `on`, `enabled`, ...).
#[must_use]
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "t" | "y" | "yes" | "on" | "enable" | "enabled"
    )
}

/// Split a `;`-separated list, dropping blank entries.
#[must_use]
pub fn parse_targets(value: &str) -> Vec<String> {
    value
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Typed reads over a key/value source.
struct EnvSource<F> {
    lookup: F,
}

impl<F> EnvSource<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn opt(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|s| !s.trim().is_empty())
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.opt(key).unwrap_or_else(|| default.to_string())
    }

    fn flag(&self, key: &str) -> bool {
        self.opt(key).is_some_and(|v| parse_bool(&v))
    }

    fn seconds(&self, key: &str, default: u64) -> u64 {
        match self.opt(key) {
            None => default,
            Some(raw) => parse_seconds(&raw).unwrap_or_else(|| {
                warn!(key, value = %raw, default, "Invalid duration, using default");
                default
            }),
        }
    }

    fn number<T: std::str::FromStr + Copy + std::fmt::Display>(&self, key: &str, default: T) -> T {
        match self.opt(key) {
            None => default,
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!(key, value = %raw, default = %default, "Invalid number, using default");
                default
            }),
        }
    }

    fn targets(&self, key: &str) -> Vec<String> {
        self.opt(key).map(|v| parse_targets(&v)).unwrap_or_default()
    }

    fn status_codes(&self, key: &str, default: &str) -> Vec<u16> {
        parse_targets(&self.string(key, default))
            .into_iter()
            .filter_map(|code| match code.parse() {
                Ok(code) => Some(code),
                Err(_) => {
                    warn!(key, value = %code, "Ignoring invalid status code");
                    None
                }
            })
            .collect()
    }
}

/// Metric collector endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Collector host.
    pub host: String,
    /// Collector TCP port.
    pub port: u16,
    /// Measurement name every sample is written to.
    pub bucket: String,
}

/// ICMP ping probe settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingConfig {
    /// Whether the probe is scheduled.
    pub enabled: bool,
    /// Hosts to ping.
    pub targets: Vec<String>,
    /// Per-host timeout in seconds.
    pub timeout_secs: u64,
    /// Seconds between runs.
    pub interval_secs: u64,
}

/// HTTP or HTTPS reachability probe settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Whether the probe is scheduled.
    pub enabled: bool,
    /// Targets without scheme (`example.com/health`).
    pub targets: Vec<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Seconds between runs.
    pub interval_secs: u64,
    /// Status codes counted as success.
    pub expected_status: Vec<u16>,
}

/// Ookla speedtest settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeedtestConfig {
    /// Whether the probe is scheduled.
    pub enabled: bool,
    /// Timeout of one speedtest run in seconds.
    pub timeout_secs: u64,
    /// Seconds between runs.
    pub interval_secs: u64,
}

/// iperf (v2) bandwidth test settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IperfConfig {
    /// Whether the probe is scheduled.
    pub enabled: bool,
    /// iperf servers to test against.
    pub targets: Vec<String>,
    /// Timeout of one direction in seconds.
    pub timeout_secs: u64,
    /// Test length passed to the tool, in seconds.
    pub duration_secs: u64,
    /// Parallel client streams.
    pub jobs: u32,
    /// Seconds between runs.
    pub interval_secs: u64,
}

/// iperf3 bandwidth test settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Iperf3Config {
    /// Whether the probe is scheduled.
    pub enabled: bool,
    /// iperf3 server; the run reports an error metric when unset.
    pub server: Option<String>,
    /// Timeout of one direction in seconds.
    pub timeout_secs: u64,
    /// Test length passed to the tool, in seconds.
    pub duration_secs: u64,
    /// Parallel client streams.
    pub jobs: u32,
    /// Seconds between runs.
    pub interval_secs: u64,
}

/// Root configuration of the monitoring agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Metric collector endpoint.
    pub sink: SinkConfig,
    /// Scheduler timing.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Ping probe.
    pub ping: PingConfig,
    /// HTTP probe.
    pub http: HttpConfig,
    /// HTTPS probe.
    pub https: HttpConfig,
    /// Speedtest probe.
    pub speedtest: SpeedtestConfig,
    /// iperf probe.
    pub iperf: IperfConfig,
    /// iperf3 probe.
    pub iperf3: Iperf3Config,
}

impl MonitorConfig {
    /// Build configuration from process environment variables.
    ///
    /// Call [`load_dotenv`] first to pick up a `.env` file.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key/value lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let src = EnvSource { lookup };
        Self {
            sink: SinkConfig {
                host: src.string("INFLUXDB_HOST", "localhost"),
                port: src.number("INFLUXDB_PORT", 8086),
                bucket: src.string("INFLUXDB_METRIC", "network-monitor"),
            },
            scheduler: SchedulerConfig::default(),
            ping: PingConfig {
                enabled: src.flag("PING_ENABLED"),
                targets: src.targets("PING_TARGETS"),
                timeout_secs: src.seconds("PING_TIMEOUT", 5),
                interval_secs: src.seconds("PING_INTERVAL", 60),
            },
            http: http_from(&src, "HTTP"),
            https: http_from(&src, "HTTPS"),
            speedtest: SpeedtestConfig {
                enabled: src.flag("SPEEDTEST_ENABLED"),
                timeout_secs: src.seconds("SPEEDTEST_TIMEOUT", 300),
                interval_secs: src.seconds("SPEEDTEST_INTERVAL", 3600),
            },
            iperf: IperfConfig {
                enabled: src.flag("IPERF_ENABLED"),
                targets: src.targets("IPERF_TARGETS"),
                timeout_secs: src.seconds("IPERF_TIMEOUT", 30),
                duration_secs: src.seconds("IPERF_DURATION", 10),
                jobs: src.number("IPERF_JOBS", 1),
                interval_secs: src.seconds("IPERF_INTERVAL", 3600),
            },
            iperf3: Iperf3Config {
                enabled: src.flag("IPERF3_ENABLED"),
                server: src.opt("IPERF3_SERVER").map(|s| s.trim().to_string()),
                timeout_secs: src.seconds("IPERF3_TIMEOUT", 30),
                duration_secs: src.seconds("IPERF3_DURATION", 10),
                jobs: src.number("IPERF3_JOBS", 1),
                interval_secs: src.seconds("IPERF3_INTERVAL", 3600),
            },
        }
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a description of the parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate the sink, scheduler and every enabled probe.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if self.sink.host.is_empty() {
            return Err("sink host must not be empty".into());
        }
        if self.sink.port == 0 {
            return Err("sink port must be greater than 0".into());
        }
        if self.sink.bucket.is_empty() {
            return Err("sink bucket must not be empty".into());
        }
        self.scheduler
            .validate()
            .map_err(|e| format!("scheduler invalid: {e}"))?;

        if self.ping.enabled && self.ping.timeout_secs == 0 {
            return Err("ping timeout must be greater than 0".into());
        }
        for (name, http) in [("http", &self.http), ("https", &self.https)] {
            if http.enabled && http.timeout_secs == 0 {
                return Err(format!("{name} timeout must be greater than 0"));
            }
            if http.enabled && http.expected_status.is_empty() {
                return Err(format!("{name} expected status list must not be empty"));
            }
        }
        if self.speedtest.enabled && self.speedtest.timeout_secs == 0 {
            return Err("speedtest timeout must be greater than 0".into());
        }
        if self.iperf.enabled && self.iperf.jobs == 0 {
            return Err("iperf jobs must be greater than 0".into());
        }
        if self.iperf3.enabled && self.iperf3.jobs == 0 {
            return Err("iperf3 jobs must be greater than 0".into());
        }
        Ok(())
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        info!(
            host = %self.sink.host,
            port = self.sink.port,
            bucket = %self.sink.bucket,
            "Metric sink"
        );
        info!(enabled = self.ping.enabled, targets = self.ping.targets.len(), "ping");
        info!(enabled = self.http.enabled, targets = self.http.targets.len(), "http");
        info!(enabled = self.https.enabled, targets = self.https.targets.len(), "https");
        info!(enabled = self.speedtest.enabled, "speedtest");
        info!(enabled = self.iperf.enabled, targets = self.iperf.targets.len(), "iperf");
        info!(
            enabled = self.iperf3.enabled,
            server = self.iperf3.server.as_deref().unwrap_or("(none)"),
            "iperf3"
        );
    }
}

fn http_from<F>(src: &EnvSource<F>, prefix: &str) -> HttpConfig
where
    F: Fn(&str) -> Option<String>,
{
    HttpConfig {
        enabled: src.flag(&format!("{prefix}_ENABLED")),
        targets: src.targets(&format!("{prefix}_TARGETS")),
        timeout_secs: src.seconds(&format!("{prefix}_TIMEOUT"), 5),
        interval_secs: src.seconds(&format!("{prefix}_INTERVAL"), 60),
        expected_status: src.status_codes(&format!("{prefix}_EXPECTED_STATUS"), "200;301;"),
    }
}
