//! Telegraf/InfluxDB sink speaking line protocol over TCP.
//!
//! Each sample is written as one line on a fresh connection. Connection and
//! write failures are logged and dropped so a missing collector never fails a
//! check.

use std::fmt::Write as _;
use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::SinkConfig;
use crate::core::{MetricSink, MetricValue, Sample};

/// Default connect/write timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Fire-and-forget line protocol sink.
#[derive(Debug, Clone)]
pub struct TelegrafSink {
    addr: String,
    timeout: Duration,
}

impl TelegrafSink {
    /// Create a sink for `host:port`.
    pub fn new(host: impl AsRef<str>, port: u16) -> Self {
        Self {
            addr: format!("{}:{port}", host.as_ref()),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create a sink from the collector section of the configuration.
    #[must_use]
    pub fn from_config(cfg: &SinkConfig) -> Self {
        Self::new(&cfg.host, cfg.port)
    }

    /// Override the connect/write timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Collector address this sink writes to.
    #[must_use]
    pub fn addr(&self) -> &str {
        &self.addr
    }

    async fn send(&self, line: &str) -> io::Result<()> {
        let mut stream = timeout(self.timeout, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "connect timed out"))??;
        timeout(self.timeout, stream.write_all(line.as_bytes()))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "write timed out"))??;
        stream.shutdown().await
    }
}

#[async_trait]
impl MetricSink for TelegrafSink {
    async fn record(&self, sample: Sample) {
        let Some(line) = encode_line(&sample) else {
            debug!(bucket = %sample.bucket, "Skipping sample without values");
            return;
        };
        if let Err(e) = self.send(&line).await {
            warn!(addr = %self.addr, error = %e, "Failed to deliver metric");
        }
    }
}

/// Encode a sample as a newline-terminated line protocol record.
///
/// Returns `None` for samples without values, which line protocol cannot
/// represent.
#[must_use]
pub fn encode_line(sample: &Sample) -> Option<String> {
    if sample.values.is_empty() {
        return None;
    }

    let mut line = escape(&sample.bucket, &[',', ' ']);
    for (key, value) in &sample.tags {
        if value.is_empty() {
            continue;
        }
        let _ = write!(
            line,
            ",{}={}",
            escape(key, &[',', '=', ' ']),
            escape(value, &[',', '=', ' '])
        );
    }

    let fields: Vec<String> = sample
        .values
        .iter()
        .map(|(key, value)| format!("{}={}", escape(key, &[',', '=', ' ']), encode_value(value)))
        .collect();
    let _ = writeln!(line, " {}", fields.join(","));
    Some(line)
}

fn encode_value(value: &MetricValue) -> String {
    match value {
        MetricValue::Int(v) => format!("{v}i"),
        MetricValue::Float(v) => format!("{v}"),
        MetricValue::Text(v) => format!("\"{}\"", escape(v, &['"', '\\'])),
    }
}

fn escape(raw: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
