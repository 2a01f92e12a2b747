//! HTTP and HTTPS reachability probe.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::info;

use crate::config::HttpConfig;
use crate::core::{CheckError, Checker};

use super::{elapsed_ms, Emitter};

/// URL scheme probed by an [`HttpChecker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// Plain HTTP.
    Http,
    /// HTTP over TLS.
    Https,
}

impl Scheme {
    /// Scheme name, also used as checker name and `type` tag.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }

    /// Tag key carrying the probed URL.
    const fn url_tag(&self) -> &'static str {
        match self {
            Self::Http => "url",
            Self::Https => "target",
        }
    }
}

/// Issues a GET per target and records whether the status was expected.
pub struct HttpChecker {
    scheme: Scheme,
    cfg: HttpConfig,
    emitter: Emitter,
    client: reqwest::Client,
}

impl HttpChecker {
    /// Create a checker for `scheme`.
    ///
    /// # Errors
    ///
    /// Returns `CheckError::Http` if the HTTP client cannot be built.
    pub fn new(scheme: Scheme, cfg: HttpConfig, emitter: Emitter) -> Result<Self, CheckError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;

        Ok(Self {
            scheme,
            cfg,
            emitter,
            client,
        })
    }

    /// Full URL probed for `target`.
    #[must_use]
    pub fn url_for(&self, target: &str) -> String {
        format!("{}://{target}", self.scheme.as_str())
    }

    async fn probe(&self, url: &str) -> (Option<u16>, i64) {
        let start = Instant::now();
        match self.client.get(url).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                (Some(status), elapsed_ms(start))
            }
            Err(e) => {
                let duration = elapsed_ms(start);
                info!(url, error = %e, duration_ms = duration, "GET failed");
                (None, duration)
            }
        }
    }
}

#[async_trait]
impl Checker for HttpChecker {
    fn name(&self) -> &str {
        self.scheme.as_str()
    }

    fn enabled(&self) -> bool {
        self.cfg.enabled
    }

    async fn check(&self) -> Result<u64, CheckError> {
        for target in &self.cfg.targets {
            let url = self.url_for(target);
            let (status, duration_ms) = self.probe(&url).await;
            let success = status.is_some_and(|code| self.cfg.expected_status.contains(&code));
            let result = if success { "success" } else { "failed" };
            if let Some(code) = status {
                info!(url = %url, status = code, result, duration_ms, "GET");
            }

            let sample = self
                .emitter
                .sample()
                .tag("type", self.scheme.as_str())
                .tag("method", "GET")
                .tag(self.scheme.url_tag(), url)
                .tag("result", result)
                .value("duration", duration_ms);
            self.emitter.emit(sample).await;
        }
        Ok(self.cfg.interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::InMemoryMetricSink;
    use std::sync::Arc;

    fn config() -> HttpConfig {
        HttpConfig {
            enabled: true,
            targets: vec!["example.com".into()],
            timeout_secs: 5,
            interval_secs: 60,
            expected_status: vec![200, 301],
        }
    }

    #[test]
    fn test_names_and_urls_follow_scheme() {
        let emitter = Emitter::new(Arc::new(InMemoryMetricSink::new(4)), "b");
        let http = HttpChecker::new(Scheme::Http, config(), emitter.clone()).unwrap();
        let https = HttpChecker::new(Scheme::Https, config(), emitter).unwrap();

        assert_eq!(http.name(), "http");
        assert_eq!(https.name(), "https");
        assert_eq!(http.url_for("example.com/health"), "http://example.com/health");
        assert_eq!(https.url_for("example.com"), "https://example.com");
        assert_eq!(Scheme::Http.url_tag(), "url");
        assert_eq!(Scheme::Https.url_tag(), "target");
    }
}
