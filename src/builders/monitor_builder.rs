//! Build checkers and a scheduler from monitoring configuration.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;

use crate::config::MonitorConfig;
use crate::core::{AppResult, Checker, MetricSink, Registration, Scheduler};
use crate::probes::{
    Emitter, HttpChecker, Iperf3Checker, IperfChecker, PingChecker, Scheme, SpeedtestChecker,
};

/// Delay before a checker's first run, staggered so cheap probes report first.
#[must_use]
pub fn initial_delay(checker: &str) -> Duration {
    match checker {
        "ping" => Duration::from_secs(2),
        "http" | "https" => Duration::from_secs(5),
        _ => Duration::from_secs(10),
    }
}

/// Build every probe from configuration, paired with its initial delay.
///
/// Disabled probes are included; the scheduler skips them on registration.
///
/// # Errors
///
/// Fails if an HTTP client cannot be constructed.
pub fn build_checkers(
    cfg: &MonitorConfig,
    sink: &Arc<dyn MetricSink>,
) -> AppResult<Vec<(Arc<dyn Checker>, Duration)>> {
    let emitter = Emitter::new(Arc::clone(sink), cfg.sink.bucket.clone());

    let checkers: Vec<Arc<dyn Checker>> = vec![
        Arc::new(PingChecker::new(cfg.ping.clone(), emitter.clone())),
        Arc::new(
            HttpChecker::new(Scheme::Http, cfg.http.clone(), emitter.clone())
                .context("building http checker")?,
        ),
        Arc::new(
            HttpChecker::new(Scheme::Https, cfg.https.clone(), emitter.clone())
                .context("building https checker")?,
        ),
        Arc::new(SpeedtestChecker::new(cfg.speedtest.clone(), emitter.clone())),
        Arc::new(IperfChecker::new(cfg.iperf.clone(), emitter.clone())),
        Arc::new(Iperf3Checker::new(cfg.iperf3.clone(), emitter)),
    ];

    Ok(checkers
        .into_iter()
        .map(|checker| {
            let delay = initial_delay(checker.name());
            (checker, delay)
        })
        .collect())
}

/// Validate configuration and build a scheduler with every enabled probe registered.
///
/// # Errors
///
/// Fails on invalid configuration, client construction, or duplicate checkers.
pub fn build_scheduler(cfg: &MonitorConfig, sink: Arc<dyn MetricSink>) -> AppResult<Scheduler> {
    cfg.validate()
        .map_err(|e| anyhow::anyhow!("config invalid: {e}"))?;

    let scheduler = Scheduler::with_config(cfg.scheduler.clone())?;
    for (checker, delay) in build_checkers(cfg, &sink)? {
        if let Registration::Scheduled(id) = scheduler.add_checker(checker, delay)? {
            info!(task_id = %id, delay_secs = delay.as_secs(), "Scheduled probe");
        }
    }
    Ok(scheduler)
}
