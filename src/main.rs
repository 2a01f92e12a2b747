//! network-monitor: periodic network probes reported to Telegraf.
//!
//! # Usage
//!
//! ```bash
//! PING_ENABLED=true PING_TARGETS="1.1.1.1;8.8.8.8" network-monitor
//!
//! # JSON logs, debug level
//! RUST_LOG=debug RUST_LOG_FORMAT=json network-monitor
//! ```
//!
//! Settings are read from the environment and an optional `.env` file.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use network_monitor::builders::build_scheduler;
use network_monitor::config::{load_dotenv, MonitorConfig};
use network_monitor::core::{AppResult, MetricSink};
use network_monitor::infra::TelegrafSink;
use network_monitor::util::{init_tracing, log_status, supervise, SupervisorExit};
use tracing::{error, info, warn};

const STATUS_INTERVAL: Duration = Duration::from_secs(300);

fn main() -> ExitCode {
    load_dotenv();
    init_tracing();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = ?e, "network-monitor failed");
            ExitCode::FAILURE
        }
    }
}

fn run() -> AppResult<()> {
    let cfg = MonitorConfig::from_env();
    cfg.log_summary();

    let sink: Arc<dyn MetricSink> = Arc::new(TelegrafSink::from_config(&cfg.sink));
    let scheduler = build_scheduler(&cfg, sink)?;
    scheduler.start().context("starting scheduler")?;
    log_status(&scheduler);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building signal runtime")?;
    let exit = runtime.block_on(supervise(&scheduler, shutdown_signal(), STATUS_INTERVAL));

    scheduler.stop();
    match exit {
        SupervisorExit::Shutdown => {
            info!("network-monitor stopped");
            Ok(())
        }
        SupervisorExit::SchedulerStopped => Err(anyhow::anyhow!("scheduler loop exited unexpectedly")),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl_c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    () = ctrl_c => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to register SIGTERM handler");
                ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await;
    }
}
