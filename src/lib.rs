//! # Network Monitor
//!
//! A long-running agent that periodically probes network health and ships
//! the results to a time-series collector.
//!
//! The crate is built around a small interval scheduler running on a
//! dedicated OS thread. Each registered [`Checker`](core::Checker) performs
//! one measurement per run and tells the scheduler how many seconds to wait
//! before the next one.
//!
//! ## Key Features
//!
//! - **Interval Scheduling**: Each check decides its own next interval
//! - **Failure Isolation**: Failed or panicking checks are retried after 30 seconds
//! - **Live Control**: Checkers can be added, removed, enabled, and disabled while running
//! - **Bounded Shutdown**: `stop()` waits at most five seconds for the loop to exit
//! - **Probes**: ping, HTTP/HTTPS, speedtest, iperf, and iperf3
//! - **Line Protocol Transport**: Samples are written to Telegraf over TCP
//!
//! ## Scheduler
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use network_monitor::core::Scheduler;
//!
//! let scheduler = Scheduler::new();
//! scheduler.add_checker(Arc::new(my_checker), Duration::from_secs(2))?;
//! scheduler.start()?;
//!
//! let status = scheduler.get_status();
//! println!("{} tasks, running: {}", status.task_count, status.running);
//!
//! scheduler.stop();
//! ```
//!
//! ## From Configuration
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use network_monitor::builders::build_scheduler;
//! use network_monitor::config::MonitorConfig;
//! use network_monitor::infra::TelegrafSink;
//!
//! let cfg = MonitorConfig::from_env();
//! let sink = Arc::new(TelegrafSink::from_config(&cfg.sink));
//! let scheduler = build_scheduler(&cfg, sink)?;
//! scheduler.start()?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Scheduling core: checker contract, scheduler, errors, and metric samples.
pub mod core;
/// Configuration models for the scheduler, sink, and probes.
pub mod config;
/// Builders to construct scheduler components from configuration.
pub mod builders;
/// Infrastructure adapters for metric transport.
pub mod infra;
/// Network probes.
pub mod probes;
/// Shared utilities.
pub mod util;
