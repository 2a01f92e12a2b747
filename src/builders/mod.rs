//! Builders that turn a [`MonitorConfig`](crate::config::MonitorConfig) into
//! scheduler components.

pub mod monitor_builder;

pub use monitor_builder::{build_checkers, build_scheduler, initial_delay};
