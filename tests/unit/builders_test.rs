//! Tests for building a scheduler from configuration

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use network_monitor::builders::{build_checkers, build_scheduler, initial_delay};
use network_monitor::config::MonitorConfig;
use network_monitor::core::{InMemoryMetricSink, MetricSink};

fn config(pairs: &[(&str, &str)]) -> MonitorConfig {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    MonitorConfig::from_lookup(|key| vars.get(key).cloned())
}

fn sink() -> Arc<dyn MetricSink> {
    Arc::new(InMemoryMetricSink::new(16))
}

#[test]
fn test_initial_delays() {
    assert_eq!(initial_delay("ping"), Duration::from_secs(2));
    assert_eq!(initial_delay("http"), Duration::from_secs(5));
    assert_eq!(initial_delay("https"), Duration::from_secs(5));
    assert_eq!(initial_delay("speedtest"), Duration::from_secs(10));
    assert_eq!(initial_delay("iperf3"), Duration::from_secs(10));
}

#[test]
fn test_build_checkers_covers_every_probe() {
    let checkers = build_checkers(&config(&[]), &sink()).unwrap();
    let names: Vec<&str> = checkers.iter().map(|(c, _)| c.name()).collect();
    assert_eq!(names, vec!["ping", "http", "https", "speedtest", "iperf", "iperf3"]);
}

#[test]
fn test_build_scheduler_registers_enabled_probes_only() {
    let cfg = config(&[
        ("PING_ENABLED", "true"),
        ("PING_TARGETS", "127.0.0.1"),
        ("HTTP_ENABLED", "true"),
        ("HTTP_TARGETS", "localhost"),
    ]);
    let scheduler = build_scheduler(&cfg, sink()).unwrap();
    assert_eq!(scheduler.task_count(), 2);
    assert!(!scheduler.is_running());

    let status = scheduler.get_status();
    let mut names: Vec<String> = status.tasks.iter().map(|t| t.checker.clone()).collect();
    names.sort();
    assert_eq!(names, vec!["http", "ping"]);
}

#[test]
fn test_build_scheduler_with_nothing_enabled() {
    let scheduler = build_scheduler(&config(&[]), sink()).unwrap();
    assert_eq!(scheduler.task_count(), 0);
    assert!(scheduler.start().is_err());
}

#[test]
fn test_build_scheduler_rejects_invalid_config() {
    let mut cfg = config(&[]);
    cfg.scheduler.max_sleep_ms = 0;
    assert!(build_scheduler(&cfg, sink()).is_err());
}

#[test]
fn test_build_scheduler_validates_probe_and_sink_settings() {
    let mut cfg = config(&[]);
    cfg.sink.port = 0;
    let err = build_scheduler(&cfg, sink()).unwrap_err();
    assert!(err.to_string().contains("config invalid"), "{err}");

    let mut cfg = config(&[("HTTP_ENABLED", "true")]);
    cfg.http.expected_status.clear();
    assert!(build_scheduler(&cfg, sink()).is_err());
}
