//! Tests for configuration loading and validation

use std::collections::HashMap;

use network_monitor::config::{MonitorConfig, SchedulerConfig};

fn from_pairs(pairs: &[(&str, &str)]) -> MonitorConfig {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    MonitorConfig::from_lookup(|key| vars.get(key).cloned())
}

#[test]
fn test_scheduler_config_defaults_are_valid() {
    let cfg = SchedulerConfig::default();
    assert_eq!(cfg.retry_delay_secs, 30);
    assert_eq!(cfg.join_timeout_secs, 5);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_scheduler_config_invalid_sleep() {
    let cfg = SchedulerConfig::new().with_max_sleep_ms(0);
    assert!(cfg.validate().is_err());
}

#[test]
fn test_scheduler_config_invalid_min_interval() {
    let cfg = SchedulerConfig::new().with_min_interval_secs(0);
    assert!(cfg.validate().is_err());
}

#[test]
fn test_scheduler_config_invalid_retry_delay() {
    let cfg = SchedulerConfig::new().with_retry_delay_secs(0);
    assert!(cfg.validate().is_err());
}

#[test]
fn test_scheduler_rejects_zero_retry_delay() {
    let cfg = SchedulerConfig::new().with_retry_delay_secs(0);
    let result = network_monitor::core::Scheduler::with_config(cfg);
    assert!(matches!(
        result,
        Err(network_monitor::core::SchedulerError::InvalidConfig(_))
    ));
}

#[test]
fn test_json_zero_retry_delay_rejected() {
    let mut value = serde_json::to_value(from_pairs(&[])).unwrap();
    value["scheduler"]["retry_delay_secs"] = serde_json::json!(0);
    assert!(MonitorConfig::from_json_str(&value.to_string()).is_err());
}

#[test]
fn test_full_environment() {
    let cfg = from_pairs(&[
        ("INFLUXDB_HOST", "telegraf"),
        ("INFLUXDB_PORT", "8094"),
        ("PING_ENABLED", "yes"),
        ("PING_TARGETS", "1.1.1.1; 8.8.8.8;"),
        ("PING_INTERVAL", "30s"),
        ("HTTPS_ENABLED", "true"),
        ("HTTPS_TARGETS", "example.com"),
        ("HTTPS_EXPECTED_STATUS", "200;204"),
        ("SPEEDTEST_INTERVAL", "2h"),
        ("IPERF_JOBS", "4"),
        ("IPERF3_ENABLED", "1"),
        ("IPERF3_SERVER", "iperf.example"),
    ]);

    assert_eq!(cfg.sink.host, "telegraf");
    assert_eq!(cfg.sink.port, 8094);
    assert!(cfg.ping.enabled);
    assert_eq!(cfg.ping.targets, vec!["1.1.1.1", "8.8.8.8"]);
    assert_eq!(cfg.ping.interval_secs, 30);
    assert!(!cfg.http.enabled);
    assert_eq!(cfg.https.expected_status, vec![200, 204]);
    assert_eq!(cfg.speedtest.interval_secs, 7200);
    assert_eq!(cfg.iperf.jobs, 4);
    assert_eq!(cfg.iperf3.server.as_deref(), Some("iperf.example"));
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_json_round_trip() {
    let cfg = from_pairs(&[("PING_ENABLED", "true"), ("PING_TARGETS", "host")]);
    let json = serde_json::to_string(&cfg).unwrap();
    let parsed = MonitorConfig::from_json_str(&json).unwrap();
    assert_eq!(parsed, cfg);
}

#[test]
fn test_json_without_scheduler_section_uses_defaults() {
    let cfg = from_pairs(&[]);
    let mut value = serde_json::to_value(&cfg).unwrap();
    value.as_object_mut().unwrap().remove("scheduler");
    let parsed = MonitorConfig::from_json_str(&value.to_string()).unwrap();
    assert_eq!(parsed.scheduler, SchedulerConfig::default());
}

#[test]
fn test_invalid_json_rejected() {
    assert!(MonitorConfig::from_json_str("{not json").is_err());
}

#[test]
fn test_zero_port_rejected() {
    let mut cfg = from_pairs(&[]);
    cfg.sink.port = 0;
    assert!(cfg.validate().is_err());
}
