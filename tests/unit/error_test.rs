//! Tests for error types

use network_monitor::core::{CheckError, SchedulerError};

#[test]
fn test_empty_scheduler_error() {
    let err = SchedulerError::EmptyScheduler;
    assert_eq!(format!("{}", err), "no checkers added to scheduler");
}

#[test]
fn test_duplicate_checker_error() {
    let err = SchedulerError::DuplicateChecker("ping".to_string());
    assert_eq!(format!("{}", err), "checker already registered: ping");
}

#[test]
fn test_invalid_config_error() {
    let err = SchedulerError::InvalidConfig("max_sleep_ms must be greater than 0".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: max_sleep_ms must be greater than 0"
    );
}

#[test]
fn test_timeout_error() {
    let err = CheckError::Timeout(30);
    assert_eq!(format!("{}", err), "timed out after 30s");
}

#[test]
fn test_process_error() {
    let err = CheckError::Process {
        program: "iperf3".to_string(),
        code: Some(1),
    };
    assert_eq!(format!("{}", err), "iperf3 exited with status Some(1)");
}

#[test]
fn test_io_error_is_transparent() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
    let err = CheckError::from(io);
    assert_eq!(format!("{}", err), "no such file");
}

#[test]
fn test_scheduler_error_converts_to_anyhow() {
    fn fails() -> network_monitor::core::AppResult<()> {
        Err(SchedulerError::EmptyScheduler)?;
        Ok(())
    }
    let err = fails().unwrap_err();
    assert!(err.downcast_ref::<SchedulerError>().is_some());
}
