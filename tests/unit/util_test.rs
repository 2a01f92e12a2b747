//! Tests for utility functions

use network_monitor::util::{init_tracing, LOG_FORMAT_ENV};

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
    assert!(tracing::dispatcher::has_been_set());
}

#[test]
fn test_log_format_variable_name() {
    assert_eq!(LOG_FORMAT_ENV, "RUST_LOG_FORMAT");
}
