//! Error types for scheduler and probe operations.

use thiserror::Error;

/// Errors produced at the scheduler boundary.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// `start()` was called before any checker was registered.
    #[error("no checkers added to scheduler")]
    EmptyScheduler,
    /// A checker with the same name is already registered.
    #[error("checker already registered: {0}")]
    DuplicateChecker(String),
    /// Scheduler configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The control loop thread could not be spawned.
    #[error("failed to spawn scheduler loop: {0}")]
    Spawn(String),
}

/// Errors raised by a single checker run.
///
/// A `CheckError` means the run itself failed; the scheduler logs it and
/// retries after a fixed delay. Probe outcomes such as an unreachable host are
/// reported as metrics instead.
#[derive(Debug, Error)]
pub enum CheckError {
    /// The probe did not finish within its timeout.
    #[error("timed out after {0}s")]
    Timeout(u64),
    /// An external tool exited with a non-zero status.
    #[error("{program} exited with status {code:?}")]
    Process {
        /// Program that was executed.
        program: String,
        /// Exit code, if the process was not killed by a signal.
        code: Option<i32>,
    },
    /// Output of a probe could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),
    /// A required setting is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),
    /// The checker panicked while running.
    #[error("checker panicked: {0}")]
    Panicked(String),
    /// I/O failure while running the probe.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// HTTP client failure.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
