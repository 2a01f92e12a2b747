//! The checker abstraction driven by the scheduler.

use async_trait::async_trait;

use super::CheckError;

/// A self-describing unit of monitoring work.
///
/// The scheduler only depends on this trait; concrete probes (ping, HTTP,
/// bandwidth tests) live in [`crate::probes`].
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use network_monitor::core::{CheckError, Checker};
///
/// struct Heartbeat;
///
/// #[async_trait]
/// impl Checker for Heartbeat {
///     fn name(&self) -> &str {
///         "heartbeat"
///     }
///
///     fn enabled(&self) -> bool {
///         true
///     }
///
///     async fn check(&self) -> Result<u64, CheckError> {
///         Ok(30)
///     }
/// }
/// ```
#[async_trait]
pub trait Checker: Send + Sync + 'static {
    /// Stable identity used by name-based lookups.
    fn name(&self) -> &str;

    /// Whether the checker should be scheduled at all.
    ///
    /// Evaluated once, when the checker is registered.
    fn enabled(&self) -> bool;

    /// Run the probe and return the number of seconds until the next run.
    ///
    /// # Threading
    ///
    /// Called from the scheduler's loop thread inside a single-threaded tokio
    /// runtime. A slow check delays every other due task in the same scan.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckError`] when the run itself failed.
    async fn check(&self) -> Result<u64, CheckError>;
}
