//! Shared utilities.

pub mod supervisor;
pub mod telemetry;

pub use supervisor::*;
pub use telemetry::*;
