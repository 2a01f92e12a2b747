//! Core scheduling abstractions: checkers, metric samples and the scheduler.

pub mod checker;
pub mod error;
pub mod metrics;
pub mod scheduler;

pub use checker::Checker;
pub use error::{AppResult, CheckError, SchedulerError};
pub use metrics::{InMemoryMetricSink, MetricSink, MetricValue, Sample};
pub use scheduler::{Registration, Scheduler, StatusSnapshot, TaskId, TaskSummary};
