//! Foreground wait loop of the monitoring binary.

use std::future::Future;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::core::Scheduler;

/// How often the loop checks that the scheduler is still running.
const LIVENESS_TICK: Duration = Duration::from_secs(1);

/// Why [`supervise`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorExit {
    /// The shutdown future completed.
    Shutdown,
    /// The scheduler loop stopped on its own.
    SchedulerStopped,
}

/// Wait until `shutdown` completes or the scheduler stops running, logging
/// status every `status_interval`.
pub async fn supervise<F>(scheduler: &Scheduler, shutdown: F, status_interval: Duration) -> SupervisorExit
where
    F: Future<Output = ()>,
{
    let mut status = tokio::time::interval(status_interval);
    status.tick().await;
    let mut liveness = tokio::time::interval(LIVENESS_TICK);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => return SupervisorExit::Shutdown,
            _ = status.tick() => log_status(scheduler),
            _ = liveness.tick() => {
                if !scheduler.is_running() {
                    warn!("scheduler loop is no longer running");
                    return SupervisorExit::SchedulerStopped;
                }
            }
        }
    }
}

/// Log a summary of the scheduler and each task.
pub fn log_status(scheduler: &Scheduler) {
    let status = scheduler.get_status();
    info!(
        running = status.running,
        tasks = status.task_count,
        next_run_in_secs = status
            .next_run
            .map(|at| at.saturating_duration_since(Instant::now()).as_secs()),
        "scheduler status"
    );
    for task in &status.tasks {
        info!(
            checker = %task.checker,
            enabled = task.enabled,
            interval_secs = task.interval_secs,
            next_run_in_secs = task.next_run_in().as_secs(),
            "task"
        );
    }
}
