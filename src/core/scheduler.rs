//! Interval scheduler that drives registered checkers from a dedicated thread.
//!
//! The scheduler keeps a list of `ScheduledTask` records behind a
//! `parking_lot::Mutex` and runs one control loop on its own OS thread. Each
//! iteration scans for due tasks, runs them one after another, reschedules them
//! from the interval their checker returned, then waits for the next due time.
//!
//! # Design
//!
//! - **Own runtime**: the loop thread has a single-threaded tokio runtime and
//!   drives each async `check()` with `block_on`
//! - **Lock is never held across a check**: results are written back by
//!   [`TaskId`], so a task removed mid-run is not resurrected
//! - **Bounded waits**: the loop never sleeps more than `max_sleep` at a time,
//!   which bounds how long `stop()` takes to be observed
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use network_monitor::core::Scheduler;
//!
//! let scheduler = Scheduler::new();
//! scheduler.add_checker(Arc::new(my_checker), Duration::from_secs(2))?;
//! scheduler.start()?;
//! // ...
//! scheduler.stop();
//! ```

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tokio::runtime::Runtime;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::SchedulerConfig;

use super::{CheckError, Checker, SchedulerError};

/// Opaque identity of a scheduled task.
pub type TaskId = Uuid;

/// Upper bound used when an interval would overflow `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

/// Outcome of [`Scheduler::add_checker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The checker was enabled and a task was created.
    Scheduled(TaskId),
    /// The checker reported itself disabled; nothing was stored.
    Disabled,
}

impl Registration {
    /// Task identifier, if a task was created.
    #[must_use]
    pub const fn task_id(&self) -> Option<TaskId> {
        match self {
            Self::Scheduled(id) => Some(*id),
            Self::Disabled => None,
        }
    }
}

/// Bookkeeping record pairing a checker with its next due time.
pub(crate) struct ScheduledTask {
    pub(crate) id: TaskId,
    pub(crate) checker: Arc<dyn Checker>,
    pub(crate) next_time: Instant,
    pub(crate) interval: u64,
    pub(crate) enabled: bool,
}

impl ScheduledTask {
    fn new(checker: Arc<dyn Checker>, next_time: Instant) -> Self {
        Self {
            id: Uuid::new_v4(),
            checker,
            next_time,
            interval: 0,
            enabled: true,
        }
    }

    fn is_due(&self, now: Instant) -> bool {
        self.enabled && self.next_time <= now
    }

    fn summary(&self) -> TaskSummary {
        TaskSummary {
            id: self.id,
            checker: self.checker.name().to_string(),
            enabled: self.enabled,
            interval_secs: self.interval,
            next_run: self.next_time,
        }
    }
}

/// Per-task entry of a [`StatusSnapshot`].
#[derive(Debug, Clone)]
pub struct TaskSummary {
    /// Task identifier.
    pub id: TaskId,
    /// Checker name.
    pub checker: String,
    /// Whether the task takes part in scans.
    pub enabled: bool,
    /// Interval returned by the last successful run (0 before the first one).
    pub interval_secs: u64,
    /// Instant at which the task becomes due.
    pub next_run: Instant,
}

impl TaskSummary {
    /// Time left until the task becomes due (zero if already due).
    #[must_use]
    pub fn next_run_in(&self) -> Duration {
        self.next_run.saturating_duration_since(Instant::now())
    }
}

/// Read-only view of the scheduler state.
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    /// Whether the control loop is running.
    pub running: bool,
    /// Number of registered tasks.
    pub task_count: usize,
    /// Earliest due time across all tasks, enabled or not.
    pub next_run: Option<Instant>,
    /// Per-task summaries in registration order.
    pub tasks: Vec<TaskSummary>,
}

/// Stop flag with Condvar-based wakeup, one per loop run.
struct StopSignal {
    stopped: Mutex<bool>,
    condvar: Condvar,
}

impl StopSignal {
    fn new() -> Self {
        Self {
            stopped: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    fn trigger(&self) {
        *self.stopped.lock() = true;
        self.condvar.notify_all();
    }

    fn is_set(&self) -> bool {
        *self.stopped.lock()
    }

    /// Block for up to `timeout`. Returns true if stop was signalled.
    fn wait(&self, timeout: Duration) -> bool {
        let mut stopped = self.stopped.lock();
        if !*stopped {
            self.condvar
                .wait_while_for(&mut stopped, |stopped| !*stopped, timeout);
        }
        *stopped
    }
}

/// A running control loop.
struct LoopHandle {
    stop: Arc<StopSignal>,
    thread: JoinHandle<()>,
}

/// State shared between the scheduler handle and its loop thread.
struct Shared {
    tasks: Mutex<Vec<ScheduledTask>>,
    running: AtomicBool,
    config: SchedulerConfig,
}

impl Shared {
    /// Run every enabled task due at `now`, in registration order.
    ///
    /// Returns the number of checks executed.
    fn run_pending(&self, runtime: &Runtime, stop: &StopSignal, now: Instant) -> usize {
        let due: Vec<(TaskId, Arc<dyn Checker>)> = {
            let tasks = self.tasks.lock();
            tasks
                .iter()
                .filter(|task| task.is_due(now))
                .map(|task| (task.id, Arc::clone(&task.checker)))
                .collect()
        };

        let mut executed = 0;
        for (id, checker) in due {
            if stop.is_set() {
                break;
            }
            // Disabled or removed since the scan started.
            if !self.is_enabled(id) {
                continue;
            }

            info!(checker = checker.name(), "Running checker");
            let outcome = execute(runtime, checker.as_ref());
            self.reschedule(id, checker.name(), outcome, now);
            executed += 1;
        }
        executed
    }

    fn is_enabled(&self, id: TaskId) -> bool {
        self.tasks
            .lock()
            .iter()
            .any(|task| task.id == id && task.enabled)
    }

    fn reschedule(&self, id: TaskId, name: &str, outcome: Result<u64, CheckError>, anchor: Instant) {
        let mut tasks = self.tasks.lock();
        let Some(task) = tasks.iter_mut().find(|task| task.id == id) else {
            debug!(checker = name, "Checker removed while running, discarding result");
            return;
        };

        match outcome {
            Ok(interval) => {
                let interval = self.clamp_interval(name, interval);
                task.interval = interval;
                task.next_time = deadline(anchor, Duration::from_secs(interval));
                info!(checker = name, interval_secs = interval, "Next run scheduled");
            }
            Err(e) => {
                let retry = self.config.retry_delay();
                error!(
                    checker = name,
                    error = %e,
                    retry_secs = retry.as_secs(),
                    "Error running checker"
                );
                task.next_time = deadline(anchor, retry);
            }
        }
    }

    fn clamp_interval(&self, name: &str, interval: u64) -> u64 {
        let min = self.config.min_interval_secs;
        if interval < min {
            warn!(
                checker = name,
                interval_secs = interval,
                min_interval_secs = min,
                "Checker returned an interval below the minimum, clamping"
            );
            return min;
        }
        interval
    }

    /// Wait until the earliest enabled task is due, at most `max_sleep`.
    fn sleep_until_next(&self, stop: &StopSignal) {
        let max_sleep = self.config.max_sleep();
        let next = {
            let tasks = self.tasks.lock();
            tasks
                .iter()
                .filter(|task| task.enabled)
                .map(|task| task.next_time)
                .min()
        };

        let wait = next.map_or(max_sleep, |next| {
            next.saturating_duration_since(Instant::now()).min(max_sleep)
        });
        if !wait.is_zero() {
            stop.wait(wait);
        }
    }

    fn run_loop(&self, stop: &StopSignal) {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                error!(error = %e, "Failed to create scheduler runtime");
                self.running.store(false, Ordering::Release);
                return;
            }
        };

        debug!("Scheduler loop started");
        while self.running.load(Ordering::Acquire) && !stop.is_set() {
            let iteration = panic::catch_unwind(AssertUnwindSafe(|| {
                self.run_pending(&runtime, stop, Instant::now());
                self.sleep_until_next(stop);
            }));

            if let Err(payload) = iteration {
                error!(error = %panic_message(payload.as_ref()), "Error in scheduler loop");
                stop.wait(self.config.error_pause());
            }
        }
        debug!("Scheduler loop exiting");
    }
}

/// Run one check to completion, turning a panic into a [`CheckError`].
fn execute(runtime: &Runtime, checker: &dyn Checker) -> Result<u64, CheckError> {
    panic::catch_unwind(AssertUnwindSafe(|| runtime.block_on(checker.check())))
        .unwrap_or_else(|payload| Err(CheckError::Panicked(panic_message(payload.as_ref()))))
}

fn deadline(anchor: Instant, after: Duration) -> Instant {
    anchor
        .checked_add(after)
        .or_else(|| anchor.checked_add(FAR_FUTURE))
        .unwrap_or(anchor)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Join `thread`, giving up after `timeout`.
///
/// A loop that does not exit in time is detached and finishes on its own.
fn join_with_timeout(handle: JoinHandle<()>, timeout: Duration) {
    let (tx, rx) = crossbeam_channel::bounded(1);
    let joiner = thread::Builder::new()
        .name("nm-scheduler-join".into())
        .spawn(move || {
            let _ = tx.send(handle.join().is_ok());
        });
    if let Err(e) = joiner {
        warn!(error = %e, "Failed to spawn join helper, detaching scheduler loop");
        return;
    }

    match rx.recv_timeout(timeout) {
        Ok(true) => debug!("Scheduler loop joined"),
        Ok(false) => warn!("Scheduler loop panicked"),
        Err(_) => warn!(
            timeout_secs = timeout.as_secs(),
            "Scheduler loop did not exit within timeout - detaching"
        ),
    }
}

/// Scheduler for a dynamic set of checkers.
///
/// All methods take `&self` and may be called from any thread, including while
/// the loop is running. Checkers are matched by name for
/// [`remove_checker`](Self::remove_checker),
/// [`enable_checker`](Self::enable_checker) and
/// [`disable_checker`](Self::disable_checker); names are unique per scheduler.
pub struct Scheduler {
    shared: Arc<Shared>,
    control: Mutex<Option<LoopHandle>>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("running", &self.shared.running.load(Ordering::Acquire))
            .field("config", &self.shared.config)
            .finish_non_exhaustive()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Create a scheduler with the default timing configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::from_parts(SchedulerConfig::default())
    }

    /// Create a scheduler with a custom timing configuration.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidConfig` if the configuration is invalid.
    pub fn with_config(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        config.validate().map_err(SchedulerError::InvalidConfig)?;
        Ok(Self::from_parts(config))
    }

    fn from_parts(config: SchedulerConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                tasks: Mutex::new(Vec::new()),
                running: AtomicBool::new(false),
                config,
            }),
            control: Mutex::new(None),
        }
    }

    /// Register a checker, first due after `initial_delay`.
    ///
    /// A checker whose `enabled()` is false is not stored and yields
    /// [`Registration::Disabled`].
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::DuplicateChecker` if a checker with the same
    /// name is already registered.
    pub fn add_checker(
        &self,
        checker: Arc<dyn Checker>,
        initial_delay: Duration,
    ) -> Result<Registration, SchedulerError> {
        if !checker.enabled() {
            info!(checker = checker.name(), "Checker disabled");
            return Ok(Registration::Disabled);
        }

        let mut tasks = self.shared.tasks.lock();
        if tasks.iter().any(|task| task.checker.name() == checker.name()) {
            warn!(checker = checker.name(), "Checker already registered");
            return Err(SchedulerError::DuplicateChecker(checker.name().to_string()));
        }

        let task = ScheduledTask::new(checker, deadline(Instant::now(), initial_delay));
        let id = task.id;
        info!(
            checker = task.checker.name(),
            task_id = %id,
            first_run_in_secs = initial_delay.as_secs(),
            "Added checker"
        );
        tasks.push(task);
        Ok(Registration::Scheduled(id))
    }

    /// Remove the task whose checker is named `name`.
    ///
    /// An in-flight run of that checker completes, but its result is dropped.
    pub fn remove_checker(&self, name: &str) -> bool {
        self.remove_where(|task| task.checker.name() == name)
    }

    /// Remove a task by its identifier.
    pub fn remove_task(&self, id: TaskId) -> bool {
        self.remove_where(|task| task.id == id)
    }

    fn remove_where(&self, predicate: impl Fn(&ScheduledTask) -> bool) -> bool {
        let mut tasks = self.shared.tasks.lock();
        let Some(index) = tasks.iter().position(predicate) else {
            return false;
        };
        let task = tasks.remove(index);
        info!(checker = task.checker.name(), task_id = %task.id, "Removed checker");
        true
    }

    /// Include the named checker in scans again.
    ///
    /// Its due time is preserved, so it may run on the next scan.
    pub fn enable_checker(&self, name: &str) -> bool {
        self.set_enabled(name, true)
    }

    /// Exclude the named checker from scans without removing it.
    pub fn disable_checker(&self, name: &str) -> bool {
        self.set_enabled(name, false)
    }

    fn set_enabled(&self, name: &str, enabled: bool) -> bool {
        let mut tasks = self.shared.tasks.lock();
        let Some(task) = tasks.iter_mut().find(|task| task.checker.name() == name) else {
            return false;
        };
        task.enabled = enabled;
        debug!(checker = name, enabled, "Checker toggled");
        true
    }

    /// Start the control loop on a background thread.
    ///
    /// Calling `start` on a running scheduler is a no-op.
    ///
    /// # Errors
    ///
    /// - `SchedulerError::EmptyScheduler` if no checker is registered
    /// - `SchedulerError::Spawn` if the loop thread could not be created
    pub fn start(&self) -> Result<(), SchedulerError> {
        if self.shared.tasks.lock().is_empty() {
            return Err(SchedulerError::EmptyScheduler);
        }

        let mut control = self.control.lock();
        if self.shared.running.load(Ordering::Acquire) {
            info!("Scheduler is already running");
            return Ok(());
        }

        let stop = Arc::new(StopSignal::new());
        self.shared.running.store(true, Ordering::Release);

        let shared = Arc::clone(&self.shared);
        let loop_stop = Arc::clone(&stop);
        let thread = thread::Builder::new()
            .name("nm-scheduler".into())
            .spawn(move || shared.run_loop(&loop_stop))
            .map_err(|e| {
                self.shared.running.store(false, Ordering::Release);
                SchedulerError::Spawn(e.to_string())
            })?;

        *control = Some(LoopHandle { stop, thread });
        info!("Scheduler started");
        Ok(())
    }

    /// Stop the control loop and wait for it to exit.
    ///
    /// Waits at most `join_timeout`; a checker still running after that keeps
    /// its thread alive in the background. No-op when not running.
    pub fn stop(&self) {
        let handle = {
            let mut control = self.control.lock();
            if !self.shared.running.swap(false, Ordering::AcqRel) {
                return;
            }
            control.take()
        };
        let Some(LoopHandle { stop, thread: loop_thread }) = handle else {
            return;
        };

        stop.trigger();
        if loop_thread.thread().id() == thread::current().id() {
            debug!("Stop requested from the scheduler loop, not joining");
            return;
        }
        join_with_timeout(loop_thread, self.shared.config.join_timeout());
        info!("Scheduler stopped");
    }

    /// Whether the control loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Number of registered tasks.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.shared.tasks.lock().len()
    }

    /// Snapshot of the scheduler state.
    #[must_use]
    pub fn get_status(&self) -> StatusSnapshot {
        let tasks = self.shared.tasks.lock();
        StatusSnapshot {
            running: self.is_running(),
            task_count: tasks.len(),
            next_run: tasks.iter().map(|task| task.next_time).min(),
            tasks: tasks.iter().map(ScheduledTask::summary).collect(),
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        // Signal the loop but don't join; a long check would block the drop.
        self.shared.running.store(false, Ordering::Release);
        if let Some(handle) = self.control.get_mut().take() {
            handle.stop.trigger();
            debug!("Scheduler dropped - loop thread will be detached");
        }
    }
}
