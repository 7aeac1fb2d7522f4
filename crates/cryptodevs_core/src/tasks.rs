use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Running,
    Cancelled,
}

// ---------------------------------------------------------------------------
// PeriodicTask
// ---------------------------------------------------------------------------

/// A job re-run on a fixed period until cancelled.
///
/// The first run happens immediately. Each run is awaited before the next
/// tick is taken, so a slow run delays the schedule instead of overlapping
/// with itself. Dropping the handle cancels the task.
pub struct PeriodicTask {
    name: String,
    period: Duration,
    runs: Arc<AtomicU64>,
    status: Mutex<TaskStatus>,
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    /// Spawn `job` on the current tokio runtime.
    pub fn spawn<F, Fut>(name: impl Into<String>, period: Duration, mut job: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let runs = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&runs);
        let task_name = name.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                job().await;
                let n = counter.fetch_add(1, Ordering::Relaxed) + 1;
                debug!(task = %task_name, run = n, "periodic task ran");
            }
        });

        debug!(task = %name, period_ms = period.as_millis() as u64, "periodic task started");
        Self {
            name,
            period,
            runs,
            status: Mutex::new(TaskStatus::Running),
            handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Number of completed runs.
    pub fn run_count(&self) -> u64 {
        self.runs.load(Ordering::Relaxed)
    }

    pub fn status(&self) -> TaskStatus {
        *self.status.lock()
    }

    /// Stop the task. A run in progress is aborted at its next await point.
    pub fn cancel(&self) {
        let mut status = self.status.lock();
        if *status == TaskStatus::Running {
            self.handle.abort();
            *status = TaskStatus::Cancelled;
            debug!(task = %self.name, runs = self.run_count(), "periodic task cancelled");
        }
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ---------------------------------------------------------------------------
// TaskSet
// ---------------------------------------------------------------------------

/// The periodic tasks owned by one scope (a wallet session). Cancelling the
/// set, or dropping it, stops every task in it.
#[derive(Default)]
pub struct TaskSet {
    tasks: Vec<PeriodicTask>,
}

impl TaskSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, task: PeriodicTask) {
        self.tasks.push(task);
    }

    pub fn get(&self, name: &str) -> Option<&PeriodicTask> {
        self.tasks.iter().find(|t| t.name == name)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn running_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.status() == TaskStatus::Running)
            .count()
    }

    /// Cancel and remove every task.
    pub fn cancel_all(&mut self) {
        for task in self.tasks.drain(..) {
            task.cancel();
        }
    }
}
