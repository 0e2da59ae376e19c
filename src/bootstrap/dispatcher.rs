//! Self-expiring replay dispatcher
//!
//! Runs replay work on a single background worker so that callers still
//! inside startup code never replay on their own stack. The worker is
//! created on demand, exits after [`DEFAULT_IDLE_TIMEOUT`] without work,
//! and is recreated transparently by the next submission.
//!
//! The dispatcher only holds the worker's channel while the worker is
//! live. A worker decides to exit under the dispatcher lock and only when
//! no submitted task is pending or running, so a submission can never be
//! stranded on a dying worker.
//!
//! **Per-task failure isolation**: every task runs inside `catch_unwind`.
//! A task that fails or panics is reported and counted; the worker keeps
//! running the tasks queued after it.

use crate::core::{BootstrapError, BootstrapMetrics, Result};
use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::cell::Cell;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Idle time after which the replay worker exits (30 seconds)
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

const WORKER_NAME_PREFIX: &str = "bootstrap-replay";

pub type Task = Box<dyn FnOnce() -> Result<()> + Send + 'static>;

thread_local! {
    static ON_WORKER: Cell<bool> = const { Cell::new(false) };
}

/// Returns true on a dispatcher worker thread
pub fn on_worker_thread() -> bool {
    ON_WORKER.with(|flag| flag.get())
}

/// Pending result of a tracked task
#[must_use]
pub struct Completion {
    receiver: Receiver<Result<()>>,
}

impl Completion {
    /// Block until the task has run
    pub fn wait(self) -> Result<()> {
        match self.receiver.recv() {
            Ok(result) => result,
            // Sender dropped without a result: the task panicked
            Err(_) => Err(BootstrapError::task("task panicked on the replay worker")),
        }
    }
}

struct LiveWorker {
    generation: u64,
    sender: Sender<Task>,
}

struct DispatcherShared {
    worker: Mutex<Option<LiveWorker>>,
    /// Submitted tasks not yet completed (queued or running)
    in_flight: AtomicUsize,
    generation: AtomicU64,
    idle_timeout: Duration,
    metrics: Arc<BootstrapMetrics>,
}

pub struct SelfExpiringDispatcher {
    shared: Arc<DispatcherShared>,
}

impl SelfExpiringDispatcher {
    pub fn new(metrics: Arc<BootstrapMetrics>) -> Self {
        Self::with_idle_timeout(DEFAULT_IDLE_TIMEOUT, metrics)
    }

    pub fn with_idle_timeout(idle_timeout: Duration, metrics: Arc<BootstrapMetrics>) -> Self {
        Self {
            shared: Arc::new(DispatcherShared {
                worker: Mutex::new(None),
                in_flight: AtomicUsize::new(0),
                generation: AtomicU64::new(0),
                idle_timeout,
                metrics,
            }),
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        self.shared.idle_timeout
    }

    /// Returns true while a worker thread is live
    pub fn has_worker(&self) -> bool {
        self.shared.worker.lock().is_some()
    }

    /// Number of tasks submitted and not yet completed
    pub fn pending(&self) -> usize {
        self.shared.in_flight.load(Ordering::Acquire)
    }

    /// Queue `task` on the worker, starting one if none is live
    pub fn submit<F>(&self, task: F) -> Result<()>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        let mut worker = self.shared.worker.lock();
        if worker.is_none() {
            *worker = Some(Self::spawn_worker(&self.shared)?);
        }

        self.shared.in_flight.fetch_add(1, Ordering::AcqRel);
        let live = worker
            .as_ref()
            .ok_or_else(|| BootstrapError::DispatcherUnavailable("no live worker".to_string()))?;
        if live.sender.send(Box::new(task)).is_err() {
            // Receiver gone without clearing the slot: the worker thread died
            self.shared.in_flight.fetch_sub(1, Ordering::AcqRel);
            *worker = None;
            return Err(BootstrapError::DispatcherUnavailable(
                "replay worker terminated unexpectedly".to_string(),
            ));
        }
        Ok(())
    }

    /// Queue `task` and return a handle to wait for its result
    pub fn submit_tracked<F>(&self, task: F) -> Result<Completion>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        let (done_tx, done_rx) = bounded::<Result<()>>(1);
        self.submit(move || {
            let result = task();
            let report = match &result {
                Ok(()) => Ok(()),
                Err(e) => Err(BootstrapError::task(e.to_string())),
            };
            let _ = done_tx.send(report);
            result
        })?;
        Ok(Completion { receiver: done_rx })
    }

    /// Run `task` on the worker and wait for its result
    ///
    /// On the worker thread itself the task runs inline, since waiting
    /// there would never complete.
    pub fn submit_and_wait<F>(&self, task: F) -> Result<()>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        if on_worker_thread() {
            return task();
        }
        self.submit_tracked(task)?.wait()
    }

    /// Wait until everything submitted before this call has run
    ///
    /// The worker is single threaded and FIFO, so waiting for a no-op
    /// submitted now waits for every earlier task.
    pub fn await_idle(&self) -> Result<()> {
        self.submit_and_wait(|| Ok(()))
    }

    fn spawn_worker(shared: &Arc<DispatcherShared>) -> Result<LiveWorker> {
        let (sender, receiver) = unbounded::<Task>();
        let generation = shared.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let worker_shared = Arc::clone(shared);

        thread::Builder::new()
            .name(format!("{}-{}", WORKER_NAME_PREFIX, generation))
            .spawn(move || {
                ON_WORKER.with(|flag| flag.set(true));
                loop {
                    match receiver.recv_timeout(worker_shared.idle_timeout) {
                        Ok(task) => {
                            Self::run_task(&worker_shared.metrics, task);
                            worker_shared.in_flight.fetch_sub(1, Ordering::AcqRel);
                        }
                        Err(RecvTimeoutError::Timeout) => {
                            let mut slot = worker_shared.worker.lock();
                            if worker_shared.in_flight.load(Ordering::Acquire) == 0 {
                                if slot.as_ref().map(|w| w.generation) == Some(generation) {
                                    *slot = None;
                                }
                                break;
                            }
                        }
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })
            .map_err(|e| BootstrapError::DispatcherUnavailable(e.to_string()))?;

        shared.metrics.record_worker_spawned();
        Ok(LiveWorker { generation, sender })
    }

    fn run_task(metrics: &BootstrapMetrics, task: Task) {
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(task));

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                metrics.record_task_failure();
                eprintln!("[BOOTSTRAP ERROR] Deferred task failed: {}", e);
            }
            Err(panic_info) => {
                metrics.record_task_failure();
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                eprintln!(
                    "[BOOTSTRAP CRITICAL] Deferred task panicked: {}. \
                     The replay worker continues with the next task.",
                    panic_msg
                );
            }
        }
    }
}

impl Drop for SelfExpiringDispatcher {
    fn drop(&mut self) {
        // Dropping the sender lets the worker finish queued tasks and exit
        self.shared.worker.lock().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    fn dispatcher(idle: Duration) -> (SelfExpiringDispatcher, Arc<BootstrapMetrics>) {
        let metrics = Arc::new(BootstrapMetrics::new());
        (
            SelfExpiringDispatcher::with_idle_timeout(idle, Arc::clone(&metrics)),
            metrics,
        )
    }

    #[test]
    fn test_tasks_run_in_submission_order() {
        let (dispatcher, _) = dispatcher(DEFAULT_IDLE_TIMEOUT);
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..20 {
            let order = Arc::clone(&order);
            dispatcher
                .submit(move || {
                    order.lock().push(i);
                    Ok(())
                })
                .unwrap();
        }
        dispatcher.await_idle().unwrap();

        assert_eq!(*order.lock(), (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_failure_isolation() {
        let (dispatcher, metrics) = dispatcher(DEFAULT_IDLE_TIMEOUT);
        let ran = Arc::new(AtomicBool::new(false));

        dispatcher
            .submit(|| Err(BootstrapError::other("replay failed")))
            .unwrap();
        dispatcher.submit(|| panic!("replay panicked")).unwrap();
        let ran_clone = Arc::clone(&ran);
        dispatcher
            .submit(move || {
                ran_clone.store(true, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();
        dispatcher.await_idle().unwrap();

        assert!(ran.load(Ordering::SeqCst));
        assert_eq!(metrics.task_failures(), 2);
        assert_eq!(metrics.workers_spawned(), 1);
    }

    #[test]
    fn test_submit_and_wait_reports_task_error() {
        let (dispatcher, _) = dispatcher(DEFAULT_IDLE_TIMEOUT);
        let result = dispatcher.submit_and_wait(|| Err(BootstrapError::other("nope")));
        assert!(matches!(result, Err(BootstrapError::TaskFailed(_))));

        let result = dispatcher.submit_and_wait(|| panic!("boom"));
        assert!(matches!(result, Err(BootstrapError::TaskFailed(_))));

        // Worker survived both
        assert!(dispatcher.await_idle().is_ok());
    }

    #[test]
    fn test_worker_expires_and_is_recreated() {
        let (dispatcher, metrics) = dispatcher(Duration::from_millis(50));

        dispatcher.await_idle().unwrap();
        assert!(dispatcher.has_worker());

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while dispatcher.has_worker() && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert!(!dispatcher.has_worker(), "idle worker should have exited");

        dispatcher.await_idle().unwrap();
        assert_eq!(metrics.workers_spawned(), 2);
    }

    #[test]
    fn test_tracked_completion() {
        let (dispatcher, _) = dispatcher(DEFAULT_IDLE_TIMEOUT);
        let ran = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&ran);
        let completion = dispatcher
            .submit_tracked(move || {
                thread::sleep(Duration::from_millis(20));
                flag.store(true, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();
        assert!(completion.wait().is_ok());
        assert!(ran.load(Ordering::SeqCst));

        let failed = dispatcher
            .submit_tracked(|| Err(BootstrapError::other("late failure")))
            .unwrap();
        match failed.wait() {
            Err(BootstrapError::TaskFailed(msg)) => assert!(msg.contains("late failure")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_wait_on_worker_runs_inline() {
        let (dispatcher, _) = dispatcher(DEFAULT_IDLE_TIMEOUT);
        let dispatcher = Arc::new(dispatcher);
        let inner = Arc::clone(&dispatcher);

        let result = dispatcher.submit_and_wait(move || {
            assert!(on_worker_thread());
            inner.await_idle()
        });
        assert!(result.is_ok());
    }
}
