//! Execution collaborators for per-chunk kernel tasks.
//!
//! The driver submits one task per chunk through [`Executor::run`] and
//! then joins every [`TaskHandle`] before committing the step. Results
//! travel back over a bounded(1) crossbeam reply channel; a task that
//! panics drops its reply sender without sending, which the handle
//! reports as [`TaskLost`].

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};

use crate::config::{ConfigError, ExecutorConfig};

/// A task never delivered its result.
///
/// Either it panicked or the executor shut down before running it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaskLost;

impl fmt::Display for TaskLost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("task produced no result")
    }
}

impl std::error::Error for TaskLost {}

/// Pending result of a submitted task.
#[derive(Debug)]
pub struct TaskHandle<T> {
    reply: Receiver<T>,
}

impl<T> TaskHandle<T> {
    /// Block until the task's result arrives.
    pub fn join(self) -> Result<T, TaskLost> {
        self.reply.recv().map_err(|_| TaskLost)
    }
}

/// Runs independent tasks and hands back their results.
///
/// Implementations may run tasks in any order and on any thread. The
/// driver never relies on ordering between tasks of the same step.
pub trait Executor: Send + Sync {
    /// Submit `task` and return a handle to its result.
    fn run<F, T>(&self, task: F) -> TaskHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static;
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

/// Run `task`, sending its result on `reply`. A panic is logged and
/// swallowed here; the dropped sender signals the loss to the handle.
fn execute<F, T>(task: F, reply: Sender<T>)
where
    F: FnOnce() -> T,
{
    match panic::catch_unwind(AssertUnwindSafe(task)) {
        Ok(value) => {
            let _ = reply.send(value);
        }
        Err(payload) => {
            tracing::error!(panic = panic_message(&*payload), "chunk task panicked");
        }
    }
}

// ── InlineExecutor ─────────────────────────────────────────────────

/// Runs each task to completion on the caller's thread inside `run`.
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn run<F, T>(&self, task: F) -> TaskHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = crossbeam_channel::bounded(1);
        execute(task, tx);
        TaskHandle { reply: rx }
    }
}

// ── ThreadPoolExecutor ─────────────────────────────────────────────

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A fixed set of worker threads fed by an unbounded crossbeam channel.
///
/// Dropping the pool closes the channel and joins every worker after
/// the queued tasks have run.
pub struct ThreadPoolExecutor {
    jobs: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadPoolExecutor {
    /// Spawn `config.resolved_worker_count()` workers.
    pub fn new(config: &ExecutorConfig) -> Result<Self, ConfigError> {
        let count = config.resolved_worker_count();
        let (tx, rx) = crossbeam_channel::unbounded::<Job>();
        let mut workers = Vec::with_capacity(count);
        for index in 0..count {
            let rx = rx.clone();
            let handle = thread::Builder::new()
                .name(format!("tessel-worker-{index}"))
                .spawn(move || worker_loop(index, rx))
                .map_err(|e| ConfigError::ThreadSpawnFailed {
                    reason: format!("worker {index}: {e}"),
                })?;
            workers.push(handle);
        }
        tracing::debug!(workers = count, "thread pool started");
        Ok(Self {
            jobs: Some(tx),
            workers,
        })
    }

    /// A pool with exactly `n` workers (clamped to `[1, 64]`).
    pub fn with_workers(n: usize) -> Result<Self, ConfigError> {
        Self::new(&ExecutorConfig {
            worker_count: Some(n),
        })
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

/// Runs until the job channel is closed (pool dropped).
fn worker_loop(index: usize, jobs: Receiver<Job>) {
    while let Ok(job) = jobs.recv() {
        job();
    }
    tracing::trace!(worker = index, "worker exiting");
}

impl Executor for ThreadPoolExecutor {
    fn run<F, T>(&self, task: F) -> TaskHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = crossbeam_channel::bounded(1);
        if let Some(jobs) = &self.jobs {
            // A failed send drops the job and with it `tx`, so the
            // handle reports TaskLost.
            let _ = jobs.send(Box::new(move || execute(task, tx)));
        }
        TaskHandle { reply: rx }
    }
}

impl Drop for ThreadPoolExecutor {
    fn drop(&mut self) {
        self.jobs.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

impl fmt::Debug for ThreadPoolExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadPoolExecutor")
            .field("workers", &self.workers.len())
            .finish()
    }
}
