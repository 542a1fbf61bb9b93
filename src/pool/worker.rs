//! Worker pool
//!
//! Executes tasks on at most `max_threads` threads at once.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::{Condvar, Mutex};

use crate::error::{GateError, Result};

use super::{Task, TaskHandle, TaskState};

/// A queued task plus the handle its submitter observes
struct Job {
    task: Box<dyn Task>,
    handle: TaskHandle,
}

/// State shared between the pool owner and its workers
#[derive(Default)]
struct PoolShared {
    /// Submitted but not yet finished (queued + running)
    outstanding: Mutex<usize>,

    /// Signalled when `outstanding` drops to zero
    all_done: Condvar,

    /// Currently executing
    running: AtomicUsize,

    /// Finished, including panicked
    completed: AtomicU64,

    /// Finished by panicking
    panicked: AtomicU64,
}

impl PoolShared {
    fn finish_one(&self) {
        let mut outstanding = self.outstanding.lock();
        *outstanding -= 1;
        if *outstanding == 0 {
            self.all_done.notify_all();
        }
    }
}

/// Bounded-concurrency executor for owned tasks
///
/// ## Concurrency:
/// - At most `max_threads` tasks run at the same time (one per worker)
/// - `start()` transfers ownership of the task; nothing else keeps a reference
/// - A panicking task is contained to its worker and counted as finished
pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    shared: Arc<PoolShared>,
    max_threads: usize,
}

impl WorkerPool {
    /// Create a pool with `max_threads` workers (at least one)
    pub fn new(max_threads: usize) -> Result<Self> {
        if max_threads == 0 {
            return Err(GateError::Config(
                "worker pool needs at least one thread".to_string(),
            ));
        }

        let (sender, receiver) = channel::unbounded::<Job>();
        let shared = Arc::new(PoolShared::default());

        let mut workers = Vec::with_capacity(max_threads);
        for id in 0..max_threads {
            let receiver = receiver.clone();
            let shared = Arc::clone(&shared);
            let worker = thread::Builder::new()
                .name(format!("rpcgate-worker-{}", id))
                .spawn(move || worker_loop(receiver, shared))?;
            workers.push(worker);
        }

        tracing::debug!(max_threads, "worker pool started");

        Ok(Self {
            sender: Some(sender),
            workers,
            shared,
            max_threads,
        })
    }

    /// Submit a task; it runs as soon as a worker is free
    pub fn start<T: Task>(&self, task: T) -> Result<TaskHandle> {
        self.start_boxed(Box::new(task))
    }

    /// Submit an already boxed task
    pub fn start_boxed(&self, task: Box<dyn Task>) -> Result<TaskHandle> {
        let sender = self.sender.as_ref().ok_or(GateError::PoolClosed)?;
        let handle = TaskHandle::new();

        *self.shared.outstanding.lock() += 1;
        let job = Job {
            task,
            handle: handle.clone(),
        };
        if sender.send(job).is_err() {
            self.shared.finish_one();
            return Err(GateError::PoolClosed);
        }
        Ok(handle)
    }

    /// Block until every submitted task has finished
    pub fn wait_for_done(&self) {
        let mut outstanding = self.shared.outstanding.lock();
        while *outstanding > 0 {
            self.shared.all_done.wait(&mut outstanding);
        }
    }

    /// Maximum number of concurrently running tasks
    pub fn max_threads(&self) -> usize {
        self.max_threads
    }

    /// Tasks currently executing
    pub fn active_count(&self) -> usize {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Tasks submitted and not yet finished
    pub fn outstanding(&self) -> usize {
        *self.shared.outstanding.lock()
    }

    /// Tasks finished since the pool started
    pub fn completed(&self) -> u64 {
        self.shared.completed.load(Ordering::Relaxed)
    }

    /// Tasks that panicked
    pub fn panicked(&self) -> u64 {
        self.shared.panicked.load(Ordering::Relaxed)
    }
}

impl Drop for WorkerPool {
    /// Close the queue and join the workers; queued tasks still run
    fn drop(&mut self) {
        drop(self.sender.take());
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                tracing::error!("worker thread terminated abnormally");
            }
        }
        tracing::debug!("worker pool stopped");
    }
}

fn worker_loop(receiver: Receiver<Job>, shared: Arc<PoolShared>) {
    for job in receiver.iter() {
        let Job { task, handle } = job;

        handle.set(TaskState::Running);
        shared.running.fetch_add(1, Ordering::AcqRel);

        let outcome = panic::catch_unwind(AssertUnwindSafe(move || task.run()));

        shared.running.fetch_sub(1, Ordering::AcqRel);
        shared.completed.fetch_add(1, Ordering::Relaxed);
        if outcome.is_err() {
            shared.panicked.fetch_add(1, Ordering::Relaxed);
            tracing::error!("worker task panicked");
        }
        handle.set(TaskState::Done);
        shared.finish_one();
    }
}
