//! Task definitions
//!
//! A task is moved into the pool on `start()` and consumed by `run()`.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// A unit of work owned by exactly one worker thread while it runs
pub trait Task: Send + 'static {
    /// Execute and consume the task
    fn run(self: Box<Self>);
}

impl<F> Task for F
where
    F: FnOnce() + Send + 'static,
{
    fn run(self: Box<Self>) {
        (*self)()
    }
}

/// Task completion states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TaskState {
    Pending = 0,
    Running = 1,
    Done = 2,
}

impl TaskState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => TaskState::Pending,
            1 => TaskState::Running,
            _ => TaskState::Done,
        }
    }
}

/// Observer for a submitted task's state
#[derive(Debug, Clone)]
pub struct TaskHandle {
    state: Arc<AtomicU8>,
}

impl TaskHandle {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(TaskState::Pending as u8)),
        }
    }

    pub(crate) fn set(&self, state: TaskState) {
        self.state.store(state as u8, Ordering::Release);
    }

    pub fn state(&self) -> TaskState {
        TaskState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_done(&self) -> bool {
        self.state() == TaskState::Done
    }
}
