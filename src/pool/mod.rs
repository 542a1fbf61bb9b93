//! Pool Module
//!
//! Bounded worker pool executing owned tasks.
//!
//! ## Architecture
//! - Fixed set of named worker threads (the configured maximum)
//! - Unbounded crossbeam queue: `start()` never blocks, excess tasks wait
//! - Outstanding-task counter behind a mutex/condvar for `wait_for_done()`

mod task;
mod worker;

pub use task::{Task, TaskHandle, TaskState};
pub use worker::WorkerPool;
