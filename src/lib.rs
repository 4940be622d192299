//! Bounded batches of tasks drained through a completion-tracking work queue,
//! under two execution models.
//!
//! # Features
//! - Blocking model: dedicated OS threads, each parked for the whole task
//! - Cooperative model: several workers interleaved on a single thread
//! - `enqueue` / `dequeue` / `acknowledge` / `join` queue protocol
//! - Sentinel-based shutdown with guaranteed thread and task cleanup
//! - Optional drain deadlines and cancellable dequeues

pub mod config;
pub mod console;
pub mod errors;
pub mod model;
pub mod observer;
pub mod queue;
pub mod runner;
pub mod timing;
pub mod worker;

pub use config::Config;
pub use errors::{Error, Result};
pub use model::{Message, Mode, QueueMetrics, RunReport, TaskId, WorkerReport};
pub use queue::{AsyncTaskQueue, TaskQueue};
pub use runner::{run_blocking, run_cooperative, AsyncRunner, SyncRunner};
