//! Work queues with completion tracking.
//!
//! Both queues follow the same protocol: the producer enqueues tasks, every
//! consumer acknowledges each task it dequeued once it is done with it, and
//! `join` waits until the number of acknowledged tasks catches up with the
//! number enqueued. Sentinels (`Message::Stop`) bypass the accounting.
//!
//! [`TaskQueue`] is for OS threads and parks the caller; [`AsyncTaskQueue`]
//! suspends only the calling task.

mod blocking;
mod cooperative;

pub use blocking::TaskQueue;
pub use cooperative::AsyncTaskQueue;
