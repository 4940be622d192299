//! The two scheduling strategies that drain a task queue.

mod async_runner;
mod sync_runner;

pub use async_runner::AsyncRunner;
pub use sync_runner::SyncRunner;

use crate::{
    config::Config,
    errors::{Error, Result},
    model::RunReport,
    observer::Observer,
};
use std::sync::Arc;

/// Validates a caller-supplied task count.
pub fn task_count(num_tasks: i64) -> Result<usize> {
    usize::try_from(num_tasks).map_err(|_| Error::InvalidTaskCount(num_tasks))
}

/// Runs `num_tasks` tasks on dedicated threads and waits for all of them.
pub fn run_blocking(
    num_tasks: i64,
    config: &Config,
    observer: Arc<dyn Observer>,
) -> Result<RunReport> {
    SyncRunner::new(config.clone())
        .with_observer(observer)
        .run(num_tasks)
}

/// Runs `num_tasks` tasks on cooperative workers sharing one thread.
///
/// Builds its own current-thread runtime, so it must not be called from
/// inside another runtime.
pub fn run_cooperative(
    num_tasks: i64,
    config: &Config,
    observer: Arc<dyn Observer>,
) -> Result<RunReport> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    rt.block_on(
        AsyncRunner::new(config.clone())
            .with_observer(observer)
            .run(num_tasks),
    )
}
