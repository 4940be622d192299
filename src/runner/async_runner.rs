use crate::{
    config::Config,
    errors::{Error, Result},
    model::{Mode, RunReport, TaskId, WorkerReport},
    observer::{Observer, Silent},
    queue::AsyncTaskQueue,
    timing::timed_async,
    worker::Worker,
};
use futures::future::join_all;
use std::sync::Arc;
use tokio::task::{JoinError, JoinHandle, LocalSet};
use tracing::{info, warn};

/// Drains a queue with cooperative workers that all share the calling thread.
///
/// Workers are spawned on a [`LocalSet`], so they stay on one thread whatever
/// runtime flavor `run` is awaited on.
pub struct AsyncRunner {
    config: Config,
    observer: Arc<dyn Observer>,
}

impl AsyncRunner {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            observer: Arc::new(Silent),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    pub async fn run(&self, num_tasks: i64) -> Result<RunReport> {
        let count = super::task_count(num_tasks)?;
        self.config.validate()?;

        let queue = Arc::new(AsyncTaskQueue::new());
        info!(
            mode = %Mode::Cooperative,
            tasks = count,
            workers = self.config.async_workers,
            "starting run"
        );

        let local = LocalSet::new();
        let (workers, elapsed) =
            timed_async(local.run_until(self.drive(queue.clone(), count))).await;
        let workers = workers?;

        info!(mode = %Mode::Cooperative, elapsed = ?elapsed, "run finished");
        Ok(RunReport {
            mode: Mode::Cooperative,
            workers,
            elapsed,
            queue: queue.metrics(),
        })
    }

    async fn drive(
        &self,
        queue: Arc<AsyncTaskQueue<TaskId>>,
        count: usize,
    ) -> Result<Vec<WorkerReport>> {
        // Everything is visible before the first worker starts.
        for id in 0..count {
            queue.enqueue(id as TaskId);
        }

        let handles: Vec<JoinHandle<Result<WorkerReport>>> = (0..self.config.async_workers)
            .map(|i| {
                let worker = Worker::new(
                    format!("Worker {i}"),
                    self.config.task_delay,
                    self.observer.clone(),
                );
                let queue = queue.clone();
                tokio::task::spawn_local(async move { worker.run_cooperative(&queue).await })
            })
            .collect();

        if let Err(err) = self.drain(&queue).await {
            for handle in &handles {
                handle.abort();
            }
            // Aborted tasks still have to be awaited before returning.
            let _ = join_all(handles).await;
            return Err(err);
        }

        if queue.is_abandoned() {
            let dropped = queue.clear_pending();
            warn!(dropped, "worker failed, discarding queued tasks");
        }

        // Only after the drain: one stop marker per worker.
        for _ in 0..handles.len() {
            queue.push_sentinel();
        }

        join_all(handles)
            .await
            .into_iter()
            .map(|res| res.unwrap_or_else(|e| Err(join_error(e))))
            .collect()
    }

    async fn drain(&self, queue: &AsyncTaskQueue<TaskId>) -> Result<()> {
        match self.config.drain_timeout {
            Some(timeout) => {
                if queue.join_timeout(timeout).await {
                    Ok(())
                } else {
                    warn!(outstanding = queue.outstanding(), "drain timed out");
                    Err(Error::Timeout)
                }
            }
            None => {
                queue.join().await;
                Ok(())
            }
        }
    }
}

fn join_error(err: JoinError) -> Error {
    if err.is_panic() {
        Error::from_panic(err.into_panic())
    } else {
        Error::JoinFailed(err.to_string())
    }
}
