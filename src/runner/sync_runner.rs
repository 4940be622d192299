use crate::{
    config::Config,
    errors::{Error, Result},
    model::{Mode, RunReport, TaskId, WorkerReport},
    observer::{Observer, Silent},
    queue::TaskQueue,
    timing::timed,
    worker::Worker,
};
use std::{sync::Arc, thread};
use tracing::{info, warn};

/// Pushes one sentinel per started worker when dropped, so a runner that
/// leaves early still lets every thread exit.
struct ShutdownGuard<'q> {
    queue: &'q TaskQueue<TaskId>,
    workers: usize,
}

impl<'q> ShutdownGuard<'q> {
    fn new(queue: &'q TaskQueue<TaskId>) -> Self {
        Self { queue, workers: 0 }
    }

    fn started(&mut self) {
        self.workers += 1;
    }

    fn release(mut self) {
        self.push_all();
    }

    fn push_all(&mut self) {
        for _ in 0..self.workers {
            self.queue.push_sentinel();
        }
        self.workers = 0;
    }
}

impl Drop for ShutdownGuard<'_> {
    fn drop(&mut self) {
        self.push_all();
    }
}

/// Drains a queue with dedicated OS threads.
pub struct SyncRunner {
    config: Config,
    observer: Arc<dyn Observer>,
}

impl SyncRunner {
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

    pub fn run(&self, num_tasks: i64) -> Result<RunReport> {
        let count = super::task_count(num_tasks)?;
        self.config.validate()?;

        let queue = TaskQueue::new();
        info!(
            mode = %Mode::Blocking,
            tasks = count,
            workers = self.config.sync_workers,
            "starting run"
        );

        let (workers, elapsed) = timed(|| self.drive(&queue, count));
        let workers = workers?;

        info!(mode = %Mode::Blocking, elapsed = ?elapsed, "run finished");
        Ok(RunReport {
            mode: Mode::Blocking,
            workers,
            elapsed,
            queue: queue.metrics(),
        })
    }

    fn drive(&self, queue: &TaskQueue<TaskId>, count: usize) -> Result<Vec<WorkerReport>> {
        // Scoped threads are always joined before `scope` returns, on every path.
        thread::scope(|scope| -> Result<Vec<WorkerReport>> {
            let mut shutdown = ShutdownGuard::new(queue);
            let mut handles = Vec::with_capacity(self.config.sync_workers);

            for i in 0..self.config.sync_workers {
                let worker = Worker::new(
                    format!("Thread {i}"),
                    self.config.task_delay,
                    self.observer.clone(),
                );
                let handle = thread::Builder::new()
                    .name(worker.label().to_string())
                    .spawn_scoped(scope, move || worker.run_blocking(queue))?;
                shutdown.started();
                handles.push(handle);
            }

            for id in 0..count {
                queue.enqueue(id as TaskId);
            }

            let drained = self.drain(queue);
            if drained.is_err() || queue.is_abandoned() {
                // Threads cannot be interrupted mid-task; stop them from
                // picking up anything new instead.
                let dropped = queue.clear_pending();
                warn!(dropped, "discarding queued tasks");
            }

            // Only after the drain: one stop marker per thread.
            shutdown.release();

            let reports: Result<Vec<WorkerReport>> = handles
                .into_iter()
                .map(|h| match h.join() {
                    Ok(report) => report,
                    Err(payload) => Err(Error::from_panic(payload)),
                })
                .collect();

            drained?;
            reports
        })
    }

    fn drain(&self, queue: &TaskQueue<TaskId>) -> Result<()> {
        match self.config.drain_timeout {
            Some(timeout) => {
                if queue.join_timeout(timeout) {
                    Ok(())
                } else {
                    warn!(outstanding = queue.outstanding(), "drain timed out");
                    Err(Error::Timeout)
                }
            }
            None => {
                queue.join();
                Ok(())
            }
        }
    }
}
