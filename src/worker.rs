use super::{
    errors::{Error, Result},
    model::{Message, TaskId, WorkerReport},
    observer::Observer,
    queue::{AsyncTaskQueue, TaskQueue},
};
use futures::FutureExt;
use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    time::Instant,
};
use tokio::time::Duration;
use tracing::{debug, error};

/// One consumer of a task queue.
///
/// Loops `dequeue -> simulated work -> acknowledge` until it takes a sentinel.
/// The sentinel itself is never acknowledged. A worker that panics or fails
/// abandons the queue on its way out, so the producer's `join` cannot hang on
/// the task it left unacknowledged.
pub struct Worker {
    label: String,
    delay: Duration,
    observer: Arc<dyn Observer>,
}

impl Worker {
    pub fn new(label: impl Into<String>, delay: Duration, observer: Arc<dyn Observer>) -> Self {
        Self {
            label: label.into(),
            delay,
            observer,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Thread body: the simulated work blocks the whole thread.
    pub fn run_blocking(&self, queue: &TaskQueue<TaskId>) -> Result<WorkerReport> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.consume_blocking(queue)));
        self.settle(outcome, || queue.abandon())
    }

    /// Task body: the simulated work is a suspension point, so sibling workers
    /// on the same thread keep running.
    pub async fn run_cooperative(&self, queue: &AsyncTaskQueue<TaskId>) -> Result<WorkerReport> {
        let outcome = AssertUnwindSafe(self.consume_cooperative(queue))
            .catch_unwind()
            .await;
        self.settle(outcome, || queue.abandon())
    }

    fn settle<F>(
        &self,
        outcome: std::thread::Result<Result<WorkerReport>>,
        abandon: F,
    ) -> Result<WorkerReport>
    where
        F: FnOnce(),
    {
        let err = match outcome {
            Ok(Ok(report)) => return Ok(report),
            Ok(Err(err)) => err,
            Err(payload) => Error::from_panic(payload),
        };
        error!(worker = %self.label, error = %err, "worker failed");
        abandon();
        Err(err)
    }

    fn consume_blocking(&self, queue: &TaskQueue<TaskId>) -> Result<WorkerReport> {
        let start = Instant::now();
        let mut processed = Vec::new();

        while let Message::Task(task) = queue.dequeue() {
            self.observer.task_started(&self.label, task);
            debug!(worker = %self.label, task, "processing");

            std::thread::sleep(self.delay);

            self.observer.task_completed(&self.label, task);
            debug!(worker = %self.label, task, "completed");
            processed.push(task);
            queue.acknowledge()?;
        }

        Ok(self.finish(processed, start))
    }

    async fn consume_cooperative(&self, queue: &AsyncTaskQueue<TaskId>) -> Result<WorkerReport> {
        let start = Instant::now();
        let mut processed = Vec::new();

        while let Message::Task(task) = queue.dequeue().await {
            self.observer.task_started(&self.label, task);
            debug!(worker = %self.label, task, "processing");

            tokio::time::sleep(self.delay).await;

            self.observer.task_completed(&self.label, task);
            debug!(worker = %self.label, task, "completed");
            processed.push(task);
            queue.acknowledge()?;
        }

        Ok(self.finish(processed, start))
    }

    fn finish(&self, processed: Vec<TaskId>, start: Instant) -> WorkerReport {
        let report = WorkerReport {
            label: self.label.clone(),
            processed,
            elapsed: start.elapsed(),
        };
        debug!(
            worker = %report.label,
            processed = report.processed.len(),
            elapsed = ?report.elapsed,
            "worker stopped"
        );
        self.observer.worker_finished(&report);
        report
    }
}
