use super::model::{TaskId, WorkerReport};
use parking_lot::Mutex;

/// Hooks called by workers as they move through their loop.
///
/// Every method defaults to a no-op.
pub trait Observer: Send + Sync {
    fn task_started(&self, _worker: &str, _task: TaskId) {}

    fn task_completed(&self, _worker: &str, _task: TaskId) {}

    fn worker_finished(&self, _report: &WorkerReport) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Observer for Silent {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Started { worker: String, task: TaskId },
    Completed { worker: String, task: TaskId },
    Finished { worker: String, processed: usize },
}

/// Keeps every event in arrival order.
#[derive(Debug, Default)]
pub struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Ids of completed tasks in completion order.
    pub fn completed(&self) -> Vec<TaskId> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                Event::Completed { task, .. } => Some(*task),
                _ => None,
            })
            .collect()
    }
}

impl Observer for Recorder {
    fn task_started(&self, worker: &str, task: TaskId) {
        self.events.lock().push(Event::Started {
            worker: worker.to_string(),
            task,
        });
    }

    fn task_completed(&self, worker: &str, task: TaskId) {
        self.events.lock().push(Event::Completed {
            worker: worker.to_string(),
            task,
        });
    }

    fn worker_finished(&self, report: &WorkerReport) {
        self.events.lock().push(Event::Finished {
            worker: report.label.clone(),
            processed: report.processed.len(),
        });
    }
}
