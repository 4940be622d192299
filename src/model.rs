use std::{collections::BTreeSet, fmt, time::Duration};

/// Identifier of one unit of work.
pub type TaskId = u64;

/// Entry stored in a task queue.
///
/// `Stop` is the sentinel: it tells exactly one worker to leave its loop. It is
/// never counted as outstanding work and never acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message<T> {
    Task(T),
    Stop,
}

impl<T> Message<T> {
    #[inline]
    pub fn is_stop(&self) -> bool {
        matches!(self, Message::Stop)
    }

    #[inline]
    pub fn into_task(self) -> Option<T> {
        match self {
            Message::Task(t) => Some(t),
            Message::Stop => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Dedicated OS threads, each blocking for the whole task.
    Blocking,
    /// Cooperative tasks interleaved on a single thread.
    Cooperative,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Blocking => f.write_str("blocking"),
            Mode::Cooperative => f.write_str("cooperative"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueMetrics {
    pub pending: usize,
    pub enqueued: usize,
    pub acknowledged: usize,
    /// Tasks dropped from the queue without being processed.
    pub discarded: usize,
    pub outstanding: usize,
}

impl QueueMetrics {
    pub fn is_drained(&self) -> bool {
        self.outstanding == 0
    }
}

#[derive(Debug, Clone)]
pub struct WorkerReport {
    pub label: String,
    /// Task ids in the order this worker processed them.
    pub processed: Vec<TaskId>,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub mode: Mode,
    pub workers: Vec<WorkerReport>,
    pub elapsed: Duration,
    pub queue: QueueMetrics,
}

impl RunReport {
    pub fn total_processed(&self) -> usize {
        self.workers.iter().map(|w| w.processed.len()).sum()
    }

    /// All processed ids, sorted.
    pub fn processed_ids(&self) -> Vec<TaskId> {
        let mut ids: Vec<_> = self
            .workers
            .iter()
            .flat_map(|w| w.processed.iter().copied())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// True when the workers' processed sets are pairwise disjoint and their
    /// union is exactly `0..n`.
    pub fn is_partition_of(&self, n: usize) -> bool {
        let mut seen = BTreeSet::new();
        for id in self.workers.iter().flat_map(|w| w.processed.iter()) {
            if !seen.insert(*id) {
                return false;
            }
        }
        seen.len() == n && seen.iter().copied().eq(0..n as TaskId)
    }
}
