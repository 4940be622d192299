use crate::{
    errors::{Error, Result},
    model::{Message, QueueMetrics},
};
use parking_lot::{Condvar, Mutex};
use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

struct Inner<T> {
    items: VecDeque<Message<T>>,
    enqueued: usize,
    acknowledged: usize,
    discarded: usize,
    abandoned: bool,
}

impl<T> Inner<T> {
    #[inline(always)]
    fn outstanding(&self) -> usize {
        self.enqueued - self.acknowledged - self.discarded
    }

    #[inline(always)]
    fn settled(&self) -> bool {
        self.abandoned || self.outstanding() == 0
    }
}

/// Unbounded FIFO shared between one producer and any number of worker threads.
pub struct TaskQueue<T> {
    inner: Mutex<Inner<T>>,
    available: Condvar,
    drained: Condvar,
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TaskQueue<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                items: VecDeque::new(),
                enqueued: 0,
                acknowledged: 0,
                discarded: 0,
                abandoned: false,
            }),
            available: Condvar::new(),
            drained: Condvar::new(),
        }
    }

    pub fn enqueue(&self, item: T) {
        let mut inner = self.inner.lock();
        inner.enqueued += 1;
        inner.items.push_back(Message::Task(item));
        drop(inner);
        self.available.notify_one();
    }

    /// Pushes one stop marker. It is not counted as outstanding work.
    pub fn push_sentinel(&self) {
        self.inner.lock().items.push_back(Message::Stop);
        self.available.notify_one();
    }

    /// Takes the head of the queue, parking the calling thread while it is empty.
    pub fn dequeue(&self) -> Message<T> {
        let mut inner = self.inner.lock();
        loop {
            if let Some(msg) = inner.items.pop_front() {
                return msg;
            }
            self.available.wait(&mut inner);
        }
    }

    pub fn dequeue_timeout(&self, timeout: Duration) -> Option<Message<T>> {
        let deadline = Instant::now() + timeout;
        let mut inner = self.inner.lock();
        loop {
            if let Some(msg) = inner.items.pop_front() {
                return Some(msg);
            }
            if self.available.wait_until(&mut inner, deadline).timed_out() {
                return inner.items.pop_front();
            }
        }
    }

    pub fn try_dequeue(&self) -> Option<Message<T>> {
        self.inner.lock().items.pop_front()
    }

    /// Marks one dequeued task as finished. Wakes every `join` caller once
    /// nothing is outstanding.
    pub fn acknowledge(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.outstanding() == 0 {
            return Err(Error::AckWithoutTask);
        }
        inner.acknowledged += 1;
        if inner.outstanding() == 0 {
            tracing::trace!(acknowledged = inner.acknowledged, "queue drained");
            self.drained.notify_all();
        }
        Ok(())
    }

    /// Blocks until every enqueued task has been acknowledged, or until a
    /// worker abandons the queue.
    pub fn join(&self) {
        let mut inner = self.inner.lock();
        while !inner.settled() {
            self.drained.wait(&mut inner);
        }
    }

    /// Returns `false` if the deadline passed with work still outstanding.
    pub fn join_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut inner = self.inner.lock();
        while !inner.settled() {
            if self.drained.wait_until(&mut inner, deadline).timed_out() {
                return inner.settled();
            }
        }
        true
    }

    /// Called by a worker that stops without acknowledging its task. Releases
    /// every `join` caller, since the outstanding count can no longer reach zero.
    pub fn abandon(&self) {
        let mut inner = self.inner.lock();
        inner.abandoned = true;
        tracing::trace!(outstanding = inner.outstanding(), "queue abandoned");
        drop(inner);
        self.drained.notify_all();
    }

    pub fn is_abandoned(&self) -> bool {
        self.inner.lock().abandoned
    }

    /// Drops every task still waiting to be dequeued and returns how many were
    /// dropped. Stop markers stay in place. Tasks already handed to a worker
    /// are unaffected.
    pub fn clear_pending(&self) -> usize {
        let mut inner = self.inner.lock();
        let before = inner.items.len();
        inner.items.retain(Message::is_stop);
        let dropped = before - inner.items.len();
        inner.discarded += dropped;
        let settled = inner.settled();
        drop(inner);
        if settled {
            self.drained.notify_all();
        }
        dropped
    }

    pub fn outstanding(&self) -> usize {
        self.inner.lock().outstanding()
    }

    /// Entries waiting to be dequeued, sentinels included.
    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn metrics(&self) -> QueueMetrics {
        let inner = self.inner.lock();
        QueueMetrics {
            pending: inner.items.len(),
            enqueued: inner.enqueued,
            acknowledged: inner.acknowledged,
            discarded: inner.discarded,
            outstanding: inner.outstanding(),
        }
    }
}
