use crate::{
    errors::{Error, Result},
    model::{Message, QueueMetrics},
};
use crossbeam::deque::{Injector, Steal};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::{sync::Notify, time::Duration};
use tokio_util::sync::CancellationToken;

/// Unbounded FIFO for cooperative workers.
///
/// Waiting never blocks the thread: `dequeue` and `join` are suspension
/// points that let sibling tasks run.
pub struct AsyncTaskQueue<T> {
    inject: Injector<Message<T>>,
    available: Notify,
    drained: Notify,
    pending: AtomicUsize,
    enqueued: AtomicUsize,
    acknowledged: AtomicUsize,
    discarded: AtomicUsize,
    outstanding: AtomicUsize,
    abandoned: AtomicBool,
}

impl<T> Default for AsyncTaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> AsyncTaskQueue<T> {
    pub fn new() -> Self {
        Self {
            inject: Injector::new(),
            available: Notify::new(),
            drained: Notify::new(),
            pending: AtomicUsize::new(0),
            enqueued: AtomicUsize::new(0),
            acknowledged: AtomicUsize::new(0),
            discarded: AtomicUsize::new(0),
            outstanding: AtomicUsize::new(0),
            abandoned: AtomicBool::new(false),
        }
    }

    #[inline(always)]
    fn push(&self, msg: Message<T>) {
        self.pending.fetch_add(1, Ordering::Relaxed);
        self.inject.push(msg);
        self.available.notify_one();
    }

    pub fn enqueue(&self, item: T) {
        // Counted before the push so a fast consumer can never acknowledge
        // below zero.
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        self.enqueued.fetch_add(1, Ordering::Relaxed);
        self.push(Message::Task(item));
    }

    /// Pushes one stop marker. It is not counted as outstanding work.
    pub fn push_sentinel(&self) {
        self.push(Message::Stop);
    }

    pub fn try_dequeue(&self) -> Option<Message<T>> {
        loop {
            match self.inject.steal() {
                Steal::Success(msg) => {
                    self.pending.fetch_sub(1, Ordering::Relaxed);
                    return Some(msg);
                }
                Steal::Empty => return None,
                Steal::Retry => std::hint::spin_loop(),
            }
        }
    }

    /// Takes the head of the queue, suspending the calling task while it is
    /// empty.
    pub async fn dequeue(&self) -> Message<T> {
        loop {
            if let Some(msg) = self.try_dequeue() {
                return msg;
            }

            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(msg) = self.try_dequeue() {
                return msg;
            }
            notified.await;
        }
    }

    /// Like `dequeue`, but gives up with `None` once `token` is cancelled.
    pub async fn dequeue_until(&self, token: &CancellationToken) -> Option<Message<T>> {
        tokio::select! {
            biased;
            _ = token.cancelled() => None,
            msg = self.dequeue() => Some(msg),
        }
    }

    /// Marks one dequeued task as finished. Wakes every `join` caller once
    /// nothing is outstanding.
    pub fn acknowledge(&self) -> Result<()> {
        let prev = self
            .outstanding
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .map_err(|_| Error::AckWithoutTask)?;

        self.acknowledged.fetch_add(1, Ordering::Relaxed);
        if prev == 1 {
            tracing::trace!("queue drained");
            self.drained.notify_waiters();
        }
        Ok(())
    }

    #[inline(always)]
    fn settled(&self) -> bool {
        self.abandoned.load(Ordering::SeqCst) || self.outstanding.load(Ordering::SeqCst) == 0
    }

    /// Suspends until every enqueued task has been acknowledged, or until a
    /// worker abandons the queue.
    pub async fn join(&self) {
        loop {
            let notified = self.drained.notified();
            tokio::pin!(notified);
            // Register before checking so a drain between the load and the
            // await is not missed.
            notified.as_mut().enable();

            if self.settled() {
                return;
            }
            notified.await;
        }
    }

    /// Returns `false` if the deadline passed with work still outstanding.
    pub async fn join_timeout(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.join()).await.is_ok()
    }

    /// Called by a worker that stops without acknowledging its task. Releases
    /// every `join` caller, since the outstanding count can no longer reach zero.
    pub fn abandon(&self) {
        self.abandoned.store(true, Ordering::SeqCst);
        tracing::trace!(outstanding = self.outstanding(), "queue abandoned");
        self.drained.notify_waiters();
    }

    pub fn is_abandoned(&self) -> bool {
        self.abandoned.load(Ordering::SeqCst)
    }

    /// Drops every task still waiting to be dequeued and returns how many were
    /// dropped. Stop markers stay in place. Tasks already handed to a worker
    /// are unaffected.
    pub fn clear_pending(&self) -> usize {
        let mut stops = 0;
        let mut dropped = 0;
        while let Some(msg) = self.try_dequeue() {
            match msg {
                Message::Task(_) => dropped += 1,
                Message::Stop => stops += 1,
            }
        }
        for _ in 0..stops {
            self.push_sentinel();
        }

        if dropped > 0 {
            self.discarded.fetch_add(dropped, Ordering::Relaxed);
            let prev = self.outstanding.fetch_sub(dropped, Ordering::SeqCst);
            if prev == dropped {
                self.drained.notify_waiters();
            }
        }
        dropped
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// Entries waiting to be dequeued, sentinels included.
    pub fn len(&self) -> usize {
        self.pending.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn metrics(&self) -> QueueMetrics {
        QueueMetrics {
            pending: self.pending.load(Ordering::Relaxed),
            enqueued: self.enqueued.load(Ordering::Relaxed),
            acknowledged: self.acknowledged.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            outstanding: self.outstanding.load(Ordering::SeqCst),
        }
    }
}
