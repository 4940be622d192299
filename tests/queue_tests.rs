#[cfg(test)]
mod tests {
    use futures::FutureExt;
    use std::{
        collections::BTreeSet,
        sync::Arc,
        thread,
        time::{Duration, Instant},
    };
    use tokio_util::sync::CancellationToken;
    use worker_queue::{
        errors::Error,
        model::Message,
        queue::{AsyncTaskQueue, TaskQueue},
    };

    #[test]
    fn test_blocking_fifo_order() {
        println!("\n=== TEST: FIFO order ===");
        let queue = TaskQueue::new();
        for i in 0..5u64 {
            queue.enqueue(i);
        }
        queue.push_sentinel();

        let mut seen = Vec::new();
        while let Message::Task(t) = queue.dequeue() {
            seen.push(t);
            queue.acknowledge().unwrap();
        }
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_task_zero_is_not_a_sentinel() {
        let queue = TaskQueue::new();
        queue.enqueue(0u64);
        assert_eq!(queue.dequeue(), Message::Task(0));
        assert!(!Message::Task(0u64).is_stop());
        assert_eq!(Message::<u64>::Stop.into_task(), None);
    }

    #[test]
    fn test_blocking_join_counts_every_ack() {
        println!("\n=== TEST: join after concurrent acks ===");
        let queue = TaskQueue::new();
        let workers = 4;
        let n = 200u64;

        let sets: Vec<BTreeSet<u64>> = thread::scope(|s| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    let queue = &queue;
                    s.spawn(move || {
                        let mut mine = BTreeSet::new();
                        while let Message::Task(t) = queue.dequeue() {
                            mine.insert(t);
                            queue.acknowledge().unwrap();
                        }
                        mine
                    })
                })
                .collect();

            for i in 0..n {
                queue.enqueue(i);
            }
            queue.join();

            let metrics = queue.metrics();
            assert_eq!(metrics.outstanding, 0);
            assert_eq!(metrics.acknowledged, n as usize);

            for _ in 0..workers {
                queue.push_sentinel();
            }
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let total: usize = sets.iter().map(|s| s.len()).sum();
        let union: BTreeSet<u64> = sets.into_iter().flatten().collect();
        assert_eq!(total, n as usize, "no task delivered twice");
        assert_eq!(union, (0..n).collect::<BTreeSet<_>>());
        println!("  ✓ {} tasks split across {} threads", n, workers);
    }

    #[test]
    fn test_sentinels_are_not_counted() {
        let queue: TaskQueue<u64> = TaskQueue::new();
        queue.push_sentinel();
        queue.push_sentinel();

        assert_eq!(queue.outstanding(), 0);
        assert_eq!(queue.len(), 2);
        queue.join();

        assert_eq!(queue.dequeue(), Message::Stop);
        assert!(matches!(queue.acknowledge(), Err(Error::AckWithoutTask)));
        assert_eq!(queue.metrics().enqueued, 0);
    }

    #[test]
    fn test_acknowledge_without_task_fails() {
        let queue = TaskQueue::new();
        queue.enqueue(1u64);
        let _ = queue.dequeue();
        assert!(queue.acknowledge().is_ok());
        assert!(matches!(queue.acknowledge(), Err(Error::AckWithoutTask)));
        assert_eq!(queue.metrics().acknowledged, 1);
    }

    #[test]
    fn test_blocking_join_is_idempotent() {
        let queue = TaskQueue::new();
        queue.join();

        queue.enqueue(7u64);
        let _ = queue.dequeue();
        queue.acknowledge().unwrap();
        queue.join();

        let before = queue.metrics();
        queue.join();
        assert_eq!(queue.metrics(), before);
    }

    #[test]
    fn test_blocking_timeouts() {
        println!("\n=== TEST: blocking timeouts ===");
        let queue: TaskQueue<u64> = TaskQueue::new();

        let start = Instant::now();
        assert!(queue.dequeue_timeout(Duration::from_millis(30)).is_none());
        assert!(start.elapsed() >= Duration::from_millis(30));

        queue.enqueue(1);
        assert!(!queue.join_timeout(Duration::from_millis(30)));
        assert_eq!(queue.dequeue_timeout(Duration::from_millis(30)), Some(Message::Task(1)));
        queue.acknowledge().unwrap();
        assert!(queue.join_timeout(Duration::from_millis(30)));
    }

    #[test]
    fn test_blocking_dequeue_parks_until_enqueue() {
        let queue = TaskQueue::new();
        thread::scope(|s| {
            let consumer = s.spawn(|| queue.dequeue());
            thread::sleep(Duration::from_millis(20));
            queue.enqueue(42u64);
            assert_eq!(consumer.join().unwrap(), Message::Task(42));
        });
    }

    #[tokio::test]
    async fn test_async_join_wakes_after_last_ack() {
        println!("\n=== TEST: async join ===");
        let queue = Arc::new(AsyncTaskQueue::new());
        for i in 0..3u64 {
            queue.enqueue(i);
        }

        let q = queue.clone();
        let consumer = tokio::spawn(async move {
            for _ in 0..3 {
                let _ = q.dequeue().await;
                tokio::time::sleep(Duration::from_millis(5)).await;
                q.acknowledge().unwrap();
            }
        });

        assert!(queue.join().now_or_never().is_none(), "work is outstanding");
        queue.join().await;
        assert_eq!(queue.outstanding(), 0);
        assert_eq!(queue.metrics().acknowledged, 3);
        consumer.await.unwrap();

        // Already drained: resolves on first poll.
        assert!(queue.join().now_or_never().is_some());
        assert!(queue.join().now_or_never().is_some());
    }

    #[tokio::test]
    async fn test_async_dequeue_suspends_until_enqueue() {
        let queue = Arc::new(AsyncTaskQueue::new());
        let q = queue.clone();
        let waiter = tokio::spawn(async move { q.dequeue().await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        queue.enqueue(9u64);
        assert_eq!(waiter.await.unwrap(), Message::Task(9));
        assert_eq!(queue.len(), 0);
    }

    #[tokio::test]
    async fn test_async_consumers_partition_tasks() {
        println!("\n=== TEST: async partition ===");
        let queue = Arc::new(AsyncTaskQueue::new());
        let n = 30u64;
        for i in 0..n {
            queue.enqueue(i);
        }

        let consumers: Vec<_> = (0..3)
            .map(|_| {
                let q = queue.clone();
                tokio::spawn(async move {
                    let mut mine = Vec::new();
                    while let Message::Task(t) = q.dequeue().await {
                        tokio::task::yield_now().await;
                        mine.push(t);
                        q.acknowledge().unwrap();
                    }
                    mine
                })
            })
            .collect();

        queue.join().await;
        for _ in 0..3 {
            queue.push_sentinel();
        }

        let mut all = Vec::new();
        for c in consumers {
            all.extend(c.await.unwrap());
        }
        all.sort_unstable();
        assert_eq!(all, (0..n).collect::<Vec<_>>());
        assert_eq!(queue.metrics().outstanding, 0);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_async_ack_without_task_fails() {
        let queue: AsyncTaskQueue<u64> = AsyncTaskQueue::new();
        queue.push_sentinel();
        assert_eq!(queue.outstanding(), 0);
        assert!(matches!(queue.acknowledge(), Err(Error::AckWithoutTask)));
        assert_eq!(queue.dequeue().await, Message::Stop);
    }

    #[tokio::test]
    async fn test_async_cancellation_and_timeout() {
        println!("\n=== TEST: async cancellation ===");
        let queue: AsyncTaskQueue<u64> = AsyncTaskQueue::new();

        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(queue.dequeue_until(&token).await, None);

        queue.enqueue(3);
        let live = CancellationToken::new();
        assert_eq!(queue.dequeue_until(&live).await, Some(Message::Task(3)));

        assert!(!queue.join_timeout(Duration::from_millis(20)).await);
        queue.acknowledge().unwrap();
        assert!(queue.join_timeout(Duration::from_millis(20)).await);
    }

    #[test]
    fn test_blocking_abandon_releases_join() {
        println!("\n=== TEST: abandoned queue ===");
        let queue = TaskQueue::new();
        queue.enqueue(1u64);
        queue.enqueue(2u64);
        let _ = queue.dequeue();

        thread::scope(|s| {
            let joiner = s.spawn(|| queue.join());
            thread::sleep(Duration::from_millis(20));
            assert!(!joiner.is_finished(), "work is outstanding");
            queue.abandon();
            joiner.join().unwrap();
        });

        assert!(queue.is_abandoned());
        assert_eq!(queue.outstanding(), 2);
        assert!(queue.join_timeout(Duration::from_millis(10)));
    }

    #[test]
    fn test_blocking_clear_pending_keeps_sentinels() {
        let queue = TaskQueue::new();
        for i in 0..4u64 {
            queue.enqueue(i);
        }
        assert_eq!(queue.dequeue(), Message::Task(0));
        queue.push_sentinel();

        assert_eq!(queue.clear_pending(), 3);
        let metrics = queue.metrics();
        assert_eq!(metrics.discarded, 3);
        assert_eq!(metrics.outstanding, 1);
        assert_eq!(metrics.pending, 1);

        // The task already handed out can still be acknowledged.
        queue.acknowledge().unwrap();
        queue.join();
        assert_eq!(queue.dequeue(), Message::Stop);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_async_abandon_releases_join() {
        let queue = Arc::new(AsyncTaskQueue::new());
        queue.enqueue(5u64);
        let _ = queue.dequeue().await;

        let q = queue.clone();
        let joiner = tokio::spawn(async move { q.join().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!joiner.is_finished());

        queue.abandon();
        joiner.await.unwrap();
        assert!(queue.is_abandoned());
        assert_eq!(queue.outstanding(), 1);
        assert!(queue.join().now_or_never().is_some());
    }

    #[tokio::test]
    async fn test_async_clear_pending_wakes_join() {
        let queue = Arc::new(AsyncTaskQueue::new());
        for i in 0..3u64 {
            queue.enqueue(i);
        }
        queue.push_sentinel();

        let q = queue.clone();
        let joiner = tokio::spawn(async move { q.join().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!joiner.is_finished());

        assert_eq!(queue.clear_pending(), 3);
        joiner.await.unwrap();

        let metrics = queue.metrics();
        assert_eq!(metrics.discarded, 3);
        assert_eq!(metrics.outstanding, 0);
        assert_eq!(queue.len(), 1);
        assert!(!queue.is_empty());
        assert_eq!(queue.dequeue().await, Message::Stop);
        assert_eq!(queue.len(), 0);
        assert!(queue.is_empty());
    }
}
