//! Scoped timing: record the start, run the wrapped operation, return its
//! output together with the elapsed wall time.

use std::{
    future::Future,
    time::{Duration, Instant},
};

#[inline]
pub fn timed<F, T>(f: F) -> (T, Duration)
where
    F: FnOnce() -> T,
{
    let start = Instant::now();
    let out = f();
    (out, start.elapsed())
}

#[inline]
pub async fn timed_async<Fut, T>(fut: Fut) -> (T, Duration)
where
    Fut: Future<Output = T>,
{
    let start = Instant::now();
    let out = fut.await;
    (out, start.elapsed())
}
