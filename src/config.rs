use super::errors::{Error, Result};
use std::time::Duration;

/// Runner configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// OS threads used by the blocking runner.
    pub sync_workers: usize,
    /// Cooperative tasks used by the non-blocking runner.
    pub async_workers: usize,
    /// Simulated latency of a single task.
    pub task_delay: Duration,
    /// Upper bound on waiting for the queue to drain. `None` waits forever.
    pub drain_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sync_workers: 1,
            async_workers: 3,
            task_delay: Duration::from_secs(1),
            drain_timeout: None,
        }
    }
}

impl Config {
    /// One blocking worker per CPU.
    pub fn parallel() -> Self {
        Self {
            sync_workers: num_cpus::get(),
            ..Default::default()
        }
    }

    /// Default worker counts with a custom per-task delay.
    pub fn fast(task_delay: Duration) -> Self {
        Self {
            task_delay,
            ..Default::default()
        }
    }

    pub fn with_sync_workers(mut self, n: usize) -> Self {
        self.sync_workers = n;
        self
    }

    pub fn with_async_workers(mut self, n: usize) -> Self {
        self.async_workers = n;
        self
    }

    pub fn with_task_delay(mut self, delay: Duration) -> Self {
        self.task_delay = delay;
        self
    }

    pub fn with_drain_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.drain_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.sync_workers == 0 {
            return Err(Error::config("sync_workers must be at least 1"));
        }
        if self.async_workers == 0 {
            return Err(Error::config("async_workers must be at least 1"));
        }
        Ok(())
    }
}
