use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the [`DiffEngine`](crate::DiffEngine).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of tasks executing at the same time.
    pub workers: usize,
    /// Per-task time budget in milliseconds. `None` disables the limit.
    pub task_timeout_ms: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            task_timeout_ms: None,
        }
    }
}

impl EngineConfig {
    /// One task at a time, in strict FIFO order.
    pub fn sequential() -> Self {
        Self {
            workers: 1,
            ..Default::default()
        }
    }

    /// Up to `workers` concurrent tasks.
    pub fn parallel(workers: usize) -> Self {
        Self {
            workers,
            ..Default::default()
        }
    }

    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Worker count, never less than one.
    pub fn effective_workers(&self) -> usize {
        self.workers.max(1)
    }

    pub fn task_timeout(&self) -> Option<Duration> {
        self.task_timeout_ms.map(Duration::from_millis)
    }
}
