//! Worker threads for batch fitting evaluation.
//!
//! A [WorkerPool] is the configured thread count. [WorkerPool::runner] builds the rayon pool
//! once per batch run so every batch of that run shares the same threads.

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::config::EngineConfig;

/// Thread count for batch evaluation. Zero means rayon's global pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerPool {
    pub workers: usize,
}

impl WorkerPool {
    pub fn default_workers() -> Self {
        Self::default()
    }

    pub fn with_workers(n: usize) -> Self {
        Self { workers: n }
    }

    /// Worker count from [EngineConfig::workers].
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::with_workers(config.workers)
    }

    /// Threads a batch run on this pool will use.
    pub fn thread_count(&self) -> usize {
        match self.workers {
            0 => rayon::current_num_threads(),
            n => n,
        }
    }

    /// Build the threads for one batch run. A pool that cannot be built falls back to the
    /// global pool with a warning; evaluation still completes.
    pub fn runner(&self) -> BatchRunner {
        if self.workers == 0 {
            return BatchRunner { pool: None };
        }
        let pool = match ThreadPoolBuilder::new().num_threads(self.workers).build() {
            Ok(pool) => Some(pool),
            Err(err) => {
                tracing::warn!(workers = self.workers, error = %err, "falling back to global rayon pool");
                None
            }
        };
        BatchRunner { pool }
    }

    /// Evaluate one closure on a runner built just for it.
    pub fn install<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        self.runner().install(f)
    }
}

/// Threads held for the length of one batch run.
#[derive(Debug)]
pub struct BatchRunner {
    pool: Option<ThreadPool>,
}

impl BatchRunner {
    /// Run one batch of fittings on the held threads.
    pub fn install<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        match &self.pool {
            Some(pool) => pool.install(f),
            None => f(),
        }
    }

    pub fn is_dedicated(&self) -> bool {
        self.pool.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runner_holds_the_configured_threads() {
        let config = EngineConfig {
            workers: 3,
            ..EngineConfig::default()
        };
        let pool = WorkerPool::from_config(&config);
        assert_eq!(pool.thread_count(), 3);

        let runner = pool.runner();
        assert!(runner.is_dedicated());
        assert_eq!(runner.install(rayon::current_num_threads), 3);
        assert_eq!(runner.install(rayon::current_num_threads), 3);
    }

    #[test]
    fn zero_workers_use_the_global_pool() {
        let runner = WorkerPool::default_workers().runner();
        assert!(!runner.is_dedicated());
        assert_eq!(runner.install(|| 7), 7);
        assert_eq!(
            WorkerPool::default().thread_count(),
            rayon::current_num_threads()
        );
        assert_eq!(WorkerPool::with_workers(2).install(rayon::current_num_threads), 2);
    }
}
