//! Bounded worker pool for the two parallel stages of a pass.
//!
//! Results always come back in input order, whatever order the workers
//! finish in.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use super::error::CompareError;

/// Pair scoring stays sequential at or below this many pairs.
pub const PARALLEL_PAIR_THRESHOLD: usize = 100;

/// Pair scoring needs at least this many workers to go parallel.
pub const MIN_PARALLEL_WORKERS: usize = 4;

pub struct WorkerPool
{
    workers: usize,
    pool: Option<ThreadPool>,
}

impl WorkerPool
{
    /// A pool of `workers` threads. One worker runs on the calling thread.
    pub fn new(workers: usize) -> Result<Self, CompareError>
    {
        if workers == 0
        {
            return Err(CompareError::InvalidWorkers);
        }

        let pool = if workers > 1
        {
            Some(
                ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .thread_name(|i| format!("simpair-worker-{i}"))
                    .build()?,
            )
        }
        else
        {
            None
        };

        Ok(Self { workers, pool })
    }

    pub fn sequential() -> Self
    {
        Self { workers: 1, pool: None }
    }

    pub fn workers(&self) -> usize
    {
        self.workers
    }

    /// Map every item, on the pool when there is one.
    pub fn map<T, R, F>(
        &self,
        items: &[T],
        f: F,
    ) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync + Send,
    {
        match &self.pool
        {
            Some(pool) => pool.install(|| items.par_iter().map(&f).collect()),
            None => items.iter().map(f).collect(),
        }
    }

    /// Map pair-sized work, going parallel only when it pays for the dispatch.
    pub fn map_pairs<T, R, F>(
        &self,
        items: &[T],
        f: F,
    ) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync + Send,
    {
        if items.len() > PARALLEL_PAIR_THRESHOLD && self.workers >= MIN_PARALLEL_WORKERS
        {
            self.map(items, f)
        }
        else
        {
            items.iter().map(f).collect()
        }
    }
}

impl Default for WorkerPool
{
    fn default() -> Self
    {
        Self::sequential()
    }
}
