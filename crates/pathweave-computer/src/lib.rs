//! In-process GraphComputer backend
//!
//! Runs each vertex partition of a [`TraversalVertexProgram`] on a rayon
//! thread pool. Results keep partition order, so output is deterministic
//! for a given partitioning regardless of scheduling.

use pathweave::process::{GraphComputer, TraversalVertexProgram, Traverser};
use pathweave::structure::ElementId;
use pathweave::{TraversalError, TraversalResult};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::fmt;
use std::time::Instant;
use tracing::debug;

/// Partition-parallel computer over a dedicated thread pool
pub struct LocalComputer {
    pool: ThreadPool,
    workers: usize,
}

impl LocalComputer {
    /// Computer with one worker per available core
    pub fn new() -> TraversalResult<Self> {
        Self::with_workers(rayon::current_num_threads())
    }

    /// Computer with exactly `workers` threads (at least one)
    pub fn with_workers(workers: usize) -> TraversalResult<Self> {
        let workers = workers.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("pathweave-worker-{}", i))
            .build()
            .map_err(|e| TraversalError::Computer(format!("failed to start worker pool: {}", e)))?;
        Ok(Self { pool, workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

impl GraphComputer for LocalComputer {
    fn execute(
        &self,
        program: &TraversalVertexProgram,
        partitions: &[Vec<ElementId>],
    ) -> TraversalResult<Vec<Vec<Traverser>>> {
        let started = Instant::now();
        let results = self.pool.install(|| {
            partitions
                .par_iter()
                .map(|ids| program.execute_partition(ids))
                .collect::<TraversalResult<Vec<_>>>()
        })?;
        debug!(
            workers = self.workers,
            partitions = partitions.len(),
            traversers = results.iter().map(Vec::len).sum::<usize>(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "vertex program finished"
        );
        Ok(results)
    }
}

impl fmt::Debug for LocalComputer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalComputer").field("workers", &self.workers).finish()
    }
}
