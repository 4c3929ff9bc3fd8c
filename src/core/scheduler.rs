//! Static case scheduling
//!
//! Cases are assigned to workers once, up front, round robin by list
//! index. There is no work stealing: a worker runs exactly the cases it
//! was given, in list order.

use crate::core::Case;
use crate::error::{Result, SweepError};

/// Cases assigned to one worker
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerSlice {
    /// Worker index (0-based)
    pub worker_id: usize,
    /// Cases in execution order
    pub cases: Vec<Case>,
}

/// Round-robin assignment of cases to workers
#[derive(Debug, Clone)]
pub struct CasePartition {
    slices: Vec<WorkerSlice>,
    total_cases: usize,
}

impl CasePartition {
    /// Split `cases` across `nprocs` workers, case `i` going to worker `i % nprocs`.
    ///
    /// Always yields `nprocs` slices, some of which may be empty.
    pub fn round_robin(cases: Vec<Case>, nprocs: usize) -> Result<Self> {
        let total_cases = cases.len();
        let slices = partition_round_robin(cases, nprocs)?
            .into_iter()
            .enumerate()
            .map(|(worker_id, cases)| WorkerSlice { worker_id, cases })
            .collect();

        Ok(Self {
            slices,
            total_cases,
        })
    }

    /// Number of workers
    pub fn worker_count(&self) -> usize {
        self.slices.len()
    }

    /// Total number of cases across all workers
    pub fn total_cases(&self) -> usize {
        self.total_cases
    }

    /// Borrow the per-worker slices
    pub fn slices(&self) -> &[WorkerSlice] {
        &self.slices
    }

    /// Iterate over all cases in original list order
    pub fn all_cases(&self) -> impl Iterator<Item = &Case> {
        let n = self.slices.len();
        (0..self.total_cases).map(move |i| &self.slices[i % n].cases[i / n])
    }
}

/// Split items into exactly `nprocs` lists by index modulo `nprocs`.
pub fn partition_round_robin<T>(items: Vec<T>, nprocs: usize) -> Result<Vec<Vec<T>>> {
    if nprocs == 0 {
        return Err(SweepError::config("number of processes must be at least 1"));
    }

    let mut parts: Vec<Vec<T>> = (0..nprocs)
        .map(|_| Vec::with_capacity(items.len() / nprocs + 1))
        .collect();

    for (i, item) in items.into_iter().enumerate() {
        parts[i % nprocs].push(item);
    }

    Ok(parts)
}
