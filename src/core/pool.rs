//! Worker process pool
//!
//! One OS process per worker, spawned eagerly and joined at the end. The
//! pool is scoped: dropping it terminates any worker still running, so
//! every exit path (success, error, interrupt) tears the workers down.

use super::{Case, CasePartition, WorkerSlice};
use crate::error::{Result, SweepError};
use crate::interact::Prompter;
use crate::progress::PoolProgress;
use crate::system::{self, CancelToken};
use std::process::{Child, ExitStatus};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Starts the process for one worker
pub trait WorkerLauncher {
    /// Called once after the run is confirmed and before any worker starts.
    fn prepare(&self, _partition: &CasePartition, _prompter: &mut dyn Prompter) -> Result<()> {
        Ok(())
    }

    /// Spawn the process that runs `slice`.
    fn launch(&self, slice: &WorkerSlice) -> Result<Child>;
}

/// How one worker ended
#[derive(Debug, Clone)]
pub struct WorkerOutcome {
    /// Worker index
    pub worker_id: usize,
    /// OS process id
    pub pid: u32,
    /// Number of cases assigned
    pub cases: usize,
    /// Exit status
    pub status: ExitStatus,
    /// Wall time from spawn to exit
    pub elapsed: Duration,
}

impl WorkerOutcome {
    /// Check if the worker exited successfully
    pub fn is_success(&self) -> bool {
        self.status.success()
    }
}

/// Result of a fan-out run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// One outcome per worker, by worker index
    pub outcomes: Vec<WorkerOutcome>,
    /// Total cases
    pub total_cases: usize,
    /// Wall time of the whole run
    pub elapsed: Duration,
}

impl RunSummary {
    /// Indices of workers that exited unsuccessfully
    pub fn failed(&self) -> Vec<usize> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_success())
            .map(|o| o.worker_id)
            .collect()
    }

    /// Check if every worker succeeded
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(WorkerOutcome::is_success)
    }

    /// Turn a partial run into an error
    pub fn into_result(self) -> Result<Self> {
        let failed = self.failed();
        if failed.is_empty() {
            Ok(self)
        } else {
            Err(SweepError::WorkersFailed {
                failed,
                total: self.outcomes.len(),
            })
        }
    }

    /// Print per-worker results to stdout
    pub fn print_summary(&self) {
        println!();
        println!("=== Run Summary ===");
        for outcome in &self.outcomes {
            let mark = if outcome.is_success() {
                console::style("ok").green()
            } else {
                console::style("FAILED").red().bold()
            };
            println!(
                "Worker {:>3} (pid {:>7}): {:>3} cases  {:>10}  {} ({})",
                outcome.worker_id,
                outcome.pid,
                outcome.cases,
                humantime::format_duration(Duration::from_secs(outcome.elapsed.as_secs())),
                mark,
                outcome.status
            );
        }
        println!(
            "{} cases on {} processes in {}",
            self.total_cases,
            self.outcomes.len(),
            humantime::format_duration(Duration::from_secs(self.elapsed.as_secs()))
        );
    }
}

struct WorkerProcess {
    worker_id: usize,
    cases: usize,
    child: Child,
    started: Instant,
    outcome: Option<WorkerOutcome>,
}

impl WorkerProcess {
    fn poll(&mut self) -> Result<Option<&WorkerOutcome>> {
        if self.outcome.is_none() {
            let status = self.child.try_wait().map_err(|source| SweepError::WorkerIo {
                worker: self.worker_id,
                source,
            })?;
            if let Some(status) = status {
                self.record(status);
            }
        }
        Ok(self.outcome.as_ref())
    }

    fn record(&mut self, status: ExitStatus) {
        self.outcome = Some(WorkerOutcome {
            worker_id: self.worker_id,
            pid: self.child.id(),
            cases: self.cases,
            status,
            elapsed: self.started.elapsed(),
        });
    }
}

/// Running worker processes
pub struct WorkerPool {
    workers: Vec<WorkerProcess>,
    grace: Duration,
}

impl WorkerPool {
    /// Spawn one worker per slice.
    ///
    /// If a launch fails, workers already started are torn down before
    /// the error is returned.
    pub fn spawn<L: WorkerLauncher + ?Sized>(
        partition: &CasePartition,
        launcher: &L,
        grace: Duration,
    ) -> Result<Self> {
        let mut pool = Self {
            workers: Vec::with_capacity(partition.worker_count()),
            grace,
        };

        for slice in partition.slices() {
            let child = launcher.launch(slice)?;
            info!("Starting process: {}", child.id());
            pool.workers.push(WorkerProcess {
                worker_id: slice.worker_id,
                cases: slice.cases.len(),
                child,
                started: Instant::now(),
                outcome: None,
            });
        }

        Ok(pool)
    }

    /// Number of spawned workers
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    /// Check if no workers were spawned
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Wait for every worker. Returns `Cancelled` (after tearing down) if `cancel` trips.
    pub fn join(mut self, cancel: &CancelToken, progress: &PoolProgress) -> Result<Vec<WorkerOutcome>> {
        loop {
            let mut running = 0;
            for worker in &mut self.workers {
                let was_done = worker.outcome.is_some();
                match worker.poll()? {
                    Some(outcome) if !was_done => {
                        if outcome.is_success() {
                            info!("Worker {} (pid {}) finished", outcome.worker_id, outcome.pid);
                        } else {
                            warn!(
                                "Worker {} (pid {}) failed: {}",
                                outcome.worker_id, outcome.pid, outcome.status
                            );
                        }
                        progress.worker_finished(outcome.is_success());
                    }
                    Some(_) => {}
                    None => running += 1,
                }
            }

            if running == 0 {
                break;
            }

            if cancel.wait_timeout(system::POLL_INTERVAL) {
                warn!("Cancelling run, terminating {} workers", running);
                self.shutdown();
                return Err(SweepError::Cancelled);
            }
        }

        Ok(self
            .workers
            .iter()
            .filter_map(|w| w.outcome.clone())
            .collect())
    }

    /// SIGTERM every live worker, wait up to the grace period, then kill.
    fn shutdown(&mut self) {
        let mut live = 0;
        for worker in self.workers.iter_mut().filter(|w| w.outcome.is_none()) {
            debug!(worker = worker.worker_id, pid = worker.child.id(), "terminating worker");
            system::process::signal_terminate(&mut worker.child);
            live += 1;
        }
        if live == 0 {
            return;
        }

        let deadline = Instant::now() + self.grace;
        loop {
            let mut remaining = 0;
            for worker in &mut self.workers {
                if !matches!(worker.poll(), Ok(Some(_))) {
                    remaining += 1;
                }
            }
            if remaining == 0 || Instant::now() >= deadline {
                break;
            }
            std::thread::sleep(system::POLL_INTERVAL);
        }

        for worker in self.workers.iter_mut().filter(|w| w.outcome.is_none()) {
            warn!(worker = worker.worker_id, pid = worker.child.id(), "killing worker");
            let _ = worker.child.kill();
            if let Ok(status) = worker.child.wait() {
                worker.record(status);
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Confirms, prepares and runs a case list across worker processes
pub struct CaseRunner<'a> {
    nprocs: usize,
    prompter: &'a mut dyn Prompter,
    cancel: CancelToken,
    progress: PoolProgress,
    grace: Duration,
    trap_signals: bool,
}

impl<'a> CaseRunner<'a> {
    /// Create a runner for `nprocs` workers
    pub fn new(nprocs: usize, prompter: &'a mut dyn Prompter) -> Self {
        Self {
            nprocs,
            prompter,
            cancel: CancelToken::new(),
            progress: PoolProgress::disabled(),
            grace: system::DEFAULT_GRACE,
            trap_signals: false,
        }
    }

    /// Route SIGINT/SIGTERM into the cancel token once the run is confirmed
    /// and prepared.
    ///
    /// Until then an interrupt keeps its default action, so Ctrl-C at a
    /// prompt ends the process before anything is removed or spawned.
    pub fn with_signal_handler(mut self) -> Self {
        self.trap_signals = true;
        self
    }

    /// Observe an external cancellation token
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Report worker completion
    pub fn with_progress(mut self, progress: PoolProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Set how long workers get between SIGTERM and SIGKILL
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Split `cases` across the workers, confirm, prepare, spawn and join.
    ///
    /// Nothing is created or spawned unless the user confirms.
    pub fn run_many_cases<L: WorkerLauncher + ?Sized>(
        &mut self,
        cases: Vec<Case>,
        launcher: &L,
    ) -> Result<RunSummary> {
        let start = Instant::now();
        let partition = CasePartition::round_robin(cases, self.nprocs)?;
        debug!(?partition, "partitioned cases");

        println!(
            "\n{} cases will be run on {} processes",
            partition.total_cases(),
            partition.worker_count()
        );
        if !self.prompter.confirm("OK to run?")? {
            return Err(SweepError::Aborted("run not confirmed".to_string()));
        }

        launcher.prepare(&partition, &mut *self.prompter)?;
        if self.trap_signals {
            self.cancel.install_signal_handler()?;
        }
        self.cancel.check()?;

        println!("\n=========================================\n");
        let pool = WorkerPool::spawn(&partition, launcher, self.grace)?;
        self.progress.start(pool.len());
        let outcomes = pool.join(&self.cancel, &self.progress);
        self.progress.finish();

        Ok(RunSummary {
            outcomes: outcomes?,
            total_cases: partition.total_cases(),
            elapsed: start.elapsed(),
        })
    }
}

/// Run `cases` on `nprocs` worker processes started by `launcher`.
pub fn run_many_cases<L: WorkerLauncher + ?Sized>(
    cases: Vec<Case>,
    nprocs: usize,
    launcher: &L,
    prompter: &mut dyn Prompter,
) -> Result<RunSummary> {
    CaseRunner::new(nprocs, prompter).run_many_cases(cases, launcher)
}
