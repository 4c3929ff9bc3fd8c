//! Worker side of the fan-out
//!
//! The parent re-executes its own binary with the hidden `worker`
//! subcommand and sends a [`WorkerAssignment`] as JSON on stdin. The worker
//! rebuilds the sweep driver from it and runs its cases in order.

use super::{Case, CasePartition, WorkerLauncher, WorkerSlice};
use crate::error::{Result, SweepError};
use crate::fs::CaseLog;
use crate::interact::Prompter;
use crate::sweep::{CaseContext, SweepSpec};
use crate::system::CancelToken;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use tracing::{debug, info, warn};

/// Everything a worker process needs to run its share of the cases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerAssignment {
    /// Worker index
    pub worker_id: usize,
    /// Which sweep to run, with its options
    pub spec: SweepSpec,
    /// Cases in execution order
    pub cases: Vec<Case>,
}

impl WorkerAssignment {
    /// Read an assignment from `reader` (the worker's stdin)
    pub fn read_from(mut reader: impl Read) -> Result<Self> {
        let mut buf = String::new();
        reader
            .read_to_string(&mut buf)
            .map_err(|e| SweepError::WorkerProtocol(format!("reading assignment: {}", e)))?;
        Ok(serde_json::from_str(&buf)?)
    }
}

/// Launches workers by re-executing the current binary
pub struct SelfExecLauncher {
    exe: PathBuf,
    spec: SweepSpec,
    args: Vec<String>,
}

impl SelfExecLauncher {
    /// Launch `exe worker` for each slice of `spec`
    pub fn new(exe: impl Into<PathBuf>, spec: SweepSpec) -> Self {
        Self {
            exe: exe.into(),
            spec,
            args: Vec::new(),
        }
    }

    /// Launch the running executable
    pub fn current(spec: SweepSpec) -> Result<Self> {
        let exe = std::env::current_exe()
            .map_err(|e| SweepError::config(format!("Cannot locate own executable: {}", e)))?;
        Ok(Self::new(exe, spec))
    }

    /// Global arguments passed before the `worker` subcommand (e.g. `-v`)
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

impl WorkerLauncher for SelfExecLauncher {
    fn prepare(&self, partition: &CasePartition, prompter: &mut dyn Prompter) -> Result<()> {
        let driver = self.spec.driver();
        for case in partition.all_cases() {
            driver.prepare_case(case, prompter)?;
        }
        Ok(())
    }

    fn launch(&self, slice: &WorkerSlice) -> Result<Child> {
        let assignment = WorkerAssignment {
            worker_id: slice.worker_id,
            spec: self.spec.clone(),
            cases: slice.cases.clone(),
        };
        let payload = serde_json::to_vec(&assignment)?;

        let mut child = Command::new(&self.exe)
            .args(&self.args)
            .arg("worker")
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|source| SweepError::WorkerSpawn {
                worker: slice.worker_id,
                source,
            })?;

        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(&payload),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "worker stdin not captured",
            )),
        };
        if let Err(e) = written {
            let _ = child.kill();
            let _ = child.wait();
            return Err(SweepError::WorkerProtocol(format!(
                "sending assignment to worker {}: {}",
                slice.worker_id, e
            )));
        }

        debug!(worker = slice.worker_id, pid = child.id(), cases = slice.cases.len(), "worker launched");
        Ok(child)
    }
}

/// Run every case of `assignment` in order.
///
/// The first failing case stops the worker; the rest are reported as skipped.
pub fn run_worker(assignment: &WorkerAssignment, cancel: &CancelToken) -> Result<()> {
    let pid = std::process::id();
    let driver = assignment.spec.driver();

    let mut message = format!("Process {} will run these cases:\n", pid);
    for case in &assignment.cases {
        message.push_str(&format!("  {}\n", case));
    }
    print!("{}", message);

    for (index, case) in assignment.cases.iter().enumerate() {
        let result = cancel.check().and_then(|()| {
            println!("Process {} now running this case: {}", pid, case);
            let log_path = driver.log_path(case)?;
            println!("Output will go to {}", log_path.display());
            let mut log = CaseLog::create_for(log_path, case)?;
            driver.run_one_case(
                case,
                &mut CaseContext {
                    log: &mut log,
                    cancel,
                },
            )
        });

        if let Err(e) = result {
            let skipped = assignment.cases.len() - index - 1;
            if e.is_user_stop() {
                info!(worker = assignment.worker_id, "Stopped with {} cases not run", skipped + 1);
            } else {
                if let Some(path) = e.path() {
                    debug!(worker = assignment.worker_id, path = %path.display(), "case failed");
                }
                if skipped > 0 {
                    warn!(
                        worker = assignment.worker_id,
                        "Skipping {} remaining cases after failure of {}", skipped, case
                    );
                }
            }
            return Err(e);
        }
    }

    info!(
        "Process {} finished {} {} cases",
        pid,
        assignment.cases.len(),
        driver.name()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweep::SampleSweep;
    use tempfile::TempDir;

    fn sample_assignment(dir: &std::path::Path, nums: &[usize]) -> WorkerAssignment {
        let sweep = SampleSweep {
            count: 7,
            delay_ms: 0,
            output_dir: dir.to_path_buf(),
        };
        let all = crate::sweep::SweepDriver::make_all_cases(&sweep).unwrap();
        WorkerAssignment {
            worker_id: 1,
            cases: nums.iter().map(|&n| all[n].clone()).collect(),
            spec: SweepSpec::Sample(sweep),
        }
    }

    #[test]
    fn test_assignment_json() {
        let temp = TempDir::new().unwrap();
        let assignment = sample_assignment(temp.path(), &[1, 3, 5]);

        let json = serde_json::to_string(&assignment).unwrap();
        assert!(json.contains("\"kind\":\"sample\""));

        let parsed = WorkerAssignment::read_from(json.as_bytes()).unwrap();
        assert_eq!(parsed, assignment);
    }

    #[test]
    fn test_malformed_assignment() {
        let err = WorkerAssignment::read_from(&b"{\"worker_id\": 0"[..]).unwrap_err();
        assert!(matches!(err, SweepError::WorkerProtocol(_)));
    }

    #[test]
    fn test_run_worker_runs_its_cases_only() {
        let temp = TempDir::new().unwrap();
        let assignment = sample_assignment(temp.path(), &[1, 3, 5]);

        run_worker(&assignment, &CancelToken::new()).unwrap();

        for num in [1, 3, 5] {
            let text = std::fs::read_to_string(temp.path().join(format!("case{}.out", num))).unwrap();
            assert!(text.starts_with("# case "));
            assert!(text.ends_with(&format!("Done with case {}\n", num)));
        }
        for num in [0, 2, 4, 6] {
            assert!(!temp.path().join(format!("case{}.out", num)).exists());
        }
    }

    #[test]
    fn test_run_worker_stops_at_first_failure() {
        let temp = TempDir::new().unwrap();
        let mut assignment = sample_assignment(temp.path(), &[0, 1]);
        // A log path inside a missing directory cannot be opened.
        assignment.cases[0] = assignment.cases[0]
            .clone()
            .with("log", temp.path().join("missing/case0.out").display().to_string());

        let err = run_worker(&assignment, &CancelToken::new()).unwrap_err();

        assert!(matches!(err, SweepError::LogFile { .. }));
        assert!(!temp.path().join("case1.out").exists());
    }

    #[test]
    fn test_cancelled_worker_runs_nothing() {
        let temp = TempDir::new().unwrap();
        let assignment = sample_assignment(temp.path(), &[0]);
        let cancel = CancelToken::new();
        cancel.cancel();

        let err = run_worker(&assignment, &cancel).unwrap_err();
        assert!(matches!(err, SweepError::Cancelled));
        assert!(!temp.path().join("case0.out").exists());
    }
}
