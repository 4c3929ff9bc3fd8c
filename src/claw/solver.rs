//! Solver executable invocation
//!
//! The solver is an opaque executable. It is run inside the case's output
//! directory, which also serves as its run directory, so it reads the data
//! files written there and writes its frames next to them.

use crate::error::{IoResultExt, Result, SweepError};
use crate::fs::CaseLog;
use crate::system::{self, CancelToken};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// File in the output directory that receives solver output in no-hang-up mode
pub const NOHUP_FILE: &str = "nohup.out";

/// How to invoke the solver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Executable name or path (`xclaw`)
    pub executable: String,
    /// Run under `nohup`, sending output to `<outdir>/nohup.out`
    pub nohup: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            executable: "xclaw".to_string(),
            nohup: true,
        }
    }
}

impl SolverConfig {
    /// Path the solver's stdout/stderr end up in, if not the case log
    pub fn output_file(&self, outdir: &Path) -> Option<PathBuf> {
        self.nohup.then(|| outdir.join(NOHUP_FILE))
    }
}

/// Runs the solver for one case
#[derive(Debug, Clone)]
pub struct SolverRunner {
    config: SolverConfig,
    grace: Duration,
}

impl SolverRunner {
    /// Create a runner for `config`
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            grace: system::DEFAULT_GRACE,
        }
    }

    /// Set how long the solver gets between SIGTERM and SIGKILL
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Resolve the executable against the current directory.
    ///
    /// The solver runs with the output directory as its working directory,
    /// so a relative path (or a bare name present in the current directory)
    /// must be made absolute first. Bare names not found here go through PATH.
    pub fn resolve_executable(&self) -> PathBuf {
        let exe = Path::new(&self.config.executable);
        let local = exe.components().count() > 1 || exe.is_file();
        if local && exe.is_relative() {
            std::path::absolute(exe).unwrap_or_else(|_| exe.to_path_buf())
        } else {
            exe.to_path_buf()
        }
    }

    /// Run the solver in `outdir`, blocking until it exits or `cancel` trips.
    pub fn run(&self, outdir: &Path, log: &mut CaseLog, cancel: &CancelToken) -> Result<()> {
        cancel.check()?;
        let exe = self.resolve_executable();

        let mut cmd = if self.config.nohup {
            let mut cmd = Command::new("nohup");
            cmd.arg(&exe);
            cmd
        } else {
            Command::new(&exe)
        };
        cmd.current_dir(outdir).stdin(Stdio::null());

        match self.config.output_file(outdir) {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .with_path(&path)?;
                let err = file.try_clone().with_path(&path)?;
                cmd.stdout(Stdio::from(file)).stderr(Stdio::from(err));
            }
            None => {
                cmd.stdout(log.stdio()?).stderr(log.stdio()?);
            }
        }

        info!("Running {} in {}", exe.display(), outdir.display());
        let start = Instant::now();
        let mut child = cmd.spawn().with_path(&exe)?;
        debug!(pid = child.id(), "solver started");

        let status = system::wait_or_cancel(&mut child, cancel, self.grace).with_path(&exe)?;
        let status = status.ok_or(SweepError::Cancelled)?;

        log.line(format!(
            "Solver finished in {} ({})",
            humantime::format_duration(Duration::from_secs(start.elapsed().as_secs())),
            status
        ))?;

        if status.success() {
            Ok(())
        } else {
            Err(SweepError::Solver {
                program: self.config.executable.clone(),
                outdir: outdir.to_path_buf(),
                status,
            })
        }
    }
}

/// Build the solver executable with `make .exe` in `dir`.
pub fn build_executable(dir: &Path) -> Result<()> {
    info!("Compiling solver if necessary: make .exe");
    let status = Command::new("make")
        .arg(".exe")
        .current_dir(dir)
        .stdin(Stdio::null())
        .status()
        .with_path(dir)?;

    if status.success() {
        Ok(())
    } else {
        Err(SweepError::Build { status })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn solver(exe: &Path, nohup: bool) -> SolverRunner {
        SolverRunner::new(SolverConfig {
            executable: exe.display().to_string(),
            nohup,
        })
    }

    #[test]
    fn test_runs_in_outdir_with_nohup_output() {
        let temp = TempDir::new().unwrap();
        let exe = script(temp.path(), "xclaw", "cat claw.data > fort.q0000; echo solver-ran");
        let outdir = temp.path().join("_output_mx100");
        std::fs::create_dir(&outdir).unwrap();
        std::fs::write(outdir.join("claw.data"), "100 =: num_cells\n").unwrap();
        let mut log = CaseLog::create(temp.path().join("run.output")).unwrap();

        solver(&exe, true).run(&outdir, &mut log, &CancelToken::new()).unwrap();

        assert_eq!(
            std::fs::read_to_string(outdir.join("fort.q0000")).unwrap(),
            "100 =: num_cells\n"
        );
        let nohup = std::fs::read_to_string(outdir.join(NOHUP_FILE)).unwrap();
        assert!(nohup.contains("solver-ran"));
    }

    #[test]
    fn test_output_to_log_without_nohup() {
        let temp = TempDir::new().unwrap();
        let exe = script(temp.path(), "xclaw", "echo into-log");
        let mut log = CaseLog::create(temp.path().join("run.output")).unwrap();

        solver(&exe, false).run(temp.path(), &mut log, &CancelToken::new()).unwrap();

        let text = std::fs::read_to_string(temp.path().join("run.output")).unwrap();
        assert!(text.starts_with("into-log\n"));
        assert!(!temp.path().join(NOHUP_FILE).exists());
    }

    #[test]
    fn test_failure_reports_status() {
        let temp = TempDir::new().unwrap();
        let exe = script(temp.path(), "xclaw", "exit 2");
        let mut log = CaseLog::create(temp.path().join("run.output")).unwrap();

        let err = solver(&exe, false)
            .run(temp.path(), &mut log, &CancelToken::new())
            .unwrap_err();
        match err {
            SweepError::Solver { status, .. } => assert_eq!(status.code(), Some(2)),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_cancelled_before_start() {
        let temp = TempDir::new().unwrap();
        let exe = script(temp.path(), "xclaw", "touch ran");
        let mut log = CaseLog::create(temp.path().join("run.output")).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();

        let err = solver(&exe, false).run(temp.path(), &mut log, &cancel).unwrap_err();
        assert!(matches!(err, SweepError::Cancelled));
        assert!(!temp.path().join("ran").exists());
    }

    #[test]
    fn test_bare_name_resolves_via_path() {
        let runner = solver(Path::new("definitely-not-here-xclaw"), true);
        assert_eq!(runner.resolve_executable(), PathBuf::from("definitely-not-here-xclaw"));
    }
}
