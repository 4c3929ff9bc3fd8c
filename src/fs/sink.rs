//! Per-case output sink
//!
//! Each case gets its own log file. Run routines write to it through an
//! explicit handle, and child processes inherit clones of the same file
//! descriptor for their stdout and stderr.

use crate::core::Case;
use crate::error::{IoResultExt, Result, SweepError};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Stdio;

/// Writable log for one case
#[derive(Debug)]
pub struct CaseLog {
    path: PathBuf,
    file: File,
}

impl CaseLog {
    /// Create (truncating) the log file at `path`.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = File::create(&path).map_err(|source| SweepError::LogFile {
            path: path.clone(),
            source,
        })?;
        Ok(Self { path, file })
    }

    /// Create the log and write a header describing `case`.
    pub fn create_for(path: impl Into<PathBuf>, case: &Case) -> Result<Self> {
        let mut log = Self::create(path)?;
        let host = hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "unknown".to_string());
        writeln!(
            log,
            "# case {} on {} (pid {}) at {}",
            case,
            host,
            std::process::id(),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        )
        .with_path(&log.path)?;
        Ok(log)
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A handle suitable for a child's stdout or stderr
    pub fn stdio(&self) -> Result<Stdio> {
        let clone = self.file.try_clone().with_path(&self.path)?;
        Ok(Stdio::from(clone))
    }

    /// Write one line, attaching the log path to any error
    pub fn line(&mut self, text: impl AsRef<str>) -> Result<()> {
        writeln!(self.file, "{}", text.as_ref()).with_path(&self.path)
    }
}

impl Write for CaseLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_header_and_lines() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("run_beta20.output");
        let case = Case::new().with("beta", 20i64);

        let mut log = CaseLog::create_for(&path, &case).unwrap();
        log.line("Working on case").unwrap();
        drop(log);

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("# case {'beta': 20} on "));
        assert_eq!(lines.next(), Some("Working on case"));
    }

    #[test]
    fn test_unopenable_path_is_log_file_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing-dir").join("case0.out");
        let err = CaseLog::create(&path).unwrap_err();
        assert!(matches!(err, SweepError::LogFile { .. }));
        assert_eq!(err.path().unwrap(), &path);
    }

    #[cfg(unix)]
    #[test]
    fn test_child_output_lands_in_log() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("case.log");
        let mut log = CaseLog::create(&path).unwrap();
        log.line("before").unwrap();

        let status = std::process::Command::new("sh")
            .args(["-c", "echo from-child; echo to-stderr >&2"])
            .stdout(log.stdio().unwrap())
            .stderr(log.stdio().unwrap())
            .status()
            .unwrap();
        assert!(status.success());
        log.line("after").unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "before\nfrom-child\nto-stderr\nafter\n");
    }
}
