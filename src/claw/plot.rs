//! Plot generation
//!
//! Plotting is delegated to an external command (by default Clawpack's
//! `plotclaw` module). The swept parameters reach the plotting
//! configuration through `CLAW_SWEEP_*` environment variables.

use crate::core::Case;
use crate::error::{IoResultExt, Result, SweepError};
use crate::fs::CaseLog;
use crate::system::{self, CancelToken};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::info;

/// Prefix of the environment variables carrying case parameters
pub const ENV_PREFIX: &str = "CLAW_SWEEP_";

/// Produces plots from a finished solver run
pub trait Plotter {
    /// Render frames from `outdir` into `plotdir`
    fn plot(
        &self,
        outdir: &Path,
        plotdir: &Path,
        case: &Case,
        log: &mut CaseLog,
        cancel: &CancelToken,
    ) -> Result<()>;
}

/// External plotting command with `{outdir}`, `{plotdir}`, `{setplot}` placeholders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotCommand {
    /// Program to run
    pub program: String,
    /// Argument templates
    pub args: Vec<String>,
    /// Plotting configuration passed as `{setplot}`
    pub setplot: PathBuf,
}

impl Default for PlotCommand {
    fn default() -> Self {
        Self {
            program: "python".to_string(),
            args: ["-m", "clawpack.visclaw.plotclaw", "{outdir}", "{plotdir}", "{setplot}"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            setplot: PathBuf::from("setplot.py"),
        }
    }
}

impl PlotCommand {
    /// Substitute placeholders in the argument templates
    pub fn expand_args(&self, outdir: &Path, plotdir: &Path) -> Vec<String> {
        let outdir = outdir.display().to_string();
        let plotdir = plotdir.display().to_string();
        let setplot = self.setplot.display().to_string();
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{outdir}", &outdir)
                    .replace("{plotdir}", &plotdir)
                    .replace("{setplot}", &setplot)
            })
            .collect()
    }
}

/// Environment variable name for a case parameter
pub fn env_key(param: &str) -> String {
    let mut key = String::with_capacity(ENV_PREFIX.len() + param.len());
    key.push_str(ENV_PREFIX);
    key.extend(param.chars().map(|c| {
        if c.is_ascii_alphanumeric() {
            c.to_ascii_uppercase()
        } else {
            '_'
        }
    }));
    key
}

impl Plotter for PlotCommand {
    fn plot(
        &self,
        outdir: &Path,
        plotdir: &Path,
        case: &Case,
        log: &mut CaseLog,
        cancel: &CancelToken,
    ) -> Result<()> {
        cancel.check()?;
        log.line(format!("Plotting using {}", self.setplot.display()))?;
        info!("Plotting {} into {}", outdir.display(), plotdir.display());

        let mut cmd = Command::new(&self.program);
        cmd.args(self.expand_args(outdir, plotdir))
            .stdin(Stdio::null())
            .stdout(log.stdio()?)
            .stderr(log.stdio()?);
        for (key, value) in case.iter() {
            cmd.env(env_key(key), value.to_string());
        }

        let mut child = cmd.spawn().with_path(&self.program)?;
        let status = system::wait_or_cancel(&mut child, cancel, system::DEFAULT_GRACE)
            .with_path(&self.program)?
            .ok_or(SweepError::Cancelled)?;

        if status.success() {
            Ok(())
        } else {
            Err(SweepError::Plot {
                program: self.program.clone(),
                outdir: outdir.to_path_buf(),
                status,
            })
        }
    }
}
