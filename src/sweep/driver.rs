//! Sweep driver abstraction
//!
//! A driver knows how to generate its cases, how to prepare the filesystem
//! for them (in the parent, where prompting is possible), and how to run a
//! single case (in a worker process).

use super::{ParameterSweep, SampleSweep};
use crate::core::Case;
use crate::error::Result;
use crate::fs::CaseLog;
use crate::interact::Prompter;
use crate::system::CancelToken;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything a run routine may touch while running one case
pub struct CaseContext<'a> {
    /// Output sink for this case
    pub log: &'a mut CaseLog,
    /// Cancellation for this worker
    pub cancel: &'a CancelToken,
}

/// A parameter sweep
pub trait SweepDriver {
    /// Short name used in messages
    fn name(&self) -> &str;

    /// One-off setup in the parent before any case is generated (e.g. building the solver)
    fn before_run(&self) -> Result<()> {
        Ok(())
    }

    /// Generate the case list. Must not touch the filesystem.
    fn make_all_cases(&self) -> Result<Vec<Case>>;

    /// Create whatever the case needs on disk. Runs in the parent after confirmation.
    fn prepare_case(&self, _case: &Case, _prompter: &mut dyn Prompter) -> Result<()> {
        Ok(())
    }

    /// Where this case's log goes
    fn log_path(&self, case: &Case) -> Result<PathBuf> {
        case.path("log")
    }

    /// Run one case. Runs in a worker process.
    fn run_one_case(&self, case: &Case, ctx: &mut CaseContext<'_>) -> Result<()>;
}

/// Serializable choice of driver, so a worker can rebuild it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SweepSpec {
    /// The numbered sample cases
    Sample(SampleSweep),
    /// A single-parameter Clawpack sweep
    Parameter(ParameterSweep),
}

impl SweepSpec {
    /// Borrow the driver
    pub fn driver(&self) -> &dyn SweepDriver {
        match self {
            Self::Sample(sweep) => sweep,
            Self::Parameter(sweep) => sweep,
        }
    }
}
