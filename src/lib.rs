//! # clawsweep - Parallel Parameter Sweeps for Clawpack
//!
//! clawsweep runs a list of independent cases across a fixed number of
//! worker processes. Cases are assigned round robin by list index, the
//! user confirms before anything is created, and every worker is torn down
//! on the same code path whether the run succeeds, fails or is interrupted.
//!
//! Two kinds of sweeps are built in: numbered sample cases that only write
//! to their log, and single-parameter sweeps of a Clawpack run (`beta`,
//! `mx`) that write the run configuration, run the solver executable and
//! make plots for each value.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clawsweep::core::SelfExecLauncher;
//! use clawsweep::interact::AssumeYes;
//! use clawsweep::sweep::{SampleSweep, SweepDriver, SweepSpec};
//!
//! let sweep = SampleSweep::default();
//! let cases = sweep.make_all_cases().unwrap();
//! let launcher = SelfExecLauncher::current(SweepSpec::Sample(sweep)).unwrap();
//!
//! let summary = clawsweep::core::run_many_cases(cases, 2, &launcher, &mut AssumeYes).unwrap();
//! summary.print_summary();
//! ```
//!
//! ## Writing the run configuration
//!
//! ```no_run
//! use clawsweep::claw::{JsonSetrun, RunConfigProvider};
//! use std::path::Path;
//!
//! let mut rundata = JsonSetrun::new("setrun.json").produce().unwrap();
//! rundata.set_index("claw", "num_cells", 0, 200i64).unwrap();
//! rundata.write(Path::new("_output_mx200")).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod claw;
pub mod config;
pub mod core;
pub mod error;
pub mod fs;
pub mod interact;
pub mod progress;
pub mod sweep;
pub mod system;

// Re-export commonly used types
pub use config::CliArgs;
pub use core::{run_many_cases, Case, CaseRunner, RunSummary};
pub use error::{Result, SweepError};
pub use progress::PoolProgress;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```no_run
    //! use clawsweep::prelude::*;
    //! ```

    pub use crate::claw::{JsonSetrun, PlotCommand, Plotter, RunConfigProvider, RunData, SolverRunner};
    pub use crate::core::{
        run_many_cases, run_worker, Case, CaseRunner, CaseValue, RunSummary, SelfExecLauncher,
        WorkerAssignment, WorkerLauncher,
    };
    pub use crate::error::{Result, SweepError};
    pub use crate::fs::{prepare_dir, CaseLog};
    pub use crate::interact::{AssumeYes, LinePrompter, Prompter};
    pub use crate::progress::PoolProgress;
    pub use crate::sweep::{CaseContext, ParameterSweep, SampleSweep, SweepDriver, SweepSpec};
    pub use crate::system::CancelToken;
}
