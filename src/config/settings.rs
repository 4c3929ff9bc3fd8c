//! Command-line settings for clawsweep
//!
//! Defines the CLI and its conversion into a serializable [`SweepSpec`]
//! that the worker processes rebuild their driver from.

use crate::claw::{PlotCommand, SolverConfig};
use crate::error::Result;
use crate::sweep::{ParameterSweep, SampleSweep, SweepSpec, SweptParameter};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Environment variable consulted when NPROCS is not given
pub const NPROCS_ENV: &str = "CLAW_NPROCS";

/// clawsweep - run Clawpack parameter sweeps across worker processes
#[derive(Parser, Debug, Clone)]
#[command(name = "clawsweep")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run Clawpack parameter sweeps on several processes")]
#[command(long_about = r#"
clawsweep splits a list of cases round robin across worker processes and
runs them after asking for confirmation.

Examples:
  clawsweep sample 2                         # 7 sample cases on 2 processes
  clawsweep beta 2 --values 20,1000          # sweep probdata.beta
  clawsweep mx 3 --no-plots                  # sweep the grid resolution
  CLAW_NPROCS=4 clawsweep mx --yes           # process count from the environment
"#)]
pub struct CliArgs {
    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress progress and summary)
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the numbered sample cases, each writing case<N>.out
    Sample {
        #[command(flatten)]
        run: RunArgs,

        /// Number of cases
        #[arg(long, default_value_t = 7, value_name = "NUM")]
        count: usize,

        /// Pause between progress lines of a case, in milliseconds
        #[arg(long, default_value_t = 1000, value_name = "MS")]
        delay_ms: u64,
    },

    /// Sweep the width beta of the initial condition (probdata.beta)
    Beta {
        #[command(flatten)]
        run: RunArgs,

        #[command(flatten)]
        claw: ClawArgs,
    },

    /// Sweep the number of grid cells mx (claw.num_cells[0])
    Mx {
        #[command(flatten)]
        run: RunArgs,

        #[command(flatten)]
        claw: ClawArgs,
    },

    /// Run an assignment read from stdin (internal)
    #[command(hide = true)]
    Worker,
}

/// Options shared by every sweep
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Number of worker processes
    #[arg(value_name = "NPROCS", env = NPROCS_ENV, default_value_t = 1)]
    pub nprocs: usize,

    /// Answer yes to every confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

/// Options of the Clawpack sweeps
#[derive(Args, Debug, Clone)]
pub struct ClawArgs {
    /// Values to sweep (comma separated)
    #[arg(long, value_delimiter = ',', value_name = "LIST")]
    pub values: Vec<String>,

    /// Solver executable
    #[arg(long, default_value = "xclaw", value_name = "EXE")]
    pub xclaw: String,

    /// Base run configuration (JSON)
    #[arg(long, default_value = "setrun.json", value_name = "FILE")]
    pub setrun: PathBuf,

    /// Plotting configuration passed to the plotter
    #[arg(long, default_value = "setplot.py", value_name = "FILE")]
    pub setplot: PathBuf,

    /// Plotting program (default: python -m clawpack.visclaw.plotclaw)
    #[arg(long, value_name = "PROG")]
    pub plotter: Option<String>,

    /// Plotter argument, may use {outdir}, {plotdir} and {setplot} (repeatable)
    #[arg(long = "plotter-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub plotter_args: Vec<String>,

    /// Only prepare directories, do not run the solver
    #[arg(long)]
    pub no_run: bool,

    /// Do not make plots
    #[arg(long)]
    pub no_plots: bool,

    /// Run the solver directly, logging to the case log instead of nohup.out
    #[arg(long)]
    pub no_nohup: bool,

    /// Do not run `make .exe` first
    #[arg(long)]
    pub skip_build: bool,
}

impl ClawArgs {
    fn plot_command(&self) -> PlotCommand {
        let mut plot = PlotCommand {
            setplot: self.setplot.clone(),
            ..PlotCommand::default()
        };
        if let Some(program) = &self.plotter {
            plot.program = program.clone();
            plot.args = if self.plotter_args.is_empty() {
                vec!["{outdir}".into(), "{plotdir}".into(), "{setplot}".into()]
            } else {
                self.plotter_args.clone()
            };
        } else if !self.plotter_args.is_empty() {
            plot.args = self.plotter_args.clone();
        }
        plot
    }

    /// Build the sweep over `parameter`
    pub fn to_sweep(&self, parameter: SweptParameter) -> Result<ParameterSweep> {
        let mut sweep = ParameterSweep::new(parameter);
        if !self.values.is_empty() {
            sweep.values = self
                .values
                .iter()
                .map(|v| parameter.parse_value(v))
                .collect::<Result<_>>()?;
        }
        sweep.run_solver = !self.no_run;
        sweep.make_plots = !self.no_plots;
        sweep.build = !self.skip_build && !self.no_run;
        sweep.setrun = self.setrun.clone();
        sweep.solver = SolverConfig {
            executable: self.xclaw.clone(),
            nohup: !self.no_nohup,
        };
        sweep.plot = self.plot_command();
        Ok(sweep)
    }
}

impl Commands {
    /// Shared run options, `None` for the worker subcommand
    pub fn run_args(&self) -> Option<&RunArgs> {
        match self {
            Self::Sample { run, .. } | Self::Beta { run, .. } | Self::Mx { run, .. } => Some(run),
            Self::Worker => None,
        }
    }

    /// The sweep a parent run drives, `None` for the worker subcommand
    pub fn to_spec(&self) -> Result<Option<SweepSpec>> {
        Ok(match self {
            Self::Sample {
                count, delay_ms, ..
            } => Some(SweepSpec::Sample(SampleSweep {
                count: *count,
                delay_ms: *delay_ms,
                ..SampleSweep::default()
            })),
            Self::Beta { claw, .. } => {
                Some(SweepSpec::Parameter(claw.to_sweep(SweptParameter::Beta)?))
            }
            Self::Mx { claw, .. } => Some(SweepSpec::Parameter(claw.to_sweep(SweptParameter::Mx)?)),
            Self::Worker => None,
        })
    }
}

impl CliArgs {
    /// Global flags to forward to worker processes
    pub fn worker_args(&self) -> Vec<String> {
        (0..self.verbose).map(|_| "-v".to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CaseValue;
    use crate::error::SweepError;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("clawsweep").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_sample_defaults() {
        let args = parse(&["sample", "2"]);
        let run = args.command.run_args().unwrap();
        assert_eq!(run.nprocs, 2);
        assert!(!run.yes);

        match args.command.to_spec().unwrap() {
            Some(SweepSpec::Sample(sweep)) => {
                assert_eq!(sweep.count, 7);
                assert_eq!(sweep.delay_ms, 1000);
            }
            other => panic!("unexpected spec {:?}", other),
        }
    }

    #[test]
    fn test_mx_values() {
        let args = parse(&["mx", "3", "--values", "50,75", "--no-plots", "-y"]);
        assert!(args.command.run_args().unwrap().yes);

        match args.command.to_spec().unwrap() {
            Some(SweepSpec::Parameter(sweep)) => {
                assert_eq!(sweep.parameter, SweptParameter::Mx);
                assert_eq!(sweep.values, vec![CaseValue::Int(50), CaseValue::Int(75)]);
                assert!(!sweep.make_plots);
                assert!(sweep.run_solver);
                assert!(sweep.solver.nohup);
            }
            other => panic!("unexpected spec {:?}", other),
        }
    }

    #[test]
    fn test_invalid_mx_value() {
        let args = parse(&["mx", "--values=-5"]);
        assert!(matches!(args.command.to_spec(), Err(SweepError::Config(_))));
    }

    #[test]
    fn test_custom_plotter() {
        let args = parse(&["beta", "--plotter", "plotclaw", "--setplot", "my_setplot.py"]);
        match args.command.to_spec().unwrap() {
            Some(SweepSpec::Parameter(sweep)) => {
                assert_eq!(sweep.plot.program, "plotclaw");
                assert_eq!(sweep.plot.args, vec!["{outdir}", "{plotdir}", "{setplot}"]);
                assert_eq!(sweep.plot.setplot, PathBuf::from("my_setplot.py"));
            }
            other => panic!("unexpected spec {:?}", other),
        }
    }

    #[test]
    fn test_worker_args_forward_verbosity() {
        let args = parse(&["-vv", "sample"]);
        assert_eq!(args.worker_args(), vec!["-v", "-v"]);
        assert!(args.command.run_args().is_some());
        assert!(matches!(parse(&["worker"]).command, Commands::Worker));
    }

    #[test]
    fn test_nprocs_zero_is_parsed() {
        // Rejected later, when the cases are partitioned.
        let args = parse(&["sample", "0"]);
        assert_eq!(args.command.run_args().unwrap().nprocs, 0);
    }
}
