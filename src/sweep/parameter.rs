//! Single-parameter Clawpack sweeps
//!
//! Each value of the swept parameter becomes one case with its own output
//! directory, plot directory and log. Running a case writes the run
//! configuration with that value applied, runs the solver, then plots.

use super::{CaseContext, SweepDriver};
use crate::claw::{
    build_executable, DataValue, JsonSetrun, PlotCommand, Plotter, RunConfigProvider, RunData,
    SolverConfig, SolverRunner,
};
use crate::core::{Case, CaseValue};
use crate::error::{IoResultExt, Result, SweepError};
use crate::fs::prepare_dir;
use crate::interact::Prompter;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

/// The parameter a sweep varies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SweptParameter {
    /// Width of the Gaussian initial condition, `probdata.beta`
    Beta,
    /// Number of grid cells, `claw.num_cells[0]`
    Mx,
}

impl SweptParameter {
    /// Case key and directory-name stem
    pub fn key(&self) -> &'static str {
        match self {
            Self::Beta => "beta",
            Self::Mx => "mx",
        }
    }

    /// Values swept when none are given
    pub fn default_values(&self) -> Vec<CaseValue> {
        match self {
            Self::Beta => vec![CaseValue::Int(20), CaseValue::Int(1000)],
            Self::Mx => vec![CaseValue::Int(100), CaseValue::Int(200), CaseValue::Int(400)],
        }
    }

    /// Parse a command-line value, integer first
    pub fn parse_value(&self, text: &str) -> Result<CaseValue> {
        let text = text.trim();
        let value = if let Ok(i) = text.parse::<i64>() {
            CaseValue::Int(i)
        } else if let Ok(x) = text.parse::<f64>() {
            CaseValue::Float(x)
        } else {
            return Err(SweepError::config(format!(
                "invalid {} value '{}'",
                self.key(),
                text
            )));
        };
        self.validate(&value)?;
        Ok(value)
    }

    /// Check that `value` makes sense for this parameter
    pub fn validate(&self, value: &CaseValue) -> Result<()> {
        match (self, value) {
            (Self::Mx, CaseValue::Int(n)) if *n > 0 => Ok(()),
            (Self::Mx, other) => Err(SweepError::config(format!(
                "mx must be a positive integer, got {}",
                other
            ))),
            (Self::Beta, CaseValue::Int(_)) => Ok(()),
            (Self::Beta, CaseValue::Float(x)) if x.is_finite() => Ok(()),
            (Self::Beta, other) => Err(SweepError::config(format!(
                "beta must be a number, got {}",
                other
            ))),
        }
    }

    /// Apply the case's value to the run configuration
    pub fn apply(&self, rundata: &mut RunData, case: &Case) -> Result<()> {
        match self {
            Self::Beta => {
                let beta = match case.get("beta") {
                    Some(CaseValue::Int(i)) => DataValue::Float(*i as f64),
                    _ => DataValue::Float(case.float("beta")?),
                };
                rundata.set("probdata", "beta", beta);
                Ok(())
            }
            Self::Mx => rundata.set_index("claw", "num_cells", 0, case.int("mx")?),
        }
    }
}

/// Sweep over one parameter of a Clawpack run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSweep {
    /// Parameter being varied
    pub parameter: SweptParameter,
    /// Values, one case each
    pub values: Vec<CaseValue>,
    /// Run the solver for each case
    pub run_solver: bool,
    /// Make plots for each case
    pub make_plots: bool,
    /// Build the solver with `make .exe` before running
    pub build: bool,
    /// Base run configuration file
    pub setrun: PathBuf,
    /// Solver invocation
    pub solver: SolverConfig,
    /// Plotting command
    pub plot: PlotCommand,
    /// Directory holding output/plot directories and logs
    pub base_dir: PathBuf,
}

impl ParameterSweep {
    /// Sweep `parameter` over its default values with default settings
    pub fn new(parameter: SweptParameter) -> Self {
        Self {
            parameter,
            values: parameter.default_values(),
            run_solver: true,
            make_plots: true,
            build: true,
            setrun: PathBuf::from("setrun.json"),
            solver: SolverConfig::default(),
            plot: PlotCommand::default(),
            base_dir: PathBuf::from("."),
        }
    }

    fn case_for(&self, value: &CaseValue) -> Case {
        let key = self.parameter.key();
        let dir = |name: String| self.base_dir.join(name).display().to_string();
        Case::new()
            .with(key, value.clone())
            .with("outdir", dir(format!("_output_{}{}", key, value)))
            .with("plotdir", dir(format!("_plots_{}{}", key, value)))
            .with("log", dir(format!("run_{}{}.output", key, value)))
    }

    /// Run one case with an explicit configuration provider and plotter
    pub fn run_case_with(
        &self,
        case: &Case,
        ctx: &mut CaseContext<'_>,
        provider: &dyn RunConfigProvider,
        plotter: &dyn Plotter,
    ) -> Result<()> {
        let outdir = case.path("outdir")?;
        let plotdir = case.path("plotdir")?;

        if self.run_solver {
            if let Some(path) = self.solver.output_file(&outdir) {
                println!("Solver output from this run will go to {}", path.display());
            }
            ensure_dir(&outdir)?;

            let mut rundata = provider.produce()?;
            self.parameter.apply(&mut rundata, case)?;
            let written = rundata.write(&outdir)?;
            ctx.log.line(format!(
                "Wrote {} data files to {}",
                written.len(),
                outdir.display()
            ))?;

            SolverRunner::new(self.solver.clone()).run(&outdir, ctx.log, ctx.cancel)?;
        }

        if self.make_plots {
            ensure_dir(&plotdir)?;
            plotter.plot(&outdir, &plotdir, case, ctx.log, ctx.cancel)?;
        }

        Ok(())
    }
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        let missing = std::io::Error::new(std::io::ErrorKind::NotFound, "directory does not exist");
        std::io::Result::<()>::Err(missing).with_path(dir)
    }
}

impl SweepDriver for ParameterSweep {
    fn name(&self) -> &str {
        self.parameter.key()
    }

    fn before_run(&self) -> Result<()> {
        info!("run_solver = {}", self.run_solver);
        info!("make_plots = {}", self.make_plots);
        if self.run_solver && self.build {
            build_executable(&self.base_dir)?;
        }
        Ok(())
    }

    fn make_all_cases(&self) -> Result<Vec<Case>> {
        if self.values.is_empty() {
            return Err(SweepError::config(format!(
                "no {} values to sweep",
                self.parameter.key()
            )));
        }
        let mut seen = HashSet::with_capacity(self.values.len());
        self.values
            .iter()
            .map(|value| {
                self.parameter.validate(value)?;
                let case = self.case_for(value);
                // Cases must not share output directories.
                if !seen.insert(case.str("outdir")?.to_string()) {
                    return Err(SweepError::config(format!(
                        "{} value {} repeats an earlier value",
                        self.parameter.key(),
                        value
                    )));
                }
                Ok(case)
            })
            .collect()
    }

    fn prepare_case(&self, case: &Case, prompter: &mut dyn Prompter) -> Result<()> {
        if self.run_solver {
            prepare_dir(&case.path("outdir")?, prompter)?;
        }
        if self.make_plots {
            prepare_dir(&case.path("plotdir")?, prompter)?;
        }
        Ok(())
    }

    fn run_one_case(&self, case: &Case, ctx: &mut CaseContext<'_>) -> Result<()> {
        let provider = JsonSetrun::new(&self.setrun);
        self.run_case_with(case, ctx, &provider, &self.plot)
    }
}
