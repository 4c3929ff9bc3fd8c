//! Sample sweep
//!
//! Numbered cases that only write a few lines to their own output file,
//! useful for trying out the runner without a solver.

use super::{CaseContext, SweepDriver};
use crate::core::Case;
use crate::error::{Result, SweepError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Cases `num = 0..count`, each writing `case<num>.out`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleSweep {
    /// Number of cases
    pub count: usize,
    /// Pause between progress lines, in milliseconds
    pub delay_ms: u64,
    /// Directory the case files are written to
    pub output_dir: PathBuf,
}

impl Default for SampleSweep {
    fn default() -> Self {
        Self {
            count: 7,
            delay_ms: 1000,
            output_dir: PathBuf::from("."),
        }
    }
}

impl SweepDriver for SampleSweep {
    fn name(&self) -> &str {
        "sample"
    }

    fn make_all_cases(&self) -> Result<Vec<Case>> {
        Ok((0..self.count)
            .map(|num| {
                let log = self.output_dir.join(format!("case{}.out", num));
                Case::new()
                    .with("num", num)
                    .with("log", log.display().to_string())
            })
            .collect())
    }

    fn run_one_case(&self, case: &Case, ctx: &mut CaseContext<'_>) -> Result<()> {
        let num = case.int("num")?;
        let delay = Duration::from_millis(self.delay_ms);
        println!("Sample job... now running case {}", num);

        ctx.log.line(format!("Working on case {}", num))?;
        if ctx.cancel.wait_timeout(delay) {
            return Err(SweepError::Cancelled);
        }
        ctx.log.line(format!("Still working on case {}", num))?;
        if ctx.cancel.wait_timeout(delay) {
            return Err(SweepError::Cancelled);
        }
        ctx.log.line(format!("Done with case {}", num))?;

        Ok(())
    }
}
