//! Output directory preparation
//!
//! Every case writes into its own output and plot directories. Existing
//! directories are only clobbered after the user agrees.

use crate::error::{IoResultExt, Result, SweepError};
use crate::interact::Prompter;
use std::path::{Path, PathBuf};
use tracing::info;

/// What `prepare_dir` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirOutcome {
    /// The directory did not exist and was created
    Created,
    /// The directory existed and was replaced by an empty one
    Replaced,
}

/// Create `dir` fresh, asking before removing an existing one.
///
/// A negative answer aborts and leaves the existing directory untouched.
pub fn prepare_dir(dir: &Path, prompter: &mut dyn Prompter) -> Result<DirOutcome> {
    let outcome = if dir.exists() {
        let question = format!("\n{} already exists, ok to overwrite?", display_abs(dir).display());
        if !prompter.confirm(&question)? {
            return Err(SweepError::Aborted(format!(
                "not overwriting {}",
                dir.display()
            )));
        }
        if dir.is_dir() {
            std::fs::remove_dir_all(dir).with_path(dir)?;
        } else {
            std::fs::remove_file(dir).with_path(dir)?;
        }
        DirOutcome::Replaced
    } else {
        DirOutcome::Created
    };

    std::fs::create_dir_all(dir).with_path(dir)?;
    info!("Created directory {}", dir.display());

    Ok(outcome)
}

fn display_abs(dir: &Path) -> PathBuf {
    std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf())
}
