//! User interaction
//!
//! Confirmation prompts, kept behind a trait so the runner can be driven
//! from a terminal, from `--yes`, or from tests.

mod prompt;

pub use prompt::*;
