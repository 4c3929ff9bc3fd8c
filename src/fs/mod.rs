//! Filesystem helpers
//!
//! Directory preparation with overwrite confirmation, and the per-case
//! log sink.

mod sink;
mod workspace;

pub use sink::*;
pub use workspace::*;
