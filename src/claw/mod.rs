//! Clawpack toolkit glue
//!
//! Everything that touches the external solver toolkit: the run
//! configuration and its data-file writer, the solver executable, and the
//! plotting command.

mod plot;
mod rundata;
mod solver;

pub use plot::*;
pub use rundata::*;
pub use solver::*;
