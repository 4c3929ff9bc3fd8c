//! Progress reporting module
//!
//! Shows how many worker processes have finished while the parent waits.

mod reporter;

pub use reporter::*;
