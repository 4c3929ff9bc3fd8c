//! Sweep drivers
//!
//! The sample sweep and the single-parameter Clawpack sweeps, behind the
//! common [`SweepDriver`] trait.

mod driver;
mod parameter;
mod sample;

pub use driver::*;
pub use parameter::*;
pub use sample::*;
