//! Configuration module for clawsweep
//!
//! Command-line arguments and their translation into sweep settings.

mod settings;

pub use settings::*;
