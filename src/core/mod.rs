//! Core fan-out module
//!
//! Cases, their round-robin partition across workers, the worker process
//! pool in the parent and the worker entry point in the children.

mod case;
mod pool;
mod scheduler;
mod worker;

pub use case::*;
pub use pool::*;
pub use scheduler::*;
pub use worker::*;
