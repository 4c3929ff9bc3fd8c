//! Process-level plumbing
//!
//! Cancellation tokens wired to POSIX signals, and supervision of child
//! processes (waiting, SIGTERM, SIGKILL).

mod cancel;
pub mod process;

pub use cancel::*;
pub use process::{terminate, wait_or_cancel, DEFAULT_GRACE, POLL_INTERVAL};
