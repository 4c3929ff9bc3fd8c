//! Child process supervision
//!
//! Shared by the worker pool (worker processes) and the solver runner
//! (solver and plotting subprocesses): wait while watching a cancel token,
//! and terminate with SIGTERM first, SIGKILL after a grace period.

use super::CancelToken;
use std::io;
use std::process::{Child, ExitStatus};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Interval between child status polls
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Time a child gets to exit after SIGTERM before it is killed
pub const DEFAULT_GRACE: Duration = Duration::from_secs(5);

/// Wait for `child`, terminating it if `cancel` is tripped first.
///
/// Returns `Ok(None)` when the child was terminated because of cancellation.
pub fn wait_or_cancel(
    child: &mut Child,
    cancel: &CancelToken,
    grace: Duration,
) -> io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if cancel.wait_timeout(POLL_INTERVAL) {
            terminate(child, grace)?;
            return Ok(None);
        }
    }
}

/// Ask `child` to stop, escalating to a kill after `grace`.
pub fn terminate(child: &mut Child, grace: Duration) -> io::Result<ExitStatus> {
    if let Some(status) = child.try_wait()? {
        return Ok(status);
    }

    debug!(pid = child.id(), "sending SIGTERM");
    signal_terminate(child);

    let deadline = Instant::now() + grace;
    while Instant::now() < deadline {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        std::thread::sleep(POLL_INTERVAL.min(grace));
    }

    warn!(pid = child.id(), "process did not exit after SIGTERM, killing");
    match child.kill() {
        Ok(()) => {}
        // Already reaped between the last poll and the kill.
        Err(e) if e.kind() == io::ErrorKind::InvalidInput => {}
        Err(e) => return Err(e),
    }
    child.wait()
}

/// Send SIGTERM without waiting. Falls back to a kill off unix.
#[cfg(unix)]
pub fn signal_terminate(child: &mut Child) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    if let Err(e) = kill(Pid::from_raw(child.id() as i32), Signal::SIGTERM) {
        debug!(pid = child.id(), error = %e, "SIGTERM delivery failed");
    }
}

/// Send SIGTERM without waiting. Falls back to a kill off unix.
#[cfg(not(unix))]
pub fn signal_terminate(child: &mut Child) {
    let _ = child.kill();
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::process::Command;

    #[test]
    fn test_wait_returns_status() {
        let mut child = Command::new("sh").args(["-c", "exit 3"]).spawn().unwrap();
        let status = wait_or_cancel(&mut child, &CancelToken::new(), DEFAULT_GRACE)
            .unwrap()
            .unwrap();
        assert_eq!(status.code(), Some(3));
    }

    #[test]
    fn test_cancel_terminates_child() {
        let mut child = Command::new("sleep").arg("30").spawn().unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();

        let start = Instant::now();
        let result = wait_or_cancel(&mut child, &cancel, Duration::from_secs(2)).unwrap();
        assert!(result.is_none());
        assert!(start.elapsed() < Duration::from_secs(10));
        assert!(child.try_wait().unwrap().is_some());
    }

    #[test]
    fn test_terminate_escalates_to_kill() {
        let mut child = Command::new("sh")
            .args(["-c", "trap '' TERM; sleep 30"])
            .spawn()
            .unwrap();
        std::thread::sleep(Duration::from_millis(200));

        let status = terminate(&mut child, Duration::from_millis(300)).unwrap();
        assert!(!status.success());
    }
}
