//! Worker progress reporter
//!
//! An indicatif spinner in the parent while the workers run, counting
//! finished and failed workers.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Progress of a worker pool
pub struct PoolProgress {
    bar: ProgressBar,
    total: AtomicUsize,
    finished: AtomicUsize,
    failed: AtomicUsize,
    enabled: AtomicBool,
}

impl PoolProgress {
    /// Create a visible reporter
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg} [{elapsed_precise}]") {
            bar.set_style(style);
        }

        Self {
            bar,
            total: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            enabled: AtomicBool::new(true),
        }
    }

    /// Create a disabled reporter (for quiet mode)
    pub fn disabled() -> Self {
        let reporter = Self::new();
        reporter.enabled.store(false, Ordering::SeqCst);
        reporter.bar.set_draw_target(ProgressDrawTarget::hidden());
        reporter
    }

    /// Visible unless `quiet` or stdout is not a terminal
    pub fn for_terminal(quiet: bool) -> Self {
        if quiet || !console::Term::stdout().is_term() {
            Self::disabled()
        } else {
            Self::new()
        }
    }

    /// Start counting `total` workers
    pub fn start(&self, total: usize) {
        self.total.store(total, Ordering::Relaxed);
        if self.is_enabled() {
            self.bar.enable_steady_tick(Duration::from_millis(120));
        }
        self.refresh();
    }

    /// Record that a worker exited
    pub fn worker_finished(&self, success: bool) {
        self.finished.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        self.refresh();
    }

    fn refresh(&self) {
        self.bar.set_message(self.message());
    }

    fn message(&self) -> String {
        let failed = self.failed();
        let mut msg = format!("{}/{} workers finished", self.finished(), self.total());
        if failed > 0 {
            msg.push_str(&format!(", {} failed", failed));
        }
        msg
    }

    /// Stop the spinner
    pub fn finish(&self) {
        if self.failed() > 0 {
            self.bar.abandon_with_message(format!("✗ {}", self.message()));
        } else {
            self.bar.finish_with_message(format!("✓ {}", self.message()));
        }
    }

    /// Workers expected
    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    /// Workers that exited
    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::Relaxed)
    }

    /// Workers that exited unsuccessfully
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }

    /// Check if progress is drawn
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }
}

impl Default for PoolProgress {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_progress_counts() {
        let progress = PoolProgress::disabled();
        progress.start(3);
        progress.worker_finished(true);
        progress.worker_finished(false);

        assert_eq!(progress.total(), 3);
        assert_eq!(progress.finished(), 2);
        assert_eq!(progress.failed(), 1);
        assert_eq!(progress.message(), "2/3 workers finished, 1 failed");
        assert!(!progress.is_enabled());
        progress.finish();
    }

    #[test]
    fn test_quiet_is_disabled() {
        assert!(!PoolProgress::for_terminal(true).is_enabled());
    }
}
