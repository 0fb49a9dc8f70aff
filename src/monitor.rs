//! Progress reporting and cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Receives progress from a running generation and may request its cancellation.
///
/// Cancellation is cooperative: it is only observed between two solver episodes.
pub trait Monitor {
    /// One unit of work (a solver episode) has finished.
    fn report_step(&mut self);

    /// Total amount of work, `None` while it is not known yet.
    fn set_total(&mut self, _total: Option<u64>) {}

    fn is_cancelled(&self) -> bool {
        false
    }
}

impl<M: Monitor + ?Sized> Monitor for &mut M {
    fn report_step(&mut self) {
        (**self).report_step()
    }

    fn set_total(&mut self, total: Option<u64>) {
        (**self).set_total(total)
    }

    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

/// Ignores progress, never cancels.
#[derive(Debug, Default, Copy, Clone)]
pub struct NullMonitor;

impl Monitor for NullMonitor {
    fn report_step(&mut self) {}
}

/// Shared cancellation flag.
///
/// Clones refer to the same flag, so a token can be handed to another thread.
#[derive(Debug, Default, Clone)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Logs progress through `log::info!` at most once per interval.
#[derive(Debug)]
pub struct ConsoleMonitor {
    label: String,
    steps: u64,
    total: Option<u64>,
    interval: Duration,
    last_report: Instant,
    token: Option<CancelToken>,
}

impl ConsoleMonitor {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            steps: 0,
            total: None,
            interval: Duration::from_secs(1),
            last_report: Instant::now(),
            token: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.token = Some(token);
        self
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    fn log_progress(&self) {
        match self.total {
            Some(total) if total > 0 => log::info!(
                "{}: {}/{} ({:.1}%)",
                self.label,
                self.steps,
                total,
                100.0 * self.steps as f64 / total as f64
            ),
            _ => log::info!("{}: {} steps", self.label, self.steps),
        }
    }
}

impl Monitor for ConsoleMonitor {
    fn report_step(&mut self) {
        self.steps += 1;
        if self.last_report.elapsed() >= self.interval {
            self.last_report = Instant::now();
            self.log_progress();
        }
    }

    fn set_total(&mut self, total: Option<u64>) {
        self.total = total;
    }

    fn is_cancelled(&self) -> bool {
        self.token.as_ref().is_some_and(CancelToken::is_cancelled)
    }
}

impl Drop for ConsoleMonitor {
    fn drop(&mut self) {
        self.log_progress();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());
        token.cancel();
        assert!(other.is_cancelled());
    }

    #[test]
    fn test_console_monitor_counts() {
        let token = CancelToken::new();
        let mut monitor = ConsoleMonitor::new("test").with_cancel_token(token.clone());
        monitor.set_total(Some(2));
        monitor.report_step();
        monitor.report_step();
        assert_eq!(monitor.steps(), 2);
        assert!(!monitor.is_cancelled());
        token.cancel();
        assert!(monitor.is_cancelled());
    }
}
