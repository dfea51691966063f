//! Host-facing run context: progress, cancellation and feedback
//!
//! A tool run talks to whoever launched it (a CLI, a GUI, a test) through the
//! [`Host`] trait. [`RunContext`] sits between the two, throttling progress so
//! that the host only hears about changes, and owning the cancellation flag
//! that the passes poll once per row.

use crate::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Label used when progress is reset at the end of a run.
pub const IDLE_LABEL: &str = "Progress: ";

/// Receiver of progress, feedback and completion notices.
pub trait Host {
    /// Progress with a label, `percent` in `0..=100`.
    fn update_progress(&mut self, label: &str, percent: u8);

    /// Progress without changing the label.
    fn update_percent(&mut self, percent: u8);

    /// User-facing message.
    fn show_feedback(&mut self, message: &str);

    /// Detailed error for the log/trace channel.
    fn log_exception(&mut self, context: &str, error: &Error) {
        tracing::error!(context = %context, error = %error, "run failed");
    }

    /// The run is over (successfully or not) and its resources can be reclaimed.
    fn run_complete(&mut self) {}
}

/// Host that discards everything. Feedback still reaches `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentHost;

impl Host for SilentHost {
    fn update_progress(&mut self, _label: &str, _percent: u8) {}

    fn update_percent(&mut self, _percent: u8) {}

    fn show_feedback(&mut self, message: &str) {
        tracing::debug!("{}", message);
    }
}

/// Shared cancellation flag. Clone it into whatever thread or signal handler
/// should be able to stop the run.
#[derive(Debug, Default, Clone)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Per-run context handed by reference to the passes.
pub struct RunContext<'h> {
    host: &'h mut dyn Host,
    cancel: CancelFlag,
    previous_percent: u8,
    previous_label: String,
}

impl<'h> RunContext<'h> {
    pub fn new(host: &'h mut dyn Host) -> Self {
        Self::with_cancel(host, CancelFlag::new())
    }

    pub fn with_cancel(host: &'h mut dyn Host, cancel: CancelFlag) -> Self {
        Self {
            host,
            cancel,
            previous_percent: 0,
            previous_label: String::new(),
        }
    }

    /// Report labelled progress. The host is only notified when the percent
    /// or the label differs from the last report.
    pub fn report_progress(&mut self, label: &str, percent: u8) {
        let percent = percent.min(100);
        if percent != self.previous_percent || label != self.previous_label {
            self.host.update_progress(label, percent);
        }
        self.previous_percent = percent;
        if label != self.previous_label {
            self.previous_label = label.to_string();
        }
    }

    /// Report progress under the current label.
    pub fn report_percent(&mut self, percent: u8) {
        let percent = percent.min(100);
        if percent != self.previous_percent {
            self.host.update_percent(percent);
        }
        self.previous_percent = percent;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Tell the host the run was cancelled and reset progress.
    pub fn cancel_operation(&mut self) {
        self.host.show_feedback("Operation cancelled.");
        self.report_progress(IDLE_LABEL, 0);
    }

    pub fn show_feedback(&mut self, message: &str) {
        self.host.show_feedback(message);
    }

    pub fn log_exception(&mut self, context: &str, error: &Error) {
        self.host.log_exception(context, error);
    }

    /// Reset progress and tell the host the run is complete.
    pub fn finish(&mut self) {
        self.report_progress(IDLE_LABEL, 0);
        self.host.run_complete();
    }
}

/// Percent complete after finishing `row` of `rows`, as `100 * row / (rows - 1)`.
pub fn row_percent(row: usize, rows: usize) -> u8 {
    if rows <= 1 {
        return 100;
    }
    ((100 * row) / (rows - 1)).min(100) as u8
}
