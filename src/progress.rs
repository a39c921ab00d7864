//! Observational progress notifications emitted while files are extracted.

/// Receives `(completed, total, label)` after each file finishes.
///
/// Purely for reporting; the coordinator never reads anything back.
pub trait ProgressSink {
    fn on_progress(&self, completed: usize, total: usize, label: &str);
}

/// Discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&self, _completed: usize, _total: usize, _label: &str) {}
}

/// Forwards notifications to `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn on_progress(&self, completed: usize, total: usize, label: &str) {
        let percent = if total == 0 {
            100.0
        } else {
            completed as f64 / total as f64 * 100.0
        };
        tracing::info!(
            target = "simlog::extract",
            completed,
            total,
            percent = (percent * 10.0).round() / 10.0,
            "{label}"
        );
    }
}

impl<F> ProgressSink for F
where
    F: Fn(usize, usize, &str),
{
    fn on_progress(&self, completed: usize, total: usize, label: &str) {
        self(completed, total, label);
    }
}
