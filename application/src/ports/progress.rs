//! Progress notification port
//!
//! Use cases report milestones through [`ProgressNotifier`]; the task
//! manager turns them into task transitions, and foreground runs can print
//! them directly.

/// Callback for progress updates during stage execution
pub trait ProgressNotifier: Send + Sync {
    /// Called at each milestone; `percent` is 0-100
    fn on_progress(&self, percent: u8, message: &str);
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ProgressNotifier for NoProgress {
    fn on_progress(&self, _percent: u8, _message: &str) {}
}

/// A slice of the overall progress range, e.g. the Q&A session's 20-60
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSpan {
    pub start: u8,
    pub end: u8,
}

impl ProgressSpan {
    pub fn new(start: u8, end: u8) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Percent after `done` of `total` steps
    pub fn at(&self, done: usize, total: usize) -> u8 {
        if total == 0 {
            return self.end;
        }
        let width = (self.end - self.start) as usize;
        let offset = width * done.min(total) / total;
        self.start + offset as u8
    }
}
