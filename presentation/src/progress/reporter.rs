//! Progress reporting for stage execution
//!
//! The CLI watches its own task through the same snapshot + delta feed the
//! WebSocket uses, and renders each event here.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use pipeline_application::TaskWatch;
use pipeline_domain::{ProgressEvent, ProgressEventKind, Stage};

/// Something that renders task progress events
pub trait ProgressView: Send + Sync {
    fn on_event(&self, event: &ProgressEvent);
}

/// Reports progress with a single percentage bar
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    pub fn new(stage: Stage) -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(Self::style());
        bar.set_prefix(stage.display_name());
        bar.set_message("Waiting...");
        Self { bar }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .map(|style| style.progress_chars("=>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
    }
}

impl ProgressView for ProgressReporter {
    fn on_event(&self, event: &ProgressEvent) {
        self.bar.set_position(u64::from(event.progress));
        match event.kind {
            ProgressEventKind::Complete => {
                self.bar
                    .finish_with_message(format!("{}", event.message.as_str().green()));
            }
            ProgressEventKind::Error => {
                let error = event.error.as_deref().unwrap_or(&event.message);
                self.bar.abandon_with_message(format!("{}", error.red()));
            }
            ProgressEventKind::Progress | ProgressEventKind::Ack => {
                self.bar.set_message(event.message.clone());
            }
        }
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl ProgressView for SimpleProgress {
    fn on_event(&self, event: &ProgressEvent) {
        match event.kind {
            ProgressEventKind::Complete => {
                println!("  {} {}", "v".green(), event.message);
            }
            ProgressEventKind::Error => {
                println!(
                    "  {} {}",
                    "x".red(),
                    event.error.as_deref().unwrap_or(&event.message)
                );
            }
            ProgressEventKind::Progress | ProgressEventKind::Ack => {
                println!("{} [{:>3}%] {}", "->".cyan(), event.progress, event.message);
            }
        }
    }
}

/// Renders nothing (for `--quiet`)
pub struct NoProgressView;

impl ProgressView for NoProgressView {
    fn on_event(&self, _event: &ProgressEvent) {}
}

/// Render every event of a watched task until it finishes.
///
/// Returns the terminal event, or the last event seen if the feed closed
/// without one.
pub async fn follow(watch: TaskWatch, view: &dyn ProgressView) -> ProgressEvent {
    let ack = watch.ack();
    view.on_event(&ack);

    if let Some(terminal) = watch.snapshot.terminal_event() {
        view.on_event(&terminal);
        return terminal;
    }

    let mut last = ack;
    if let Some(mut updates) = watch.updates {
        while let Some(event) = updates.next().await {
            view.on_event(&event);
            let done = event.is_terminal();
            last = event;
            if done {
                break;
            }
        }
    }
    last
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_application::TaskManager;
    use pipeline_domain::TaskEvent;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recording(Mutex<Vec<(ProgressEventKind, u8)>>);

    impl ProgressView for Recording {
        fn on_event(&self, event: &ProgressEvent) {
            self.0.lock().unwrap().push((event.kind, event.progress));
        }
    }

    #[tokio::test]
    async fn test_follow_renders_until_complete() {
        let manager = Arc::new(TaskManager::default());
        let task = manager.create(Stage::Requirements);
        let watch = manager.watch(task.id()).unwrap();

        let driver = Arc::clone(&manager);
        let id = task.id().clone();
        tokio::spawn(async move {
            driver.transition(&id, TaskEvent::start("go")).unwrap();
            driver.transition(&id, TaskEvent::progress(80, "Generating")).unwrap();
            driver
                .transition(&id, TaskEvent::complete("done", serde_json::json!({})))
                .unwrap();
        });

        let view = Recording::default();
        let terminal = follow(watch, &view).await;

        assert_eq!(terminal.kind, ProgressEventKind::Complete);
        let seen = view.0.lock().unwrap().clone();
        assert_eq!(seen.first(), Some(&(ProgressEventKind::Ack, 0)));
        assert_eq!(seen.last(), Some(&(ProgressEventKind::Complete, 100)));
        assert!(seen.windows(2).all(|w| w[0].1 <= w[1].1));
    }

    #[tokio::test]
    async fn test_follow_finished_task_returns_immediately() {
        let manager = TaskManager::default();
        let task = manager.create(Stage::Design);
        manager.transition(task.id(), TaskEvent::start("go")).unwrap();
        manager
            .transition(task.id(), TaskEvent::fail("missing requirements"))
            .unwrap();

        let view = Recording::default();
        let terminal = follow(manager.watch(task.id()).unwrap(), &view).await;

        assert_eq!(terminal.kind, ProgressEventKind::Error);
        assert_eq!(terminal.error.as_deref(), Some("missing requirements"));
        assert_eq!(view.0.lock().unwrap().len(), 2);
    }
}
