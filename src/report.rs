//! Console output for task progress and results.

use std::io::Write;

use crate::ai::completion::CompletionError;
use crate::pipeline::{EvaluationTask, TaskObserver};

const SEPARATOR_WIDTH: usize = 50;

/// Prints each task's heading and output as soon as it completes.
pub struct ConsoleReporter<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            tracing::warn!("Failed to write report output: {}", e);
        }
    }
}

impl ConsoleReporter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> TaskObserver for ConsoleReporter<W> {
    fn task_started(&mut self, task: EvaluationTask) {
        self.write(&format!(
            "\n--- Task {}: {} ---\n",
            task.number(),
            task.display_name()
        ));
    }

    fn task_completed(&mut self, task: EvaluationTask, output: &str) {
        self.write(&format!(
            "\n[{}]\n{}\n\n{}\n",
            task.heading(),
            output,
            "=".repeat(SEPARATOR_WIDTH)
        ));
    }

    fn task_failed(&mut self, task: EvaluationTask, error: &CompletionError) {
        tracing::debug!("Task {} reported failure: {}", task.number(), error);
    }
}
