use serde::{Deserialize, Serialize};

use super::EvaluationTask;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Running,
    Completed,
    Failed,
}

/// Lifecycle of one task within a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub task: EvaluationTask,
    pub status: TaskStatus,
    /// Unix milliseconds.
    pub started_at: i64,
    pub completed_at: Option<i64>,
    pub error: Option<String>,
}

impl TaskRecord {
    pub fn duration_ms(&self) -> Option<i64> {
        self.completed_at.map(|end| end - self.started_at)
    }
}

/// Records when each task started and how it finished.
#[derive(Debug, Default)]
pub struct TaskTracker {
    records: Vec<TaskRecord>,
}

impl TaskTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_task(&mut self, task: EvaluationTask) {
        self.records.push(TaskRecord {
            task,
            status: TaskStatus::Running,
            started_at: chrono::Utc::now().timestamp_millis(),
            completed_at: None,
            error: None,
        });
    }

    pub fn complete_task(&mut self, task: EvaluationTask) {
        if let Some(record) = self.running_mut(task) {
            record.status = TaskStatus::Completed;
            record.completed_at = Some(chrono::Utc::now().timestamp_millis());
        }
    }

    pub fn fail_task(&mut self, task: EvaluationTask, error: String) {
        if let Some(record) = self.running_mut(task) {
            record.status = TaskStatus::Failed;
            record.completed_at = Some(chrono::Utc::now().timestamp_millis());
            record.error = Some(error);
        }
    }

    fn running_mut(&mut self, task: EvaluationTask) -> Option<&mut TaskRecord> {
        self.records
            .iter_mut()
            .rev()
            .find(|r| r.task == task && r.status == TaskStatus::Running)
    }

    pub fn records(&self) -> &[TaskRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<TaskRecord> {
        self.records
    }

    /// One-line status, e.g. "2 of 3 tasks completed, 1 failed".
    pub fn summary(&self) -> String {
        let completed = self
            .records
            .iter()
            .filter(|r| r.status == TaskStatus::Completed)
            .count();
        let failed = self
            .records
            .iter()
            .filter(|r| r.status == TaskStatus::Failed)
            .count();

        let mut summary = format!(
            "{} of {} tasks completed",
            completed,
            EvaluationTask::ALL.len()
        );
        if failed > 0 {
            summary.push_str(&format!(", {} failed", failed));
        }
        summary
    }
}
