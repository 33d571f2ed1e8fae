//! Runs the three evaluation tasks in order against one uploaded file.

mod tracker;

pub use tracker::{TaskRecord, TaskStatus, TaskTracker};

use serde::{Deserialize, Serialize};

use crate::ai::completion::{CompletionError, CompletionStrategy, TaskContext};
use crate::ai::prompts::PromptSet;
use crate::ai::types::RemoteFile;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationTask {
    GenerateTranscript,
    FactualCorrectness,
    Plausibility,
}

impl EvaluationTask {
    pub const ALL: [EvaluationTask; 3] = [
        Self::GenerateTranscript,
        Self::FactualCorrectness,
        Self::Plausibility,
    ];

    pub fn number(&self) -> usize {
        match self {
            Self::GenerateTranscript => 1,
            Self::FactualCorrectness => 2,
            Self::Plausibility => 3,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::GenerateTranscript => "Generating MDT Transcript",
            Self::FactualCorrectness => "Evaluating Factual Correctness",
            Self::Plausibility => "Evaluating Plausibility",
        }
    }

    /// Heading printed above the task's output.
    pub fn heading(&self) -> &'static str {
        match self {
            Self::GenerateTranscript => "GENERATED TRANSCRIPT",
            Self::FactualCorrectness => "FACTUAL CORRECTNESS FEEDBACK",
            Self::Plausibility => "PLAUSIBILITY FEEDBACK",
        }
    }
}

/// Receives task progress as the pipeline runs.
pub trait TaskObserver: Send {
    fn task_started(&mut self, _task: EvaluationTask) {}

    fn task_completed(&mut self, _task: EvaluationTask, _output: &str) {}

    fn task_failed(&mut self, _task: EvaluationTask, _error: &CompletionError) {}
}

/// Observer that ignores everything.
pub struct NoopObserver;

impl TaskObserver for NoopObserver {}

/// Outputs of a full run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub transcript: String,
    pub factual_feedback: String,
    pub plausibility_feedback: String,
    pub tasks: Vec<TaskRecord>,
}

/// Sequences transcript generation and the two evaluations.
pub struct EvaluationPipeline {
    prompts: PromptSet,
}

impl EvaluationPipeline {
    pub fn new(prompts: PromptSet) -> Self {
        Self { prompts }
    }

    pub fn prompts(&self) -> &PromptSet {
        &self.prompts
    }

    /// Run all three tasks. Any failure aborts the run; earlier outputs are
    /// only available through the observer.
    pub async fn run(
        &self,
        strategy: &dyn CompletionStrategy,
        file: &RemoteFile,
        observer: &mut dyn TaskObserver,
    ) -> Result<EvaluationReport, CompletionError> {
        let mut tracker = TaskTracker::new();

        let transcript = Self::run_task(
            strategy,
            EvaluationTask::GenerateTranscript,
            self.prompts.transcript_prompt(),
            TaskContext::with_file(file),
            &mut tracker,
            observer,
        )
        .await?;

        let factual_feedback = Self::run_task(
            strategy,
            EvaluationTask::FactualCorrectness,
            &self.prompts.factual_prompt(&transcript),
            TaskContext::with_file(file),
            &mut tracker,
            observer,
        )
        .await?;

        // Plausibility is judged on the transcript alone.
        let plausibility_feedback = Self::run_task(
            strategy,
            EvaluationTask::Plausibility,
            &self.prompts.plausibility_prompt(&transcript),
            TaskContext::text_only(),
            &mut tracker,
            observer,
        )
        .await?;

        tracing::info!("{}", tracker.summary());

        Ok(EvaluationReport {
            transcript,
            factual_feedback,
            plausibility_feedback,
            tasks: tracker.into_records(),
        })
    }

    async fn run_task(
        strategy: &dyn CompletionStrategy,
        task: EvaluationTask,
        prompt: &str,
        context: TaskContext<'_>,
        tracker: &mut TaskTracker,
        observer: &mut dyn TaskObserver,
    ) -> Result<String, CompletionError> {
        tracker.start_task(task);
        observer.task_started(task);

        match strategy.execute(prompt, &context).await {
            Ok(output) => {
                tracker.complete_task(task);
                observer.task_completed(task, &output);
                Ok(output)
            }
            Err(e) => {
                tracing::error!("Task {} failed: {}", task.number(), e);
                tracker.fail_task(task, e.to_string());
                observer.task_failed(task, &e);
                Err(e)
            }
        }
    }
}
