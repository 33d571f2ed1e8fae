use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use super::{CompletionError, CompletionStrategy, TaskContext};
use crate::ai::openai::{AssistantApi, CreateMessageRequest};
use crate::ai::types::{ConversationThread, RunStatus};

/// Sleep between run status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Upper bound on how long a single run may take.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(600);

/// Limits for the run poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    /// `None` waits forever.
    pub max_wait: Option<Duration>,
    /// `None` places no cap on status checks.
    pub max_polls: Option<u32>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_wait: Some(DEFAULT_MAX_WAIT),
            max_polls: None,
        }
    }
}

impl PollConfig {
    fn polls_exhausted(&self, polls: u32) -> bool {
        self.max_polls.is_some_and(|max| polls >= max)
    }
}

/// Assistant thread + run, polled until the run reaches a terminal status.
///
/// Calls must not overlap: each one appends a message to the shared thread
/// and reads back the latest message once its run completes.
pub struct PollingStrategy<A: AssistantApi> {
    api: Arc<A>,
    assistant_id: String,
    thread: ConversationThread,
    poll: PollConfig,
    /// Files already attached to the thread.
    attached: Mutex<HashSet<String>>,
}

impl<A: AssistantApi> PollingStrategy<A> {
    pub fn new(api: Arc<A>, assistant_id: String, thread: ConversationThread) -> Self {
        Self {
            api,
            assistant_id,
            thread,
            poll: PollConfig::default(),
            attached: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn thread(&self) -> &ConversationThread {
        &self.thread
    }

    /// Build the user message, attaching the file only the first time it is offered.
    fn message_for(&self, prompt: &str, context: &TaskContext<'_>) -> CreateMessageRequest {
        let request = CreateMessageRequest::user(prompt);
        let Some(file) = context.attachment else {
            return request;
        };

        let newly_attached = match self.attached.lock() {
            Ok(mut attached) => attached.insert(file.id.clone()),
            Err(poisoned) => poisoned.into_inner().insert(file.id.clone()),
        };

        if newly_attached {
            request.with_file(&file.id)
        } else {
            request
        }
    }

    /// Poll the run until it completes, fails, or the limits are hit.
    ///
    /// `max_wait` is a hard deadline: a status fetch still in flight when it
    /// passes is abandoned, and the last sleep is cut short to end on it.
    async fn wait_for_run(&self, run_id: &str, initial: RunStatus) -> Result<(), CompletionError> {
        tracing::info!("Run started (ID: {}). Waiting for completion...", run_id);
        tracing::debug!("Run {} created with status {}", run_id, initial);

        let started = Instant::now();
        let deadline = self.poll.max_wait.map(|max| started + max);
        let mut polls: u32 = 0;

        loop {
            let fetch = self.api.retrieve_run(&self.thread.id, run_id);
            let run = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, fetch).await {
                    Ok(run) => run?,
                    Err(_) => {
                        tracing::error!(
                            "Run {} status check did not return before the deadline",
                            run_id
                        );
                        return Err(self.give_up(run_id, polls, started).await);
                    }
                },
                None => fetch.await?,
            };
            polls += 1;
            tracing::debug!("Run {} status check {}: {}", run_id, polls, run.status);

            if run.status == RunStatus::Completed {
                tracing::info!("Run completed.");
                return Ok(());
            }

            if run.status.is_fatal() {
                match &run.last_error {
                    Some(e) => tracing::error!(
                        "Run failed with status: {} ({}: {})",
                        run.status,
                        e.code,
                        e.message
                    ),
                    None => tracing::error!("Run failed with status: {}", run.status),
                }
                return Err(CompletionError::RunStatus(run.status));
            }

            let now = Instant::now();
            let nap = match deadline {
                Some(deadline) if now >= deadline => None,
                Some(deadline) => Some(self.poll.interval.min(deadline - now)),
                None => Some(self.poll.interval),
            };

            match nap {
                Some(nap) if !self.poll.polls_exhausted(polls) => tokio::time::sleep(nap).await,
                _ => {
                    tracing::error!(
                        "Run {} still {} after {} checks, giving up",
                        run_id,
                        run.status,
                        polls
                    );
                    return Err(self.give_up(run_id, polls, started).await);
                }
            }
        }
    }

    /// Cancel the run best-effort and build the timeout error.
    async fn give_up(&self, run_id: &str, polls: u32, started: Instant) -> CompletionError {
        let waited = started.elapsed();
        match tokio::time::timeout(
            self.poll.interval,
            self.api.cancel_run(&self.thread.id, run_id),
        )
        .await
        {
            Ok(Ok(_)) => tracing::debug!("Cancelled run {}", run_id),
            Ok(Err(e)) => tracing::warn!("Failed to cancel run {}: {}", run_id, e),
            Err(_) => tracing::warn!("Cancelling run {} timed out", run_id),
        }
        CompletionError::Timeout { polls, waited }
    }
}

#[async_trait]
impl<A: AssistantApi> CompletionStrategy for PollingStrategy<A> {
    async fn execute(
        &self,
        prompt: &str,
        context: &TaskContext<'_>,
    ) -> Result<String, CompletionError> {
        let message = self.message_for(prompt, context);
        self.api.create_message(&self.thread.id, &message).await?;

        let run = self
            .api
            .create_run(&self.thread.id, &self.assistant_id)
            .await?;
        self.wait_for_run(&run.id, run.status).await?;

        let latest = self.api.latest_message(&self.thread.id).await?;
        latest
            .as_ref()
            .and_then(|m| m.first_text())
            .map(str::to_string)
            .ok_or_else(|| {
                CompletionError::EmptyResponse(format!(
                    "no text in latest message of thread {}",
                    self.thread.id
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::openai::{
        Assistant, CreateAssistantRequest, FileObject, MessageContent, OpenAiError, Run,
        TextContent, Thread, ThreadMessage,
    };
    use crate::ai::types::RemoteFile;
    use std::collections::VecDeque;
    use std::path::Path;

    /// Scripted Assistants API: each run replays `statuses`.
    struct ScriptedApi {
        statuses: Mutex<VecDeque<RunStatus>>,
        /// Status fetches never return.
        stalled: bool,
        reply: String,
        retrieve_calls: Mutex<u32>,
        cancel_calls: Mutex<u32>,
        messages: Mutex<Vec<CreateMessageRequest>>,
    }

    impl ScriptedApi {
        fn new(statuses: &[RunStatus], reply: &str) -> Self {
            Self {
                statuses: Mutex::new(statuses.iter().copied().collect()),
                stalled: false,
                reply: reply.to_string(),
                retrieve_calls: Mutex::new(0),
                cancel_calls: Mutex::new(0),
                messages: Mutex::new(Vec::new()),
            }
        }

        fn stalled() -> Self {
            Self {
                stalled: true,
                ..Self::new(&[], "unused")
            }
        }
    }

    #[async_trait]
    impl AssistantApi for ScriptedApi {
        async fn upload_file(&self, _: &Path) -> Result<FileObject, OpenAiError> {
            unreachable!("strategy never uploads")
        }

        async fn delete_file(&self, _: &str) -> Result<(), OpenAiError> {
            unreachable!("strategy never deletes files")
        }

        async fn create_assistant(
            &self,
            _: &CreateAssistantRequest,
        ) -> Result<Assistant, OpenAiError> {
            unreachable!("strategy never creates assistants")
        }

        async fn delete_assistant(&self, _: &str) -> Result<(), OpenAiError> {
            unreachable!("strategy never deletes assistants")
        }

        async fn create_thread(&self) -> Result<Thread, OpenAiError> {
            unreachable!("strategy is handed its thread")
        }

        async fn create_message(
            &self,
            _: &str,
            request: &CreateMessageRequest,
        ) -> Result<ThreadMessage, OpenAiError> {
            self.messages.lock().unwrap().push(request.clone());
            Ok(ThreadMessage {
                id: "msg_user".into(),
                role: "user".into(),
                content: vec![],
            })
        }

        async fn create_run(&self, _: &str, _: &str) -> Result<Run, OpenAiError> {
            Ok(Run {
                id: "run_1".into(),
                status: RunStatus::Queued,
                last_error: None,
            })
        }

        async fn retrieve_run(&self, _: &str, run_id: &str) -> Result<Run, OpenAiError> {
            *self.retrieve_calls.lock().unwrap() += 1;
            if self.stalled {
                std::future::pending::<()>().await;
            }
            let status = self
                .statuses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(RunStatus::InProgress);
            Ok(Run {
                id: run_id.to_string(),
                status,
                last_error: None,
            })
        }

        async fn cancel_run(&self, _: &str, run_id: &str) -> Result<Run, OpenAiError> {
            *self.cancel_calls.lock().unwrap() += 1;
            Ok(Run {
                id: run_id.to_string(),
                status: RunStatus::Cancelling,
                last_error: None,
            })
        }

        async fn latest_message(&self, _: &str) -> Result<Option<ThreadMessage>, OpenAiError> {
            Ok(Some(ThreadMessage {
                id: "msg_reply".into(),
                role: "assistant".into(),
                content: vec![
                    MessageContent::Other,
                    MessageContent::Text {
                        text: TextContent {
                            value: self.reply.clone(),
                        },
                    },
                ],
            }))
        }
    }

    fn strategy(api: Arc<ScriptedApi>) -> PollingStrategy<ScriptedApi> {
        PollingStrategy::new(
            api,
            "asst_1".into(),
            ConversationThread {
                id: "thread_1".into(),
            },
        )
    }

    fn pdf() -> RemoteFile {
        RemoteFile {
            id: "file-abc".into(),
            uri: None,
            mime_type: "application/pdf".into(),
            display_name: "case.pdf".into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_until_completed() {
        let api = Arc::new(ScriptedApi::new(
            &[
                RunStatus::Queued,
                RunStatus::InProgress,
                RunStatus::InProgress,
                RunStatus::Completed,
            ],
            "Transcript text",
        ));
        let strategy = strategy(api.clone());

        let started = Instant::now();
        let text = strategy
            .execute("Generate", &TaskContext::text_only())
            .await
            .unwrap();

        assert_eq!(text, "Transcript text");
        assert_eq!(*api.retrieve_calls.lock().unwrap(), 4);
        // three sleeps between four checks
        assert_eq!(started.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_status_aborts_immediately() {
        let api = Arc::new(ScriptedApi::new(
            &[RunStatus::InProgress, RunStatus::Failed, RunStatus::Completed],
            "unused",
        ));
        let strategy = strategy(api.clone());

        let err = strategy
            .execute("Generate", &TaskContext::text_only())
            .await
            .unwrap_err();

        assert!(matches!(err, CompletionError::RunStatus(RunStatus::Failed)));
        assert_eq!(*api.retrieve_calls.lock().unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_and_expired_are_fatal() {
        for status in [RunStatus::Cancelled, RunStatus::Expired] {
            let api = Arc::new(ScriptedApi::new(&[status], "unused"));
            let err = strategy(api)
                .execute("Generate", &TaskContext::text_only())
                .await
                .unwrap_err();
            assert!(matches!(err, CompletionError::RunStatus(s) if s == status));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_polls_times_out_and_cancels() {
        let api = Arc::new(ScriptedApi::new(&[], "unused"));
        let strategy = strategy(api.clone()).with_poll_config(PollConfig {
            interval: DEFAULT_POLL_INTERVAL,
            max_wait: None,
            max_polls: Some(3),
        });

        let err = strategy
            .execute("Generate", &TaskContext::text_only())
            .await
            .unwrap_err();

        match err {
            CompletionError::Timeout { polls, waited } => {
                assert_eq!(polls, 3);
                assert_eq!(waited, Duration::from_secs(4));
            }
            other => panic!("Expected Timeout, got {:?}", other),
        }
        assert_eq!(*api.retrieve_calls.lock().unwrap(), 3);
        assert_eq!(*api.cancel_calls.lock().unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_wait_times_out() {
        let api = Arc::new(ScriptedApi::new(&[], "unused"));
        let strategy = strategy(api.clone()).with_poll_config(PollConfig {
            interval: Duration::from_secs(2),
            max_wait: Some(Duration::from_secs(10)),
            max_polls: None,
        });

        let err = strategy
            .execute("Generate", &TaskContext::text_only())
            .await
            .unwrap_err();

        // checks at 0, 2, 4, 6, 8, 10 seconds
        assert!(matches!(err, CompletionError::Timeout { polls: 6, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_wait_is_exact_when_interval_does_not_divide_it() {
        let api = Arc::new(ScriptedApi::new(&[], "unused"));
        let strategy = strategy(api.clone()).with_poll_config(PollConfig {
            interval: Duration::from_secs(3),
            max_wait: Some(Duration::from_secs(10)),
            max_polls: None,
        });

        let started = Instant::now();
        let err = strategy
            .execute("Generate", &TaskContext::text_only())
            .await
            .unwrap_err();

        // checks at 0, 3, 6, 9, then a shortened sleep to the 10 s deadline
        assert!(matches!(err, CompletionError::Timeout { polls: 5, .. }));
        assert_eq!(started.elapsed(), Duration::from_secs(10));
        assert_eq!(*api.cancel_calls.lock().unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_status_check_times_out_at_deadline() {
        let api = Arc::new(ScriptedApi::stalled());
        let strategy = strategy(api.clone()).with_poll_config(PollConfig {
            interval: Duration::from_secs(2),
            max_wait: Some(Duration::from_secs(10)),
            max_polls: None,
        });

        let started = Instant::now();
        let result = tokio::time::timeout(
            Duration::from_secs(3600),
            strategy.execute("Generate", &TaskContext::text_only()),
        )
        .await
        .expect("poll loop must stop at max_wait");

        match result {
            Err(CompletionError::Timeout { polls, waited }) => {
                assert_eq!(polls, 0);
                assert_eq!(waited, Duration::from_secs(10));
            }
            other => panic!("Expected Timeout, got {:?}", other),
        }
        assert_eq!(started.elapsed(), Duration::from_secs(10));
        assert_eq!(*api.retrieve_calls.lock().unwrap(), 1);
        assert_eq!(*api.cancel_calls.lock().unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_file_attached_only_once_per_thread() {
        let api = Arc::new(ScriptedApi::new(
            &[RunStatus::Completed, RunStatus::Completed, RunStatus::Completed],
            "ok",
        ));
        let strategy = strategy(api.clone());
        let file = pdf();

        strategy
            .execute("Task 1", &TaskContext::with_file(&file))
            .await
            .unwrap();
        strategy
            .execute("Task 2", &TaskContext::with_file(&file))
            .await
            .unwrap();
        strategy
            .execute("Task 3", &TaskContext::text_only())
            .await
            .unwrap();

        let messages = api.messages.lock().unwrap();
        assert_eq!(messages.len(), 3);
        let attachments = messages[0].attachments.as_ref().unwrap();
        assert_eq!(attachments[0].file_id, "file-abc");
        assert!(messages[1].attachments.is_none());
        assert!(messages[2].attachments.is_none());
    }

    #[test]
    fn test_poll_config_default() {
        let poll = PollConfig::default();
        assert_eq!(poll.interval, Duration::from_secs(2));
        assert_eq!(poll.max_wait, Some(DEFAULT_MAX_WAIT));
        assert_eq!(poll.max_polls, None);
    }
}
