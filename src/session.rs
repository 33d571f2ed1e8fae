//! One evaluation run: upload, set up, run the pipeline, and always release
//! what was created remotely.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use crate::ai::provider::Provider;
use crate::ai::types::RemoteFile;
use crate::error::EvalError;
use crate::pipeline::{EvaluationPipeline, EvaluationReport, TaskObserver};

/// A remote resource owned by the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteResource {
    File(RemoteFile),
    Assistant(String),
}

impl RemoteResource {
    pub fn describe(&self) -> String {
        match self {
            Self::File(file) => format!("file {}", file.id),
            Self::Assistant(id) => format!("assistant {}", id),
        }
    }
}

/// Remote resources created during a run, released together exactly once.
#[derive(Debug, Default)]
pub struct ResourceScope {
    resources: Vec<RemoteResource>,
    released: bool,
}

impl ResourceScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, resource: RemoteResource) {
        tracing::debug!("Tracking {}", resource.describe());
        self.resources.push(resource);
    }

    pub fn resources(&self) -> &[RemoteResource] {
        &self.resources
    }

    /// Release everything in reverse creation order. Failures are logged and
    /// skipped. Later calls do nothing. Returns how many releases succeeded.
    pub async fn release(&mut self, provider: &dyn Provider) -> usize {
        if self.released {
            return 0;
        }
        self.released = true;

        if self.resources.is_empty() {
            return 0;
        }

        tracing::info!("Cleaning up resources...");
        let mut released = 0;
        for resource in self.resources.iter().rev() {
            match provider.release(resource).await {
                Ok(()) => {
                    tracing::debug!("Released {}", resource.describe());
                    released += 1;
                }
                Err(e) => tracing::warn!("Failed to release {}: {}", resource.describe(), e),
            }
        }
        tracing::info!("Cleanup complete.");
        released
    }
}

impl Drop for ResourceScope {
    fn drop(&mut self) {
        if !self.released && !self.resources.is_empty() {
            let leaked: Vec<String> = self.resources.iter().map(|r| r.describe()).collect();
            tracing::error!("Remote resources were never released: {}", leaked.join(", "));
        }
    }
}

/// Run a full evaluation of `path`.
///
/// Upload, setup and the pipeline race `shutdown`; whichever way it ends,
/// every resource the run created is released before this returns.
pub async fn run_evaluation<F>(
    provider: &dyn Provider,
    pipeline: &EvaluationPipeline,
    path: &Path,
    observer: &mut dyn TaskObserver,
    shutdown: F,
) -> Result<EvaluationReport, EvalError>
where
    F: Future<Output = ()>,
{
    if !path.exists() {
        return Err(EvalError::NotFound(path.to_path_buf()));
    }

    tokio::pin!(shutdown);

    let (uploaded, interrupted) =
        finish_despite_shutdown(provider.upload(path), shutdown.as_mut()).await;
    let file = uploaded.map_err(EvalError::Upload)?;

    let mut scope = ResourceScope::new();
    scope.register(RemoteResource::File(file.clone()));

    let result = if interrupted {
        tracing::warn!("Interrupted during upload");
        Err(EvalError::Interrupted)
    } else {
        evaluate(provider, pipeline, &file, observer, shutdown.as_mut(), &mut scope).await
    };

    scope.release(provider).await;
    result
}

async fn evaluate<F>(
    provider: &dyn Provider,
    pipeline: &EvaluationPipeline,
    file: &RemoteFile,
    observer: &mut dyn TaskObserver,
    mut shutdown: Pin<&mut F>,
    scope: &mut ResourceScope,
) -> Result<EvaluationReport, EvalError>
where
    F: Future<Output = ()>,
{
    let (opened, interrupted) =
        finish_despite_shutdown(provider.open_session(scope), shutdown.as_mut()).await;
    if interrupted {
        if let Err(e) = &opened {
            tracing::warn!("Session setup failed after interruption: {}", e);
        }
        tracing::warn!("Interrupted during session setup");
        return Err(EvalError::Interrupted);
    }
    let strategy = opened.map_err(EvalError::Setup)?;

    tokio::select! {
        result = pipeline.run(strategy.as_ref(), file, observer) => result.map_err(EvalError::from),
        _ = shutdown => {
            tracing::warn!("Interrupted, releasing remote resources");
            Err(EvalError::Interrupted)
        }
    }
}

/// Run `work` to completion even if `shutdown` fires first. The flag tells
/// whether it did; `shutdown` must not be polled again once it is set.
///
/// Used for steps that create remote resources, so nothing created
/// server-side goes untracked.
async fn finish_despite_shutdown<T, W, S>(work: W, shutdown: Pin<&mut S>) -> (T, bool)
where
    W: Future<Output = T>,
    S: Future<Output = ()>,
{
    tokio::pin!(work);
    tokio::select! {
        output = &mut work => (output, false),
        _ = shutdown => {
            tracing::warn!("Interrupted, waiting for the in-flight request before cleanup");
            (work.await, true)
        }
    }
}
