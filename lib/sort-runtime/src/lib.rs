//! The bounded-parallelism `map(F, tasks, parallelism) -> results` primitive
//! the core assumes as an external collaborator (spec §6.1).
//!
//! Production work runs under [`TokioTaskRunner`], which dispatches each
//! task onto `spawn_blocking` behind a semaphore: every worker body is
//! synchronous, blocking I/O-and-CPU-bound work (spec §5), so there is no
//! benefit — and real cost, in accidentally serialized I/O — to writing
//! workers as `async fn`s with interior `.await` points. [`SequentialTaskRunner`]
//! runs tasks one at a time in the caller's own thread, for deterministic
//! tests of the coordinator's regrouping/repartitioning logic.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

/// A task invocation failed. This is always fatal for that task (spec §7);
/// the caller is expected to propagate it up to the job driver rather than
/// retry in-process.
#[derive(Debug, snafu::Snafu)]
pub enum TaskError {
    #[snafu(display("task panicked: {message}"))]
    Panicked { message: String },
    #[snafu(display("{message}"))]
    Failed { message: String },
}

/// Invokes `f` for each of `tasks`, with at most `parallelism` running
/// concurrently, returning results in the order of `tasks`.
#[async_trait]
pub trait TaskRunner: Send + Sync {
    async fn map<Task, Output, F>(
        &self,
        tasks: Vec<Task>,
        parallelism: usize,
        f: F,
    ) -> Vec<Result<Output, TaskError>>
    where
        Task: Send + 'static,
        Output: Send + 'static,
        F: Fn(Task) -> Result<Output, TaskError> + Send + Sync + Clone + 'static;
}

/// Production task runner: one `spawn_blocking` task per input, bounded by
/// a `Semaphore` sized to `parallelism`.
#[derive(Clone, Default)]
pub struct TokioTaskRunner;

#[async_trait]
impl TaskRunner for TokioTaskRunner {
    async fn map<Task, Output, F>(
        &self,
        tasks: Vec<Task>,
        parallelism: usize,
        f: F,
    ) -> Vec<Result<Output, TaskError>>
    where
        Task: Send + 'static,
        Output: Send + 'static,
        F: Fn(Task) -> Result<Output, TaskError> + Send + Sync + Clone + 'static,
    {
        let parallelism = parallelism.max(1);
        let semaphore = Arc::new(Semaphore::new(parallelism));
        let mut joins = JoinSet::new();

        for (index, task) in tasks.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let f = f.clone();
            joins.spawn(async move {
                let permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("semaphore is never closed");
                let result = tokio::task::spawn_blocking(move || {
                    let _permit = permit;
                    f(task)
                })
                .await;
                let result = match result {
                    Ok(r) => r,
                    Err(join_err) => Err(TaskError::Panicked {
                        message: join_err.to_string(),
                    }),
                };
                (index, result)
            });
        }

        let mut results: Vec<Option<Result<Output, TaskError>>> =
            std::iter::repeat_with(|| None).take(joins.len()).collect();
        while let Some(joined) = joins.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = Some(result),
                Err(join_err) => {
                    warn!(error = %join_err, "task runner join failed unexpectedly");
                }
            }
        }

        results
            .into_iter()
            .map(|r| r.unwrap_or_else(|| Err(TaskError::Panicked {
                message: "task never completed".to_string(),
            })))
            .collect()
    }
}

/// Test-only task runner that runs every task sequentially, in-process,
/// with no Tokio worker threads involved. Useful for unit tests of
/// coordination logic where determinism matters more than concurrency.
#[derive(Clone, Default)]
pub struct SequentialTaskRunner;

#[async_trait]
impl TaskRunner for SequentialTaskRunner {
    async fn map<Task, Output, F>(
        &self,
        tasks: Vec<Task>,
        _parallelism: usize,
        f: F,
    ) -> Vec<Result<Output, TaskError>>
    where
        Task: Send + 'static,
        Output: Send + 'static,
        F: Fn(Task) -> Result<Output, TaskError> + Send + Sync + Clone + 'static,
    {
        tasks.into_iter().map(f).collect()
    }
}
