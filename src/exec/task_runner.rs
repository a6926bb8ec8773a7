// src/exec/task_runner.rs

//! Individual transform runner.

use std::sync::Arc;
use std::time::Instant;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::dag::ScheduledTask;
use crate::engine::{RuntimeEvent, TaskOutcome};
use crate::errors::Result;
use crate::transform::{run_transform, TaskContext, TransformReport};
use crate::types::TaskKind;

/// Run a single task's transform and emit exactly one `TaskCompleted` event.
///
/// Transform errors are logged here and reported as `TaskOutcome::Failed`;
/// the scheduler then fails the task's dependents.
pub async fn run_task(
    task: ScheduledTask,
    ctx: Arc<TaskContext>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    let started = Instant::now();
    info!(task = %task.name, run_id = task.run_id, kind = %task.kind, "starting task");

    let outcome = match execute(task.kind, ctx).await {
        Ok(report) => {
            report.log(&task.name);
            info!(
                task = %task.name,
                run_id = task.run_id,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "task finished"
            );
            TaskOutcome::Success
        }
        Err(err) => {
            error!(
                task = %task.name,
                run_id = task.run_id,
                error = %err,
                "task failed"
            );
            TaskOutcome::Failed
        }
    };

    if let Err(err) = runtime_tx
        .send(RuntimeEvent::TaskCompleted {
            task: task.name.clone(),
            outcome,
        })
        .await
    {
        warn!(task = %task.name, "failed to send TaskCompleted event: {err}");
    }
}

async fn execute(kind: TaskKind, ctx: Arc<TaskContext>) -> Result<TransformReport> {
    if kind == TaskKind::Composite {
        return Ok(TransformReport::default());
    }

    tokio::task::spawn_blocking(move || run_transform(kind, &ctx))
        .await
        .map_err(|e| anyhow!("transform '{kind}' did not complete: {e}"))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::test_support::mock_context;

    #[tokio::test]
    async fn failing_transform_reports_failure() {
        let (_fs, ctx) = mock_context();
        let (tx, mut rx) = mpsc::channel(4);
        let task = ScheduledTask {
            name: "fonts".to_string(),
            kind: TaskKind::Fonts,
            run_id: 1,
        };

        // No src/public/fonts directory exists.
        run_task(task, Arc::new(ctx), tx).await;

        match rx.recv().await {
            Some(RuntimeEvent::TaskCompleted { task, outcome }) => {
                assert_eq!(task, "fonts");
                assert_eq!(outcome, TaskOutcome::Failed);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn composite_tasks_succeed_without_work() {
        let (fs, ctx) = mock_context();
        let (tx, mut rx) = mpsc::channel(4);
        let task = ScheduledTask {
            name: "build".to_string(),
            kind: TaskKind::Composite,
            run_id: 1,
        };

        run_task(task, Arc::new(ctx), tx).await;

        assert!(matches!(
            rx.recv().await,
            Some(RuntimeEvent::TaskCompleted { outcome: TaskOutcome::Success, .. })
        ));
        assert!(fs.files().is_empty());
    }
}
