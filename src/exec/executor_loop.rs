// src/exec/executor_loop.rs

//! Main executor loop that spawns transform runs.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::dag::ScheduledTask;
use crate::engine::RuntimeEvent;
use crate::exec::task_runner::run_task;
use crate::transform::TaskContext;

/// Spawn the background executor loop.
///
/// The returned `mpsc::Sender<ScheduledTask>` is what `RealExecutorBackend`
/// forwards dispatched tasks into. Each scheduled task is executed in its own
/// Tokio task, and **per task name there is never more than one transform
/// writing at the same time**: a new instance waits for the previous one to
/// finish before it starts.
pub fn spawn_executor(
    ctx: Arc<TaskContext>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> mpsc::Sender<ScheduledTask> {
    let (tx, mut rx) = mpsc::channel::<ScheduledTask>(32);

    tokio::spawn(async move {
        info!("executor loop started");

        // Latest instance per task name.
        let mut active: HashMap<String, JoinHandle<()>> = HashMap::new();

        while let Some(task) = rx.recv().await {
            handle_scheduled_task(task, &mut active, &ctx, &runtime_tx);
        }

        info!("executor loop finished (channel closed)");
    });

    tx
}

fn handle_scheduled_task(
    task: ScheduledTask,
    active: &mut HashMap<String, JoinHandle<()>>,
    ctx: &Arc<TaskContext>,
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
) {
    let name = task.name.clone();
    let previous = active
        .remove(&name)
        .filter(|handle| !handle.is_finished());

    if previous.is_some() {
        debug!(
            task = %name,
            run_id = task.run_id,
            "previous instance still running; new instance will wait for it"
        );
    }

    let ctx = Arc::clone(ctx);
    let rt_tx = runtime_tx.clone();
    let handle = tokio::spawn(async move {
        if let Some(previous) = previous {
            let _ = previous.await;
        }
        run_task(task, ctx, rt_tx).await;
    });

    active.insert(name, handle);
}
