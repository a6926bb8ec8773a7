// src/watch/event_handler.rs

//! Event processing logic for file system changes.

use std::path::Path;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::engine::{RuntimeEvent, TriggerReason};
use crate::watch::patterns::{WatchAction, WatchBindings};

/// Process a single changed path and forward the resulting events.
///
/// Returns `false` once the runtime channel is closed, so the caller can stop
/// its loop.
pub async fn process_file_change(
    root: &Path,
    path: &Path,
    bindings: &WatchBindings,
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
) -> bool {
    let Some(rel) = relative_str(root, path) else {
        warn!("could not relativize path {:?} against root {:?}", path, root);
        return true;
    };

    let events = match bindings.action_for(&rel) {
        WatchAction::Trigger(tasks) => {
            debug!(path = %rel, ?tasks, "watch match -> triggering tasks");
            tasks
                .into_iter()
                .map(|task| RuntimeEvent::TaskTriggered {
                    task,
                    reason: TriggerReason::FileWatch,
                })
                .collect()
        }
        WatchAction::Reload => {
            debug!(path = %rel, "unbound source changed -> reload");
            vec![RuntimeEvent::ReloadRequested]
        }
        WatchAction::Ignore => Vec::new(),
    };

    for event in events {
        if let Err(err) = runtime_tx.send(event).await {
            warn!("failed to forward watch event to runtime: {err}");
            return false;
        }
    }
    true
}

/// `path` relative to `root`, with forward slashes.
///
/// Falls back to comparing canonical paths, since some platforms report
/// events through a different prefix (e.g. `/private/var` on macOS).
fn relative_str(root: &Path, path: &Path) -> Option<String> {
    let slashed = |p: &Path| p.to_string_lossy().replace('\\', "/");

    if let Ok(rel) = path.strip_prefix(root) {
        return Some(slashed(rel));
    }

    let root = root.canonicalize().ok()?;
    let path = path.canonicalize().ok()?;
    path.strip_prefix(&root).ok().map(slashed)
}
