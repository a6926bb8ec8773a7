// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from channels
//! - sending `ScheduledTask`s to the executor
//! - pushing reload signals to the dev server
//!
//! The core is unit tested without any Tokio, channels, filesystem, or
//! transforms.

use std::collections::BTreeSet;

use crate::dag::Scheduler;
use crate::engine::event_handlers::{
    handle_reload_request, handle_task_completion, handle_task_trigger, CoreStep,
};
use crate::engine::queue::TriggerQueue;
use crate::engine::{RuntimeEvent, RuntimeOptions, TaskName};
use crate::types::TriggerWhileRunningBehaviour;

/// What happened over the lifetime of a runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Every task that failed at least once (including dependents blocked by
    /// a failure).
    pub failed: BTreeSet<TaskName>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Pure core runtime state.
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
    queue: TriggerQueue,
    options: RuntimeOptions,
    summary: RunSummary,
}

impl CoreRuntime {
    pub fn new(
        scheduler: Scheduler,
        behaviour: TriggerWhileRunningBehaviour,
        queue_length: usize,
        options: RuntimeOptions,
    ) -> Self {
        Self {
            scheduler,
            queue: TriggerQueue::new(behaviour, queue_length),
            options,
            summary: RunSummary::default(),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    pub fn queue_is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn into_summary(self) -> RunSummary {
        self.summary
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        let step = match event {
            RuntimeEvent::TaskTriggered { task, reason } => {
                handle_task_trigger(&mut self.scheduler, &mut self.queue, task, reason)
            }
            RuntimeEvent::TaskCompleted { task, outcome } => handle_task_completion(
                &mut self.scheduler,
                &mut self.queue,
                &self.options,
                task,
                outcome,
            ),
            RuntimeEvent::ReloadRequested => handle_reload_request(&self.scheduler),
            RuntimeEvent::ShutdownRequested => CoreStep {
                commands: Vec::new(),
                keep_running: false,
                newly_failed: Vec::new(),
            },
        };

        self.summary.failed.extend(step.newly_failed.iter().cloned());
        step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::builtin;
    use crate::engine::{CoreCommand, TaskOutcome, TriggerReason};

    fn core(options: RuntimeOptions) -> CoreRuntime {
        let graph = builtin::default_graph().unwrap();
        CoreRuntime::new(
            Scheduler::new(&graph),
            TriggerWhileRunningBehaviour::Queue,
            1,
            options,
        )
    }

    fn trigger(task: &str, reason: TriggerReason) -> RuntimeEvent {
        RuntimeEvent::TaskTriggered {
            task: task.to_string(),
            reason,
        }
    }

    fn done(task: &str) -> RuntimeEvent {
        RuntimeEvent::TaskCompleted {
            task: task.to_string(),
            outcome: TaskOutcome::Success,
        }
    }

    fn dispatched(step: &CoreStep) -> Vec<String> {
        step.commands
            .iter()
            .filter_map(|c| match c {
                CoreCommand::DispatchTasks(tasks) => Some(tasks),
                _ => None,
            })
            .flatten()
            .map(|t| t.name.clone())
            .collect()
    }

    #[test]
    fn retrigger_during_run_is_queued_not_interrupting() {
        let mut core = core(RuntimeOptions {
            exit_when_idle: false,
            reload_after_run: true,
        });

        let step = core.step(trigger(builtin::STYLES, TriggerReason::FileWatch));
        assert_eq!(dispatched(&step), vec![builtin::STYLES]);

        let step = core.step(trigger(builtin::STYLES, TriggerReason::FileWatch));
        assert!(step.commands.is_empty());
        assert!(!core.queue_is_empty());

        // The queued run starts as soon as the first completes; no reload yet.
        let step = core.step(done(builtin::STYLES));
        assert_eq!(dispatched(&step), vec![builtin::STYLES]);
        assert!(!step.commands.contains(&CoreCommand::Reload));

        let step = core.step(done(builtin::STYLES));
        assert_eq!(step.commands, vec![CoreCommand::Reload]);
    }

    #[test]
    fn reload_request_while_idle_reloads_immediately() {
        let mut core = core(RuntimeOptions::default());
        let step = core.step(RuntimeEvent::ReloadRequested);
        assert_eq!(step.commands, vec![CoreCommand::Reload]);
    }

    #[test]
    fn build_mode_exits_when_idle_and_records_failures() {
        let mut core = core(RuntimeOptions {
            exit_when_idle: true,
            reload_after_run: false,
        });

        core.step(trigger(builtin::HTML, TriggerReason::Manual));
        let step = core.step(RuntimeEvent::TaskCompleted {
            task: builtin::SCRIPTS.to_string(),
            outcome: TaskOutcome::Failed,
        });

        assert!(!step.keep_running);
        assert!(step.commands.contains(&CoreCommand::RequestExit));
        let failed: Vec<&str> = core.summary().failed.iter().map(String::as_str).collect();
        assert_eq!(failed, vec![builtin::HTML, builtin::SCRIPTS]);
    }
}
