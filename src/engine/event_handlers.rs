// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use std::collections::BTreeSet;

use crate::dag::{ScheduledTask, Scheduler, TaskRunState};
use crate::engine::queue::TriggerQueue;
use crate::engine::{RuntimeOptions, TaskName, TaskOutcome, TriggerReason};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Send these tasks to the executor.
    DispatchTasks(Vec<ScheduledTask>),
    /// Tell connected browsers to reload.
    Reload,
    /// Request that the process exits (build mode, once idle).
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
    /// Tasks that failed while handling this event.
    pub newly_failed: Vec<TaskName>,
}

impl CoreStep {
    fn running(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
            newly_failed: Vec::new(),
        }
    }
}

/// Handle a task trigger event.
///
/// - If the scheduler is idle, we start a new run and seed it with
///   this trigger plus anything that was already queued.
/// - If a run is active:
///   - If `task` is already participating in this run, the trigger is
///     queued for a *future* run (the in-progress run is never interrupted).
///   - If `task` is *not* in the current run, it is merged into the current
///     run immediately, so unrelated tasks run in parallel.
pub fn handle_task_trigger(
    scheduler: &mut Scheduler,
    queue: &mut TriggerQueue,
    task: TaskName,
    reason: TriggerReason,
) -> CoreStep {
    if scheduler.is_idle() {
        let queued = queue.drain_pending();
        return start_new_run_from_triggers(scheduler, vec![(task, reason)], queued);
    }

    let mut commands = Vec::new();

    match scheduler.run_state_of(&task) {
        None => {
            // Unknown task; the CLI validates names before seeding.
        }
        Some(TaskRunState::NotInRun) => {
            let newly_ready = include(scheduler, &task, reason);
            if !newly_ready.is_empty() {
                commands.push(CoreCommand::DispatchTasks(newly_ready));
            }
        }
        Some(_already_in_run) => {
            queue.record_trigger(&task);
        }
    }

    CoreStep::running(commands)
}

/// Handle a task completion event.
pub fn handle_task_completion(
    scheduler: &mut Scheduler,
    queue: &mut TriggerQueue,
    options: &RuntimeOptions,
    task: TaskName,
    outcome: TaskOutcome,
) -> CoreStep {
    let mut commands = Vec::new();

    let step = scheduler.step_completion(&task, outcome);
    if !step.newly_scheduled.is_empty() {
        commands.push(CoreCommand::DispatchTasks(step.newly_scheduled));
    }

    commands.append(&mut maybe_start_queued_run(scheduler, queue));

    // A queued run that started right away postpones the reload until it
    // finishes too.
    if step.run_just_finished && scheduler.is_idle() && options.reload_after_run {
        commands.push(CoreCommand::Reload);
    }

    let mut keep_running = true;
    if options.exit_when_idle && scheduler.is_idle() && queue.is_empty() {
        keep_running = false;
        commands.push(CoreCommand::RequestExit);
    }

    CoreStep {
        commands,
        keep_running,
        newly_failed: step.newly_failed,
    }
}

/// Handle a reload request from the catch-all watch binding.
///
/// While a run is active the reload is dropped: the end of the run reloads
/// anyway.
pub fn handle_reload_request(scheduler: &Scheduler) -> CoreStep {
    if scheduler.is_idle() {
        CoreStep::running(vec![CoreCommand::Reload])
    } else {
        CoreStep::running(Vec::new())
    }
}

/// Start a new run from a set of triggers.
///
/// `triggers` carry their reason; `queued` are watch triggers that piled up
/// during the previous run.
pub fn start_new_run_from_triggers(
    scheduler: &mut Scheduler,
    triggers: Vec<(TaskName, TriggerReason)>,
    queued: Vec<TaskName>,
) -> CoreStep {
    let mut all: Vec<(TaskName, TriggerReason)> = triggers;
    let explicit: BTreeSet<TaskName> = all.iter().map(|(t, _)| t.clone()).collect();
    all.extend(
        queued
            .into_iter()
            .filter(|t| !explicit.contains(t))
            .map(|t| (t, TriggerReason::FileWatch)),
    );

    if all.is_empty() {
        return CoreStep::running(Vec::new());
    }

    scheduler.start_new_run();

    let mut all_ready = Vec::new();
    for (task, reason) in all {
        all_ready.extend(include(scheduler, &task, reason));
    }

    let mut commands = Vec::new();
    if !all_ready.is_empty() {
        commands.push(CoreCommand::DispatchTasks(all_ready));
    }

    CoreStep::running(commands)
}

fn include(scheduler: &mut Scheduler, task: &str, reason: TriggerReason) -> Vec<ScheduledTask> {
    match reason {
        TriggerReason::Manual => scheduler.handle_request(task),
        TriggerReason::FileWatch => scheduler.handle_trigger(task),
    }
}

/// If the scheduler is idle and there are queued triggers, start a new run.
fn maybe_start_queued_run(scheduler: &mut Scheduler, queue: &mut TriggerQueue) -> Vec<CoreCommand> {
    if !scheduler.is_idle() {
        return Vec::new();
    }

    let queued = queue.drain_pending();
    if queued.is_empty() {
        return Vec::new();
    }

    start_new_run_from_triggers(scheduler, Vec::new(), queued).commands
}
