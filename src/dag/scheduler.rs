use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::dag::graph::TaskGraph;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state_manager::{Inclusion, StateManager};
use crate::dag::task_info::{RunState, ScheduledTask, TaskInfo, TaskRunState};
use crate::engine::{TaskName, TaskOutcome};

/// Scheduler holds the immutable task graph plus mutable per-run state.
///
/// It is responsible for:
/// - remembering which tasks are part of the current run
/// - deciding when a requested task is "ready" to run (prerequisites satisfied)
/// - marking tasks as succeeded/failed
/// - scheduling dependents when their prerequisites complete
/// - failing waiting dependents when a task fails
#[derive(Debug)]
pub struct Scheduler {
    graph: TaskGraph,
    tasks: HashMap<TaskName, TaskInfo>,
    /// Monotonically increasing run ID.
    run_counter: u64,
    /// Currently active run ID, or `None` if there is no active run.
    current_run_id: Option<u64>,
}

impl Scheduler {
    /// Construct a scheduler over a validated [`TaskGraph`].
    pub fn new(graph: &TaskGraph) -> Self {
        let mut tasks = HashMap::new();

        for name in graph.tasks() {
            let kind = graph
                .kind_of(name)
                .unwrap_or(crate::types::TaskKind::Composite);
            let deps = graph.dependencies_of(name).to_vec();
            tasks.insert(name.to_string(), TaskInfo::new(name.to_string(), kind, deps));
        }

        Self {
            graph: graph.clone(),
            tasks,
            run_counter: 0,
            current_run_id: None,
        }
    }

    /// Returns `true` if there is currently no active run.
    pub fn is_idle(&self) -> bool {
        self.current_run_id.is_none()
    }

    /// Read-only view of the given task's run state.
    pub fn run_state_of(&self, task: &str) -> Option<TaskRunState> {
        let info = self.tasks.get(task)?;
        Some(info.run_state.into())
    }

    /// Start a new run, resetting per-run state but keeping historical success
    /// information (for prerequisite satisfaction on later runs).
    pub fn start_new_run(&mut self) {
        self.run_counter += 1;
        self.current_run_id = Some(self.run_counter);

        for info in self.tasks.values_mut() {
            info.run_state = None;
        }

        debug!(run_id = self.run_counter, "scheduler: starting new run");
    }

    /// Request `task` together with all of its transitive prerequisites.
    pub fn handle_request(&mut self, task: &str) -> Vec<ScheduledTask> {
        self.include_step_internal(task, Inclusion::AllPrerequisites)
            .newly_scheduled
    }

    /// Trigger `task` (e.g. from a watch binding). Prerequisites that already
    /// succeeded in an earlier run are not re-run.
    pub fn handle_trigger(&mut self, task: &str) -> Vec<ScheduledTask> {
        self.include_step_internal(task, Inclusion::MissingPrerequisites)
            .newly_scheduled
    }

    /// Handle completion of a task with a concrete outcome.
    pub fn handle_completion(&mut self, task: &str, outcome: TaskOutcome) -> Vec<ScheduledTask> {
        self.completion_step_internal(task, outcome).newly_scheduled
    }

    /// Manual-step variant of `handle_completion`.
    pub fn step_completion(&mut self, task: &str, outcome: TaskOutcome) -> SchedulerStep {
        self.completion_step_internal(task, outcome)
    }

    /// Determine whether all tasks are in a terminal state and clear
    /// `current_run_id` if so.
    ///
    /// Returns `true` if this call transitioned the scheduler from running
    /// to idle.
    fn maybe_finish_run(&mut self) -> bool {
        if self.current_run_id.is_none() {
            return false;
        }

        let manager = StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);

        if manager.all_tasks_terminal() {
            info!(
                run_id = self.current_run_id,
                "scheduler: all tasks terminal; marking run as finished"
            );
            self.current_run_id = None;
            true
        } else {
            false
        }
    }

    fn include_step_internal(&mut self, task: &str, inclusion: Inclusion) -> SchedulerStep {
        if !self.tasks.contains_key(task) {
            warn!(task = %task, "request for unknown task; ignoring");
            return SchedulerStep::default();
        }

        if self.current_run_id.is_none() {
            debug!(
                task = %task,
                "request with no active run; implicitly starting a new run"
            );
            self.start_new_run();
        }

        let mut manager = StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);
        manager.mark_task_and_prerequisites_pending(task, inclusion);
        let newly_scheduled = manager.collect_new_ready_tasks();
        let run_just_finished = self.maybe_finish_run();

        SchedulerStep {
            newly_scheduled,
            newly_failed: Vec::new(),
            run_just_finished,
        }
    }

    fn completion_step_internal(&mut self, task: &str, outcome: TaskOutcome) -> SchedulerStep {
        let Some(run_id) = self.current_run_id else {
            warn!(
                task = %task,
                "completion with no active run; ignoring"
            );
            return SchedulerStep::default();
        };

        let mut newly_scheduled = Vec::new();
        let mut newly_failed = Vec::new();

        match self.tasks.get_mut(task) {
            Some(info) if info.run_state != Some(RunState::Running) => {
                warn!(
                    task = %info.name,
                    run_id,
                    state = ?info.run_state,
                    "completion for task that is not running; ignoring"
                );
            }
            Some(info) => match outcome {
                TaskOutcome::Success => {
                    info.run_state = Some(RunState::DoneSuccess);
                    info.last_successful_run = Some(run_id);
                    debug!(task = %info.name, run_id, "task completed successfully");
                    let mut manager =
                        StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);
                    newly_scheduled.extend(manager.collect_new_ready_tasks());
                }
                TaskOutcome::Failed => {
                    info.run_state = Some(RunState::DoneFailed);
                    info.last_failed_run = Some(run_id);
                    warn!(
                        task = %info.name,
                        run_id,
                        "task failed; failing dependents in this run"
                    );
                    newly_failed.push(info.name.clone());
                    let mut manager =
                        StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);
                    newly_failed.append(&mut manager.mark_dependents_failed(task));
                }
            },
            None => {
                warn!(task = %task, "completion for unknown task; ignoring");
            }
        }

        let run_just_finished = self.maybe_finish_run();

        SchedulerStep {
            newly_scheduled,
            newly_failed,
            run_just_finished,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::builtin;

    fn names(tasks: &[ScheduledTask]) -> Vec<&str> {
        tasks.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn request_schedules_roots_then_dependents() {
        let graph = builtin::default_graph().unwrap();
        let mut scheduler = Scheduler::new(&graph);

        let first = scheduler.handle_request(builtin::HTML);
        assert_eq!(names(&first), vec![builtin::SCRIPTS]);
        assert_eq!(
            scheduler.run_state_of(builtin::STYLES),
            Some(TaskRunState::NotInRun)
        );

        let next = scheduler.handle_completion(builtin::SCRIPTS, TaskOutcome::Success);
        assert_eq!(names(&next), vec![builtin::HTML]);

        let step = scheduler.step_completion(builtin::HTML, TaskOutcome::Success);
        assert!(step.newly_scheduled.is_empty());
        assert!(step.run_just_finished);
        assert!(scheduler.is_idle());
    }

    #[test]
    fn trigger_reuses_prerequisites_from_earlier_runs() {
        let graph = builtin::default_graph().unwrap();
        let mut scheduler = Scheduler::new(&graph);

        scheduler.handle_request(builtin::HTML);
        scheduler.handle_completion(builtin::SCRIPTS, TaskOutcome::Success);
        scheduler.handle_completion(builtin::HTML, TaskOutcome::Success);

        let ready = scheduler.handle_trigger(builtin::HTML);
        assert_eq!(names(&ready), vec![builtin::HTML]);
        assert_eq!(
            scheduler.run_state_of(builtin::SCRIPTS),
            Some(TaskRunState::NotInRun)
        );
    }

    #[test]
    fn trigger_pulls_in_prerequisites_that_never_succeeded() {
        let graph = builtin::default_graph().unwrap();
        let mut scheduler = Scheduler::new(&graph);

        let ready = scheduler.handle_trigger(builtin::HTML);
        assert_eq!(names(&ready), vec![builtin::SCRIPTS]);
    }

    #[test]
    fn failure_fails_waiting_dependents() {
        let graph = builtin::default_graph().unwrap();
        let mut scheduler = Scheduler::new(&graph);

        scheduler.handle_request(builtin::HTML);
        let step = scheduler.step_completion(builtin::SCRIPTS, TaskOutcome::Failed);

        assert!(step.newly_scheduled.is_empty());
        assert_eq!(step.newly_failed, vec![builtin::SCRIPTS, builtin::HTML]);
        assert!(step.run_just_finished);
    }

    #[test]
    fn stale_completion_is_ignored() {
        let graph = builtin::default_graph().unwrap();
        let mut scheduler = Scheduler::new(&graph);

        scheduler.handle_request(builtin::FONTS);
        let step = scheduler.step_completion(builtin::STYLES, TaskOutcome::Success);
        assert!(!step.run_just_finished);
        assert_eq!(
            scheduler.run_state_of(builtin::FONTS),
            Some(TaskRunState::Running)
        );
    }
}
