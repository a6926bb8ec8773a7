// tests/property/scheduler.rs

use std::collections::HashSet;

use proptest::prelude::*;
use sitepipe::dag::{Scheduler, TaskGraph};
use sitepipe::engine::TaskOutcome;
use sitepipe_test_utils::GraphBuilder;

// Strategy to generate a valid DAG.
// Acyclicity holds because task N may only depend on tasks 0..N-1.
fn dag_strategy(max_tasks: usize) -> impl Strategy<Value = TaskGraph> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        let deps_strat = proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..num_tasks),
            num_tasks,
        );

        deps_strat.prop_map(move |raw_deps| {
            let names: Vec<String> = (0..num_tasks).map(|i| format!("task_{i}")).collect();
            let mut builder = GraphBuilder::new();
            for (i, potential_deps) in raw_deps.into_iter().enumerate() {
                let mut valid: Vec<usize> = if i == 0 {
                    Vec::new()
                } else {
                    potential_deps.into_iter().map(|d| d % i).collect()
                };
                valid.sort_unstable();
                valid.dedup();

                let after: Vec<&str> = valid.iter().map(|&d| names[d].as_str()).collect();
                builder = builder.task(&names[i], &after);
            }
            builder.build()
        })
    })
}

/// Drive `scheduler` to idle, completing tasks in FIFO order.
///
/// Returns the executed tasks in completion order.
fn simulate(
    scheduler: &mut Scheduler,
    target: &str,
    failing: &HashSet<String>,
) -> Result<Vec<String>, TestCaseError> {
    let mut executing: Vec<String> = scheduler
        .handle_request(target)
        .into_iter()
        .map(|t| t.name)
        .collect();
    let mut executed = Vec::new();

    while !executing.is_empty() {
        let task = executing.remove(0);
        let outcome = if failing.contains(&task) {
            TaskOutcome::Failed
        } else {
            TaskOutcome::Success
        };
        executed.push(task.clone());
        for st in scheduler.handle_completion(&task, outcome) {
            executing.push(st.name);
        }
        prop_assert!(executed.len() <= 100, "simulation did not converge");
    }

    prop_assert!(scheduler.is_idle(), "run never finished");
    Ok(executed)
}

proptest! {
    #[test]
    fn request_runs_closure_in_dependency_order_exactly_once(
        graph in dag_strategy(10),
        target_idx in 0..10usize,
    ) {
        let names: Vec<String> = graph.tasks().map(str::to_string).collect();
        let target = names[target_idx % names.len()].clone();
        let mut scheduler = Scheduler::new(&graph);

        let executed = simulate(&mut scheduler, &target, &HashSet::new())?;

        let mut expected = graph.prerequisites_of(&target);
        expected.insert(target.clone());
        let ran: HashSet<String> = executed.iter().cloned().collect();
        prop_assert_eq!(ran.len(), executed.len(), "a task ran twice: {:?}", executed);
        prop_assert_eq!(ran, expected);

        for (pos, task) in executed.iter().enumerate() {
            for dep in graph.dependencies_of(task) {
                let dep_pos = executed.iter().position(|t| t == dep);
                prop_assert!(
                    dep_pos.is_some_and(|p| p < pos),
                    "{} ran before its prerequisite {}", task, dep
                );
            }
        }
    }

    #[test]
    fn failures_never_let_dependents_run(
        graph in dag_strategy(10),
        target_idx in 0..10usize,
        failing_idx in proptest::collection::vec(0..10usize, 0..4),
    ) {
        let names: Vec<String> = graph.tasks().map(str::to_string).collect();
        let target = names[target_idx % names.len()].clone();
        let failing: HashSet<String> = failing_idx
            .iter()
            .map(|&i| names[i % names.len()].clone())
            .collect();
        let mut scheduler = Scheduler::new(&graph);

        let executed = simulate(&mut scheduler, &target, &failing)?;

        for (pos, task) in executed.iter().enumerate() {
            for dep in graph.dependencies_of(task) {
                prop_assert!(!failing.contains(dep), "{} ran after {} failed", task, dep);
                let dep_pos = executed.iter().position(|t| t == dep);
                prop_assert!(dep_pos.is_some_and(|p| p < pos));
            }
        }
    }
}
