// src/dag/graph.rs

use std::collections::{HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::errors::{Result, SitepipeError};
use crate::types::TaskKind;

/// Internal node structure: stores the task kind plus immediate deps and
/// dependents.
#[derive(Debug, Clone)]
struct DagNode {
    kind: TaskKind,
    /// Direct prerequisites: tasks that must succeed before this one can run.
    deps: Vec<String>,
    /// Direct dependents: tasks that list this one as a prerequisite.
    dependents: Vec<String>,
}

/// A validated, acyclic graph of named tasks.
///
/// The only way to obtain one is [`TaskGraphBuilder::build`], which rejects
/// unknown prerequisites and cycles. Everything downstream (scheduler,
/// watcher, CLI dispatcher) can therefore assume a well-formed DAG.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    nodes: HashMap<String, DagNode>,
    /// Registration order, used for stable listings.
    order: Vec<String>,
}

/// Collects task registrations before validation.
#[derive(Debug, Default)]
pub struct TaskGraphBuilder {
    entries: Vec<(String, TaskKind, Vec<String>)>,
}

impl TaskGraphBuilder {
    /// Register a task with its direct prerequisites.
    pub fn task(mut self, name: &str, kind: TaskKind, after: &[&str]) -> Self {
        self.entries.push((
            name.to_string(),
            kind,
            after.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    /// Validate the registrations and freeze them into a [`TaskGraph`].
    ///
    /// Fails with:
    /// - `ConfigError` on an empty graph or a duplicate task name,
    /// - `TaskNotFound` when a prerequisite is not registered,
    /// - `DagCycle` when the prerequisite relation has a cycle (including a
    ///   task listing itself).
    pub fn build(self) -> Result<TaskGraph> {
        if self.entries.is_empty() {
            return Err(SitepipeError::ConfigError(
                "task graph must contain at least one task".to_string(),
            ));
        }

        let mut nodes: HashMap<String, DagNode> = HashMap::new();
        let mut order = Vec::with_capacity(self.entries.len());

        for (name, kind, deps) in self.entries {
            if nodes.contains_key(&name) {
                return Err(SitepipeError::ConfigError(format!(
                    "task '{name}' is registered twice"
                )));
            }
            order.push(name.clone());
            nodes.insert(
                name,
                DagNode {
                    kind,
                    deps,
                    dependents: Vec::new(),
                },
            );
        }

        for name in &order {
            for dep in &nodes[name].deps {
                if dep == name {
                    return Err(SitepipeError::DagCycle(format!(
                        "task '{name}' cannot depend on itself"
                    )));
                }
                if !nodes.contains_key(dep) {
                    return Err(SitepipeError::TaskNotFound(format!(
                        "{dep} (prerequisite of '{name}')"
                    )));
                }
            }
        }

        ensure_acyclic(&nodes, &order)?;

        // Populate dependents now that every reference is known to be valid.
        for name in &order {
            let deps = nodes[name].deps.clone();
            for dep in deps {
                if let Some(dep_node) = nodes.get_mut(&dep) {
                    dep_node.dependents.push(name.clone());
                }
            }
        }

        Ok(TaskGraph { nodes, order })
    }
}

fn ensure_acyclic(nodes: &HashMap<String, DagNode>, order: &[String]) -> Result<()> {
    // Edge direction: dep -> task.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in order {
        graph.add_node(name.as_str());
    }
    for name in order {
        for dep in &nodes[name].deps {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_) => Ok(()),
        Err(cycle) => Err(SitepipeError::DagCycle(format!(
            "cycle detected in task graph involving task '{}'",
            cycle.node_id()
        ))),
    }
}

impl TaskGraph {
    pub fn builder() -> TaskGraphBuilder {
        TaskGraphBuilder::default()
    }

    /// All task names, in registration order.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Fail with `TaskNotFound` unless `name` is registered.
    pub fn ensure_task(&self, name: &str) -> Result<()> {
        if self.contains(name) {
            Ok(())
        } else {
            Err(SitepipeError::TaskNotFound(name.to_string()))
        }
    }

    pub fn kind_of(&self, name: &str) -> Option<TaskKind> {
        self.nodes.get(name).map(|n| n.kind)
    }

    /// Immediate prerequisites of a task.
    pub fn dependencies_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a task.
    pub fn dependents_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// Transitive prerequisites of `name`, not including `name` itself.
    pub fn prerequisites_of(&self, name: &str) -> HashSet<String> {
        let mut seen = HashSet::new();
        let mut stack: Vec<&str> = self.dependencies_of(name).iter().map(|s| s.as_str()).collect();

        while let Some(current) = stack.pop() {
            if seen.insert(current.to_string()) {
                stack.extend(self.dependencies_of(current).iter().map(|s| s.as_str()));
            }
        }

        seen
    }

    /// A valid topological order of every task (prerequisites first), ties
    /// broken by registration order.
    pub fn topological_order(&self) -> Vec<String> {
        let mut placed: HashSet<&str> = HashSet::new();
        let mut out = Vec::with_capacity(self.order.len());

        while out.len() < self.order.len() {
            for name in &self.order {
                if placed.contains(name.as_str()) {
                    continue;
                }
                if self
                    .dependencies_of(name)
                    .iter()
                    .all(|d| placed.contains(d.as_str()))
                {
                    placed.insert(name.as_str());
                    out.push(name.clone());
                }
            }
        }

        out
    }
}
