// src/watch/patterns.rs

use std::fmt;

use anyhow::{Context, Result};
use globset::GlobMatcher;

use crate::config::Layout;
use crate::dag::builtin;
use crate::engine::TaskName;
use crate::transform::sources::glob_matcher;
use crate::types::TaskKind;

/// A glob pattern plus the tasks to re-run when a matching file changes.
///
/// A binding with no tasks is reload-only: a change just tells browsers to
/// reload.
#[derive(Clone)]
pub struct WatchBinding {
    pattern: String,
    tasks: Vec<TaskName>,
    matcher: GlobMatcher,
}

impl fmt::Debug for WatchBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchBinding")
            .field("pattern", &self.pattern)
            .field("tasks", &self.tasks)
            .finish_non_exhaustive()
    }
}

impl WatchBinding {
    pub fn new(pattern: impl Into<String>, tasks: Vec<TaskName>) -> Result<Self> {
        let pattern = pattern.into();
        let matcher = glob_matcher(&pattern)
            .with_context(|| format!("building watch binding for {pattern}"))?;
        Ok(Self {
            pattern,
            tasks,
            matcher,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn tasks(&self) -> &[TaskName] {
        &self.tasks
    }

    pub fn is_reload_only(&self) -> bool {
        self.tasks.is_empty()
    }

    /// `rel_path` is relative to the project root, e.g. `"src/js/app.js"`.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.matcher.is_match(rel_path)
    }
}

/// What a single changed path asks the runtime to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchAction {
    /// Re-run exactly these tasks.
    Trigger(Vec<TaskName>),
    /// Only the reload-only binding matched.
    Reload,
    /// Nothing matched.
    Ignore,
}

/// The full set of bindings registered at watch-mode startup.
#[derive(Debug, Clone, Default)]
pub struct WatchBindings {
    bindings: Vec<WatchBinding>,
}

impl WatchBindings {
    pub fn new(bindings: Vec<WatchBinding>) -> Self {
        Self { bindings }
    }

    /// Bindings of the built-in task graph for `layout`:
    ///
    /// | pattern                              | tasks      |
    /// |--------------------------------------|------------|
    /// | `src/**/*.html`                      | `html`     |
    /// | `src/scss/**/*.scss`                 | `styles`   |
    /// | `src/js/**/*.js`                     | `scripts`  |
    /// | `src/public/images/**/*.{png,...}`   | `images`   |
    /// | `src/public/favicons/*.png`          | `favicons` |
    /// | `src/**/*`                           | reload     |
    pub fn builtin(layout: &Layout) -> Result<Self> {
        let bound = [
            (TaskKind::Html, builtin::HTML),
            (TaskKind::Styles, builtin::STYLES),
            (TaskKind::Scripts, builtin::SCRIPTS),
            (TaskKind::Images, builtin::IMAGES),
            (TaskKind::Favicons, builtin::FAVICONS),
        ];

        let mut bindings = Vec::with_capacity(bound.len() + 1);
        for (kind, task) in bound {
            if let Some(pattern) = layout.source_pattern(kind) {
                bindings.push(WatchBinding::new(pattern, vec![task.to_string()])?);
            }
        }
        bindings.push(WatchBinding::new(layout.catch_all_pattern(), Vec::new())?);

        Ok(Self::new(bindings))
    }

    pub fn iter(&self) -> impl Iterator<Item = &WatchBinding> {
        self.bindings.iter()
    }

    /// Decide what a change to `rel_path` means.
    ///
    /// Task bindings win over the reload-only binding; tasks from several
    /// matching bindings are merged in binding order without duplicates.
    pub fn action_for(&self, rel_path: &str) -> WatchAction {
        let mut tasks: Vec<TaskName> = Vec::new();
        let mut reload = false;

        for binding in self.bindings.iter().filter(|b| b.matches(rel_path)) {
            if binding.is_reload_only() {
                reload = true;
            }
            for task in binding.tasks() {
                if !tasks.contains(task) {
                    tasks.push(task.clone());
                }
            }
        }

        if !tasks.is_empty() {
            WatchAction::Trigger(tasks)
        } else if reload {
            WatchAction::Reload
        } else {
            WatchAction::Ignore
        }
    }
}
