// src/transform/mod.rs

//! The asset transforms behind each task kind.
//!
//! Every transform is a plain synchronous function
//! `fn(&TaskContext) -> Result<TransformReport>` that:
//! - enumerates its inputs via [`sources::collect_sources`],
//! - reads and writes exclusively through the [`FileSystem`] in the context,
//! - writes only beneath its own `Layout::output_dir`.
//!
//! Per-file failures are recorded in the report and logged; they never abort
//! the task. Task-level failures (e.g. a missing source directory) are
//! returned as errors and fail the task plus its dependents.
//!
//! The executor runs transforms inside `spawn_blocking`, so they are free to
//! do CPU-heavy work.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{FaviconSection, Layout};
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::types::TaskKind;

pub mod favicons;
pub mod fonts;
pub mod html;
pub mod images;
pub mod scripts;
pub mod sources;
pub mod styles;

/// Everything a transform needs to do its job.
#[derive(Debug, Clone)]
pub struct TaskContext {
    pub fs: Arc<dyn FileSystem>,
    pub layout: Layout,
    pub favicons: FaviconSection,
}

impl TaskContext {
    pub fn new(fs: Arc<dyn FileSystem>, layout: Layout, favicons: FaviconSection) -> Self {
        Self {
            fs,
            layout,
            favicons,
        }
    }
}

/// Outcome of one transform run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TransformReport {
    /// Files written, in the order they were written.
    pub written: Vec<PathBuf>,
    /// Inputs that produced no output, with the reason.
    pub skipped: Vec<(PathBuf, String)>,
}

impl TransformReport {
    pub fn wrote(&mut self, path: PathBuf) {
        self.written.push(path);
    }

    pub fn skip(&mut self, path: PathBuf, reason: impl Into<String>) {
        self.skipped.push((path, reason.into()));
    }

    /// Log a one-line summary plus one warning per skipped file.
    pub fn log(&self, task: &str) {
        for (file, reason) in &self.skipped {
            warn!(task = %task, file = ?file, "{reason}");
        }
        info!(
            task = %task,
            written = self.written.len(),
            skipped = self.skipped.len(),
            "transform finished"
        );
    }
}

/// Run the transform for `kind`. Composite tasks do nothing.
pub fn run_transform(kind: TaskKind, ctx: &TaskContext) -> Result<TransformReport> {
    match kind {
        TaskKind::Styles => styles::run(ctx),
        TaskKind::Scripts => scripts::run(ctx),
        TaskKind::Html => html::run(ctx),
        TaskKind::Images => images::run(ctx),
        TaskKind::Favicons => favicons::run(ctx),
        TaskKind::Fonts => fonts::run(ctx),
        TaskKind::Composite => Ok(TransformReport::default()),
    }
}
