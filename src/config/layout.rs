// src/config/layout.rs

//! Where each transform reads from and writes to.
//!
//! All glob patterns produced here are relative to the project root and use
//! forward slashes, so they can be matched against the strings produced by
//! the watcher when it relativizes event paths.

use std::path::{Path, PathBuf};

use crate::types::TaskKind;

/// Resolved source/destination layout of a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
    src: PathBuf,
    dest: PathBuf,
}

impl Layout {
    pub fn new(root: &Path, src: &Path, dest: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            src: src.to_path_buf(),
            dest: dest.to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute source root, e.g. `<root>/src`.
    pub fn src_dir(&self) -> PathBuf {
        self.root.join(&self.src)
    }

    /// Absolute destination root, e.g. `<root>/dist`.
    pub fn dest_dir(&self) -> PathBuf {
        self.root.join(&self.dest)
    }

    /// Glob selecting the inputs of a transform. `None` for composite tasks.
    pub fn source_pattern(&self, kind: TaskKind) -> Option<String> {
        let src = slashed(&self.src);
        let pattern = match kind {
            TaskKind::Styles => format!("{src}/scss/**/*.scss"),
            TaskKind::Scripts => format!("{src}/js/**/*.js"),
            TaskKind::Html => format!("{src}/**/*.html"),
            TaskKind::Images => format!("{src}/public/images/**/*.{{png,svg,jpg,ico}}"),
            TaskKind::Favicons => format!("{src}/public/favicons/*.png"),
            TaskKind::Fonts => format!("{src}/public/fonts/*.woff2"),
            TaskKind::Composite => return None,
        };
        Some(pattern)
    }

    /// Pattern for the reload-only binding covering the whole source tree.
    pub fn catch_all_pattern(&self) -> String {
        format!("{}/**/*", slashed(&self.src))
    }

    /// Directory that source paths are made relative to before being placed
    /// under [`Layout::output_dir`].
    pub fn source_base(&self, kind: TaskKind) -> PathBuf {
        let src = self.src_dir();
        match kind {
            TaskKind::Styles => src.join("scss"),
            TaskKind::Scripts => src.join("js"),
            TaskKind::Images => src.join("public/images"),
            TaskKind::Favicons => src.join("public/favicons"),
            TaskKind::Fonts => src.join("public/fonts"),
            TaskKind::Html | TaskKind::Composite => src,
        }
    }

    /// Destination directory of a transform.
    pub fn output_dir(&self, kind: TaskKind) -> PathBuf {
        let dest = self.dest_dir();
        match kind {
            TaskKind::Styles => dest.join("css"),
            TaskKind::Scripts => dest.join("js"),
            TaskKind::Images => dest.join("public/images"),
            TaskKind::Favicons => dest.join("public/favicons"),
            TaskKind::Fonts => dest.join("public/fonts"),
            TaskKind::Html | TaskKind::Composite => dest,
        }
    }
}

fn slashed(path: &Path) -> String {
    let s = path.to_string_lossy().replace('\\', "/");
    s.trim_end_matches('/').to_string()
}
