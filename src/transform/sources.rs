// src/transform/sources.rs

//! Input enumeration shared by the transforms.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use globset::{GlobBuilder, GlobMatcher};

use crate::config::Layout;
use crate::errors::{Result, SitepipeError};
use crate::fs::FileSystem;
use crate::types::TaskKind;

/// Compile a root-relative glob. `*` never crosses a `/`; use `**` for that.
pub fn glob_matcher(pattern: &str) -> anyhow::Result<GlobMatcher> {
    let glob = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .with_context(|| format!("invalid glob pattern: {pattern}"))?;
    Ok(glob.compile_matcher())
}

/// Every file below `dir`, recursively, sorted by path.
pub fn walk_files(fs: &dyn FileSystem, dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![dir.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            if fs.is_dir(&path) {
                stack.push(path);
            } else if fs.is_file(&path) {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Source files of a transform: everything under its source base that
/// matches its pattern, sorted by path.
///
/// A missing source base directory is an `IoError`.
pub fn collect_sources(fs: &dyn FileSystem, layout: &Layout, kind: TaskKind) -> Result<Vec<PathBuf>> {
    let Some(pattern) = layout.source_pattern(kind) else {
        return Ok(Vec::new());
    };
    let base = layout.source_base(kind);
    if !fs.is_dir(&base) {
        return Err(SitepipeError::IoError(io::Error::new(
            io::ErrorKind::NotFound,
            format!("source directory {:?} does not exist", base),
        )));
    }

    let matcher = glob_matcher(&pattern)?;
    let files = walk_files(fs, &base)?
        .into_iter()
        .filter(|path| {
            path.strip_prefix(layout.root())
                .map(|rel| matcher.is_match(rel.to_string_lossy().replace('\\', "/")))
                .unwrap_or(false)
        })
        .collect();
    Ok(files)
}

/// Map `source` (below `base`) onto the same relative location below `out_dir`.
pub fn output_path(base: &Path, out_dir: &Path, source: &Path) -> PathBuf {
    match source.strip_prefix(base) {
        Ok(rel) => out_dir.join(rel),
        Err(_) => out_dir.join(source.file_name().unwrap_or_default()),
    }
}
