// src/publish.rs

//! `sitepipe deploy`: push the destination tree to a git branch.
//!
//! The tree is copied into a scratch repository under `.publish/`, committed
//! as a single orphan commit and force-pushed, so the target branch always
//! holds exactly the last published build. Every git failure surfaces as
//! `PublishError`; nothing is retried.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::anyhow;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::{DeploySection, Layout};
use crate::errors::{Result, SitepipeError};
use crate::fs::{FileSystem, RealFileSystem};
use crate::transform::sources::walk_files;

/// Scratch repository, relative to the project root.
pub const SCRATCH_DIR: &str = ".publish";

/// What a successful publish did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub remote: String,
    pub branch: String,
    pub files: usize,
}

pub async fn publish(layout: &Layout, deploy: &DeploySection) -> Result<PublishReport> {
    let dest = layout.dest_dir();
    let dest_is_dir = tokio::fs::metadata(&dest)
        .await
        .is_ok_and(|meta| meta.is_dir());
    if !dest_is_dir {
        return Err(SitepipeError::IoError(io::Error::new(
            io::ErrorKind::NotFound,
            format!("nothing to publish: {:?} does not exist", dest),
        )));
    }

    let remote = match &deploy.remote {
        Some(remote) => remote.clone(),
        None => origin_url(layout.root()).await?,
    };

    let scratch = layout.root().join(SCRATCH_DIR);
    let files = refresh_scratch(dest, scratch.clone()).await?;
    debug!(files, scratch = ?scratch, "copied destination tree");

    git(&scratch, &["init", "--quiet"]).await?;
    git(&scratch, &["checkout", "--quiet", "-b", &deploy.branch]).await?;
    git(&scratch, &["add", "--all"]).await?;
    git(&scratch, &["commit", "--quiet", "--allow-empty", "-m", &deploy.message]).await?;

    let refspec = format!("HEAD:{}", deploy.branch);
    info!(remote = %remote, branch = %deploy.branch, "pushing");
    git(&scratch, &["push", "--force", &remote, &refspec]).await?;

    info!(remote = %remote, branch = %deploy.branch, files, "published");
    Ok(PublishReport {
        remote,
        branch: deploy.branch.clone(),
        files,
    })
}

/// URL of the project's `origin` remote.
async fn origin_url(root: &Path) -> Result<String> {
    let url = git(root, &["remote", "get-url", "origin"]).await?;
    Ok(url.trim().to_string())
}

/// Replace the scratch tree with a fresh copy of `dest`, off the async
/// runtime.
async fn refresh_scratch(dest: PathBuf, scratch: PathBuf) -> Result<usize> {
    tokio::task::spawn_blocking(move || -> Result<usize> {
        let fs = RealFileSystem;
        fs.remove_dir_all(&scratch)?;
        copy_tree(&fs, &dest, &scratch)
    })
    .await
    .map_err(|e| anyhow!("copying {SCRATCH_DIR} did not complete: {e}"))?
}

/// Copy every file below `from` to the same relative location below `to`.
pub fn copy_tree(fs: &dyn FileSystem, from: &Path, to: &Path) -> Result<usize> {
    let files = walk_files(fs, from)?;
    for file in &files {
        let rel = file.strip_prefix(from).map_err(|e| anyhow!(e))?;
        fs.write(&to.join(rel), &fs.read(file)?)?;
    }
    Ok(files.len())
}

/// Run git in `dir`, returning stdout.
async fn git(dir: &Path, args: &[&str]) -> Result<String> {
    debug!(dir = ?dir, ?args, "running git");
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .await
        .map_err(|e| SitepipeError::PublishError(format!("failed to run git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SitepipeError::PublishError(format!(
            "git {} failed ({}): {}",
            args.join(" "),
            output.status,
            stderr.trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
