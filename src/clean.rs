// src/clean.rs

//! `sitepipe clean`: remove the destination tree.

use tracing::info;

use crate::config::Layout;
use crate::errors::Result;
use crate::fs::FileSystem;

/// Remove the destination directory.
///
/// Returns whether anything was removed; an absent directory is not an error,
/// so repeated calls are no-ops.
pub fn clean(fs: &dyn FileSystem, layout: &Layout) -> Result<bool> {
    let dest = layout.dest_dir();
    let removed = fs.remove_dir_all(&dest)?;
    if removed {
        info!(dir = ?dest, "removed destination directory");
    } else {
        info!(dir = ?dest, "destination directory already absent");
    }
    Ok(removed)
}
