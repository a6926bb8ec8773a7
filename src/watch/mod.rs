// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling the watch bindings (glob pattern → tasks) for a layout.
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - Turning each changed path into either task triggers or a plain reload
//!   request for the runtime.
//!
//! It does **not** know about the DAG or task dependencies; deciding which
//! prerequisites a triggered task needs is the scheduler's job.

pub mod event_handler;
pub mod patterns;
pub mod watcher;

pub use event_handler::process_file_change;
pub use patterns::{WatchAction, WatchBinding, WatchBindings};
pub use watcher::{spawn_watcher, WatcherHandle};
