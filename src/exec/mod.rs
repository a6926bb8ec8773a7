// src/exec/mod.rs

//! Task execution layer.
//!
//! This module is responsible for actually running the transforms behind
//! scheduled tasks and reporting back to the orchestration runtime via
//! `RuntimeEvent`s.
//!
//! - [`executor_loop`] owns the loop that receives scheduled tasks and spawns
//!   one tokio task per transform.
//! - [`task_runner`] runs a single transform on the blocking pool and turns
//!   its result into a `TaskCompleted` event.
//! - [`backend`] provides the `ExecutorBackend` trait and a concrete
//!   `RealExecutorBackend` that the runtime uses in production, and which
//!   tests can replace with a fake implementation.

pub mod backend;
pub mod executor_loop;
pub mod task_runner;

pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use executor_loop::spawn_executor;
