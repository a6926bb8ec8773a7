// src/lib.rs

pub mod clean;
pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod publish;
pub mod serve;
pub mod transform;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::cli::{CliArgs, Command};
use crate::config::{default_config_path, load_or_default, ConfigFile, Layout};
use crate::dag::builtin::{self, resolve_alias};
use crate::dag::{Scheduler, TaskGraph};
use crate::engine::{
    CoreRuntime, RunSummary, Runtime, RuntimeEvent, RuntimeOptions, TriggerReason,
};
use crate::errors::{Error, Result, SitepipeError};
use crate::exec::RealExecutorBackend;
use crate::fs::RealFileSystem;
use crate::serve::{ReloadHub, ServeState};
use crate::transform::TaskContext;
use crate::watch::WatchBindings;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the task graph (built once, shared by reference)
/// - scheduler / queue / runtime
/// - executor
/// - (watch mode) file watcher, dev server and live reload
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let allow_missing = config_path == default_config_path();
    let mut cfg = load_or_default(&config_path, allow_missing)?;
    if let Some(port) = args.port {
        cfg.server.port = port;
    }

    let layout = cfg.layout(config_root_dir(&config_path));
    let graph = builtin::default_graph()?;

    match args.command() {
        Command::Default => {
            build(&cfg, &layout, &graph, builtin::BUILD).await?;
            serve_only(&cfg, &layout).await
        }
        Command::Build => build(&cfg, &layout, &graph, builtin::BUILD).await,
        Command::Run { task } => build(&cfg, &layout, &graph, resolve_alias(&task)).await,
        Command::Watch => watch_and_serve(&cfg, &layout, &graph).await,
        Command::Clean => clean::clean(&RealFileSystem, &layout).map(|_| ()),
        Command::Deploy => publish::publish(&layout, &cfg.deploy).await.map(|_| ()),
        Command::Tasks => {
            print_tasks(&graph, &layout)?;
            Ok(())
        }
    }
}

/// Run `task` and its prerequisites once against the real filesystem.
///
/// Any failed task turns into `SitepipeError::TaskFailed`.
pub async fn build(cfg: &ConfigFile, layout: &Layout, graph: &TaskGraph, task: &str) -> Result<()> {
    let summary = run_once(cfg, layout, graph, task).await?;
    if summary.is_success() {
        info!(task, "build finished");
        Ok(())
    } else {
        Err(SitepipeError::TaskFailed(summary.failed.into_iter().collect()))
    }
}

/// Run `task` and its prerequisites once and return what happened.
pub async fn run_once(
    cfg: &ConfigFile,
    layout: &Layout,
    graph: &TaskGraph,
    task: &str,
) -> Result<RunSummary> {
    graph.ensure_task(task)?;

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let executor = RealExecutorBackend::new(task_context(cfg, layout), rt_tx.clone());

    let options = RuntimeOptions {
        exit_when_idle: true,
        reload_after_run: false,
    };
    let core = core_runtime(cfg, graph, options);

    rt_tx
        .send(RuntimeEvent::TaskTriggered {
            task: task.to_string(),
            reason: TriggerReason::Manual,
        })
        .await
        .map_err(Error::from)?;

    Runtime::new(core, rt_rx, executor).run().await
}

/// Full build, then rebuild on change while serving with live reload.
///
/// The initial build and every later rebuild share one scheduler, so watch
/// triggers know which prerequisites already succeeded. A failed build does
/// not end the session.
async fn watch_and_serve(cfg: &ConfigFile, layout: &Layout, graph: &TaskGraph) -> Result<()> {
    let hub = ReloadHub::new();
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(256);
    let executor = RealExecutorBackend::new(task_context(cfg, layout), rt_tx.clone());

    let options = RuntimeOptions {
        exit_when_idle: false,
        reload_after_run: true,
    };
    let core = core_runtime(cfg, graph, options);

    rt_tx
        .send(RuntimeEvent::TaskTriggered {
            task: builtin::BUILD.to_string(),
            reason: TriggerReason::Manual,
        })
        .await
        .map_err(Error::from)?;

    let bindings = WatchBindings::builtin(layout)?;
    let _watcher = watch::spawn_watcher(layout, bindings, rt_tx.clone())?;
    spawn_ctrl_c(rt_tx.clone());

    let listener = serve::bind(&cfg.server).await?;
    let state = Arc::new(ServeState::new(
        layout.dest_dir(),
        cfg.server.livereload,
        hub.clone(),
    ));
    let mut server = tokio::spawn(serve::serve(listener, state));

    let runtime = Runtime::new(core, rt_rx, executor).with_reload(Arc::new(hub));
    tokio::select! {
        summary = runtime.run() => {
            let summary = summary?;
            if !summary.is_success() {
                warn!(failed = ?summary.failed, "some tasks failed during this session");
            }
            server.abort();
            Ok(())
        }
        served = &mut server => {
            served.map_err(|e| anyhow!("dev server task ended: {e}"))??;
            Ok(())
        }
    }
}

/// Serve the destination tree until the process is stopped.
async fn serve_only(cfg: &ConfigFile, layout: &Layout) -> Result<()> {
    let listener = serve::bind(&cfg.server).await?;
    let state = Arc::new(ServeState::new(
        layout.dest_dir(),
        cfg.server.livereload,
        ReloadHub::new(),
    ));
    serve::serve(listener, state).await
}

fn task_context(cfg: &ConfigFile, layout: &Layout) -> Arc<TaskContext> {
    Arc::new(TaskContext::new(
        Arc::new(RealFileSystem),
        layout.clone(),
        cfg.favicons.clone(),
    ))
}

fn core_runtime(cfg: &ConfigFile, graph: &TaskGraph, options: RuntimeOptions) -> CoreRuntime {
    CoreRuntime::new(
        Scheduler::new(graph),
        cfg.config.triggered_while_running_behaviour,
        cfg.config.queue_length,
        options,
    )
}

/// Ctrl-C → graceful shutdown.
fn spawn_ctrl_c(tx: mpsc::Sender<RuntimeEvent>) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {e}");
            return;
        }
        let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
    });
}

/// Figure out the project root.
///
/// - If the config path has a non-empty parent (e.g. "site/Sitepipe.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Sitepipe.toml" (parent = ""),
///   we fall back to the current working directory "."
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Dry run: print the task graph and the watch bindings.
fn print_tasks(graph: &TaskGraph, layout: &Layout) -> Result<()> {
    println!("tasks (in execution order):");
    for name in graph.topological_order() {
        let kind = graph.kind_of(&name).map(|k| k.as_str()).unwrap_or("?");
        let deps = graph.dependencies_of(&name);
        if deps.is_empty() {
            println!("  {name:<10} [{kind}]");
        } else {
            println!("  {name:<10} [{kind}] after {}", deps.join(", "));
        }
    }
    println!();

    println!("watch bindings:");
    for binding in WatchBindings::builtin(layout)?.iter() {
        if binding.is_reload_only() {
            println!("  {:<48} -> reload", binding.pattern());
        } else {
            println!("  {:<48} -> {}", binding.pattern(), binding.tasks().join(", "));
        }
    }
    Ok(())
}
