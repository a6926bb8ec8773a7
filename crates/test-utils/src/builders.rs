#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use sitepipe::config::{ConfigFile, Layout, RawConfigFile};
use sitepipe::dag::{TaskGraph, TaskGraphBuilder};
use sitepipe::types::{TaskKind, TriggerWhileRunningBehaviour};

/// Builder for `TaskGraph`s made of plain tasks, to keep tests short.
///
/// Every task gets `TaskKind::Composite` unless a kind is given, so graphs
/// built here can run under a fake executor without touching any files.
pub struct GraphBuilder {
    inner: TaskGraphBuilder,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            inner: TaskGraph::builder(),
        }
    }

    pub fn task(mut self, name: &str, after: &[&str]) -> Self {
        self.inner = self.inner.task(name, TaskKind::Composite, after);
        self
    }

    pub fn task_of_kind(mut self, name: &str, kind: TaskKind, after: &[&str]) -> Self {
        self.inner = self.inner.task(name, kind, after);
        self
    }

    pub fn build(self) -> TaskGraph {
        self.inner.build().expect("Failed to build valid graph from builder")
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// `a -> b -> c`
pub fn chain_graph() -> TaskGraph {
    GraphBuilder::new()
        .task("a", &[])
        .task("b", &["a"])
        .task("c", &["b"])
        .build()
}

/// `a -> {b, c} -> d`
pub fn diamond_graph() -> TaskGraph {
    GraphBuilder::new()
        .task("a", &[])
        .task("b", &["a"])
        .task("c", &["a"])
        .task("d", &["b", "c"])
        .build()
}

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn behaviour(mut self, behaviour: TriggerWhileRunningBehaviour) -> Self {
        self.config.config.triggered_while_running_behaviour = behaviour;
        self
    }

    pub fn queue_length(mut self, len: usize) -> Self {
        self.config.config.queue_length = len;
        self
    }

    pub fn favicons(mut self, apple_icon: bool, favicons: bool, android: bool) -> Self {
        self.config.favicons.apple_icon = apple_icon;
        self.config.favicons.favicons = favicons;
        self.config.favicons.android = android;
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A throwaway project directory on disk with the standard `src/` layout.
pub struct SiteFixture {
    dir: tempfile::TempDir,
}

impl SiteFixture {
    /// Empty project with every source directory present.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("creating temp dir");
        for sub in [
            "src/scss",
            "src/js",
            "src/public/images",
            "src/public/favicons",
            "src/public/fonts",
        ] {
            fs::create_dir_all(dir.path().join(sub)).expect("creating source dir");
        }
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn layout(&self) -> Layout {
        Layout::new(self.root(), Path::new("src"), Path::new("dist"))
    }

    /// Write a file relative to the project root.
    pub fn write(&self, rel: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("creating parent dir");
        }
        fs::write(&path, contents).expect("writing fixture file");
        path
    }

    /// Read a file relative to the project root as a string.
    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.root().join(rel)).expect("reading fixture file")
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.root().join(rel).exists()
    }
}

impl Default for SiteFixture {
    fn default() -> Self {
        Self::new()
    }
}
