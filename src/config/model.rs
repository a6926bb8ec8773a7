// src/config/model.rs

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::layout::Layout;
use crate::types::TriggerWhileRunningBehaviour;

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// triggered_while_running_behaviour = "queue"
/// queue_length = 1
///
/// [paths]
/// src = "src"
/// dest = "dist"
///
/// [server]
/// port = 3000
///
/// [favicons]
/// android = false
///
/// [deploy]
/// branch = "gh-pages"
/// ```
///
/// All sections are optional and have defaults matching the standard layout.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,
    #[serde(default)]
    pub paths: PathsSection,
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub favicons: FaviconSection,
    #[serde(default)]
    pub deploy: DeploySection,
}

/// Validated configuration. Obtain one through `ConfigFile::try_from`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub paths: PathsSection,
    pub server: ServerSection,
    pub favicons: FaviconSection,
    pub deploy: DeploySection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            config: raw.config,
            paths: raw.paths,
            server: raw.server,
            favicons: raw.favicons,
            deploy: raw.deploy,
        }
    }

    /// Resolve the source/destination layout against a project root.
    pub fn layout(&self, root: impl AsRef<Path>) -> Layout {
        Layout::new(root.as_ref(), &self.paths.src, &self.paths.dest)
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(RawConfigFile::default())
    }
}

/// `[config]` section: what happens when watch triggers pile up.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSection {
    #[serde(default)]
    pub triggered_while_running_behaviour: TriggerWhileRunningBehaviour,

    /// Maximum number of queued follow-up runs to remember.
    #[serde(default = "default_queue_length")]
    pub queue_length: usize,
}

fn default_queue_length() -> usize {
    1
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            triggered_while_running_behaviour: TriggerWhileRunningBehaviour::default(),
            queue_length: default_queue_length(),
        }
    }
}

/// `[paths]` section: source and destination roots, relative to the
/// directory holding the config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsSection {
    #[serde(default = "default_src")]
    pub src: PathBuf,
    #[serde(default = "default_dest")]
    pub dest: PathBuf,
}

fn default_src() -> PathBuf {
    PathBuf::from("src")
}

fn default_dest() -> PathBuf {
    PathBuf::from("dist")
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            src: default_src(),
            dest: default_dest(),
        }
    }
}

/// `[server]` section: dev server.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_true")]
    pub livereload: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_true() -> bool {
    true
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            livereload: true,
        }
    }
}

/// `[favicons]` section: which icon families to generate, plus the values
/// written into the Android web manifest.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FaviconSection {
    #[serde(default = "default_true")]
    pub apple_icon: bool,
    #[serde(default = "default_true")]
    pub favicons: bool,
    #[serde(default = "default_true")]
    pub android: bool,
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_colour")]
    pub background: String,
    #[serde(default = "default_colour")]
    pub theme_color: String,
}

fn default_app_name() -> String {
    "site".to_string()
}

fn default_colour() -> String {
    "#ffffff".to_string()
}

impl Default for FaviconSection {
    fn default() -> Self {
        Self {
            apple_icon: true,
            favicons: true,
            android: true,
            app_name: default_app_name(),
            background: default_colour(),
            theme_color: default_colour(),
        }
    }
}

/// `[deploy]` section: where `sitepipe deploy` pushes the destination tree.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeploySection {
    /// Git URL to push to. `None` means "the URL of the project's `origin`".
    #[serde(default)]
    pub remote: Option<String>,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_message")]
    pub message: String,
}

fn default_branch() -> String {
    "gh-pages".to_string()
}

fn default_message() -> String {
    "Update site".to_string()
}

impl Default for DeploySection {
    fn default() -> Self {
        Self {
            remote: None,
            branch: default_branch(),
            message: default_message(),
        }
    }
}
