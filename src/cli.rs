// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `sitepipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sitepipe",
    version,
    about = "Build, watch, serve and publish a static site's assets.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Sitepipe.toml` in the current working directory. A missing
    /// file at the default path means "use built-in defaults".
    #[arg(long, value_name = "PATH", default_value = "Sitepipe.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SITEPIPE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// Override `[server].port` for the dev server.
    #[arg(long, value_name = "PORT", global = true)]
    pub port: Option<u16>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl CliArgs {
    /// The command to execute; no subcommand means [`Command::Default`].
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Default)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Full build, then start the dev server.
    Default,
    /// Full build, then exit.
    Build,
    /// Full build, then watch sources, rebuild on change and serve with live reload.
    Watch,
    /// Run a single task (and its prerequisites), then exit.
    Run {
        /// Task name, e.g. `styles` or `html`.
        task: String,
    },
    /// Remove the destination directory.
    Clean,
    /// Publish the destination directory to the configured git branch.
    Deploy,
    /// Print the task graph and watch bindings without running anything.
    Tasks,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_default() {
        let args = CliArgs::parse_from(["sitepipe"]);
        assert_eq!(args.command(), Command::Default);
        assert_eq!(args.config, "Sitepipe.toml");
    }

    #[test]
    fn run_takes_a_task_name() {
        let args = CliArgs::parse_from(["sitepipe", "run", "styles", "--port", "8080"]);
        assert_eq!(
            args.command(),
            Command::Run {
                task: "styles".to_string()
            }
        );
        assert_eq!(args.port, Some(8080));
    }
}
