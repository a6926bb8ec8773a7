use serde::Deserialize;

/// Behaviour when a watch trigger arrives for a task that is already part of
/// the run in progress.
///
/// - `Queue`: remember the trigger and start a new run when the current one
///   finishes (default behaviour).
/// - `Cancel`: drop any previously queued run and only keep the latest
///   trigger. The running tasks are never interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerWhileRunningBehaviour {
    #[default]
    Queue,
    Cancel,
}

/// What a task does when the executor runs it.
///
/// Every transform kind owns one destination subdirectory; `Composite` tasks
/// do no work of their own and only exist to group prerequisites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Styles,
    Scripts,
    Html,
    Images,
    Favicons,
    Fonts,
    Composite,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Styles => "styles",
            TaskKind::Scripts => "scripts",
            TaskKind::Html => "html",
            TaskKind::Images => "images",
            TaskKind::Favicons => "favicons",
            TaskKind::Fonts => "fonts",
            TaskKind::Composite => "composite",
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
