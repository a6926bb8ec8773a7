// src/dag/builtin.rs

//! The fixed task graph sitepipe ships with.
//!
//! ```text
//! styles ─┐
//! scripts ┼─> html ─┐
//!         │         │
//! images ─┼─────────┼─> build
//! favicons┤         │
//! fonts ──┴─────────┘
//! ```
//!
//! `html` depends on `scripts` because it injects references to the bundled
//! script files; the other transforms share no inputs or outputs and run in
//! parallel.

use crate::dag::TaskGraph;
use crate::errors::Result;
use crate::types::TaskKind;

pub const STYLES: &str = "styles";
pub const SCRIPTS: &str = "scripts";
pub const HTML: &str = "html";
pub const IMAGES: &str = "images";
pub const FAVICONS: &str = "favicons";
pub const FONTS: &str = "fonts";
/// Composite task: every transform.
pub const BUILD: &str = "build";

/// Construct the built-in task graph.
pub fn default_graph() -> Result<TaskGraph> {
    TaskGraph::builder()
        .task(STYLES, TaskKind::Styles, &[])
        .task(SCRIPTS, TaskKind::Scripts, &[])
        .task(IMAGES, TaskKind::Images, &[])
        .task(FAVICONS, TaskKind::Favicons, &[])
        .task(FONTS, TaskKind::Fonts, &[])
        .task(HTML, TaskKind::Html, &[SCRIPTS])
        .task(
            BUILD,
            TaskKind::Composite,
            &[HTML, STYLES, SCRIPTS, IMAGES, FAVICONS, FONTS],
        )
        .build()
}

/// Map legacy task names onto the built-in ones.
pub fn resolve_alias(name: &str) -> &str {
    match name {
        "sass" => STYLES,
        "generate-favicon" => FAVICONS,
        "copy-fonts" => FONTS,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_pulls_in_every_transform() {
        let graph = default_graph().unwrap();
        let prereqs = graph.prerequisites_of(BUILD);
        for name in [STYLES, SCRIPTS, HTML, IMAGES, FAVICONS, FONTS] {
            assert!(prereqs.contains(name), "{name} missing from build");
        }
    }

    #[test]
    fn html_comes_after_scripts() {
        let graph = default_graph().unwrap();
        let order = graph.topological_order();
        let pos = |n: &str| order.iter().position(|t| t == n).unwrap();
        assert!(pos(SCRIPTS) < pos(HTML));
        assert_eq!(order.last().map(String::as_str), Some(BUILD));
    }

    #[test]
    fn aliases_resolve() {
        assert_eq!(resolve_alias("sass"), STYLES);
        assert_eq!(resolve_alias("copy-fonts"), FONTS);
        assert_eq!(resolve_alias("html"), HTML);
    }
}
