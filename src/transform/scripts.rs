// src/transform/scripts.rs

//! Bundle every script into `js/bundle.js`.
//!
//! Named-import statements (`import { a, b } from "./x.js";`) are stripped
//! because the bundle puts every module into one scope. Other import forms
//! are left alone. Nothing is written when there are no scripts.

use anyhow::Context;
use regex::Regex;
use tracing::debug;

use crate::errors::Result;
use crate::transform::sources::collect_sources;
use crate::transform::{TaskContext, TransformReport};
use crate::types::TaskKind;

/// Named-import statement starting at the beginning of a line. The brace
/// body may span lines; the module specifier may not.
const IMPORT_PATTERN: &str = r#"(?m)^import \{[^}]*\} from ['"].*['"];?\n?"#;

pub const BUNDLE_NAME: &str = "bundle.js";

pub fn run(ctx: &TaskContext) -> Result<TransformReport> {
    let import_re = Regex::new(IMPORT_PATTERN).context("compiling import pattern")?;
    let sources = collect_sources(ctx.fs.as_ref(), &ctx.layout, TaskKind::Scripts)?;
    if sources.is_empty() {
        debug!("no scripts to bundle");
        return Ok(TransformReport::default());
    }

    let mut parts = Vec::with_capacity(sources.len());
    for path in &sources {
        let content = ctx.fs.read_to_string(path)?;
        parts.push(strip_imports(&import_re, &content));
    }

    let out = ctx.layout.output_dir(TaskKind::Scripts).join(BUNDLE_NAME);
    ctx.fs.write(&out, parts.join("\n").as_bytes())?;

    let mut report = TransformReport::default();
    report.wrote(out);
    Ok(report)
}

fn strip_imports(re: &Regex, content: &str) -> String {
    re.replace_all(content, "").into_owned()
}
