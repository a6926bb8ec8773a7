// src/transform/styles.rs

//! Sass entry points to prefixed, minified CSS.
//!
//! `src/scss/theme/dark.scss` becomes `dist/css/theme/dark.min.css`.
//! Partials (`_name.scss`) are only reachable through `@use`/`@import`.

use std::io;
use std::path::Path;

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use tracing::debug;

use crate::errors::{Result, SitepipeError};
use crate::fs::FileSystem;
use crate::transform::sources::{collect_sources, output_path};
use crate::transform::{TaskContext, TransformReport};
use crate::types::TaskKind;

pub fn run(ctx: &TaskContext) -> Result<TransformReport> {
    let base = ctx.layout.source_base(TaskKind::Styles);
    let out_dir = ctx.layout.output_dir(TaskKind::Styles);
    let mut report = TransformReport::default();

    for source in collect_sources(ctx.fs.as_ref(), &ctx.layout, TaskKind::Styles)? {
        if is_partial(&source) {
            debug!(file = ?source, "skipping sass partial");
            continue;
        }

        let css = match compile(ctx.fs.as_ref(), &source) {
            Ok(css) => css,
            Err(err) => {
                report.skip(source, err.to_string());
                continue;
            }
        };

        let out = output_path(&base, &out_dir, &source).with_extension("min.css");
        ctx.fs.write(&out, css.as_bytes())?;
        report.wrote(out);
    }

    Ok(report)
}

fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('_'))
}

/// Compile one entry point. Any failure is a `CompileError` for that file.
fn compile(fs: &dyn FileSystem, source: &Path) -> Result<String> {
    let compile_error = |message: String| SitepipeError::CompileError {
        file: source.to_path_buf(),
        message,
    };

    let input = fs.read_to_string(source)?;
    let sass_fs = SassFs(fs);
    let load_path = source.parent().map(Path::to_path_buf).unwrap_or_default();
    let options = grass::Options::default().fs(&sass_fs).load_path(&load_path);
    let css = grass::from_string(input, &options).map_err(|e| compile_error(e.to_string()))?;

    postprocess(&css).map_err(compile_error)
}

/// Add vendor prefixes for [`browser_targets`] and minify.
fn postprocess(css: &str) -> std::result::Result<String, String> {
    let mut sheet = StyleSheet::parse(css, ParserOptions::default()).map_err(|e| e.to_string())?;
    sheet
        .minify(MinifyOptions {
            targets: browser_targets(),
            ..MinifyOptions::default()
        })
        .map_err(|e| e.to_string())?;
    let printed = sheet
        .to_css(PrinterOptions {
            minify: true,
            targets: browser_targets(),
            ..PrinterOptions::default()
        })
        .map_err(|e| e.to_string())?;
    Ok(printed.code)
}

/// Fixed browser set the output is prefixed for.
fn browser_targets() -> Targets {
    let version = |major: u32| Some(major << 16);
    Targets::from(Browsers {
        chrome: version(90),
        edge: version(90),
        firefox: version(88),
        safari: version(13),
        ios_saf: version(13),
        android: version(90),
        samsung: version(14),
        ..Browsers::default()
    })
}

/// Lets the Sass compiler resolve imports through our [`FileSystem`].
#[derive(Debug)]
struct SassFs<'a>(&'a dyn FileSystem);

impl grass::Fs for SassFs<'_> {
    fn is_dir(&self, path: &Path) -> bool {
        self.0.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.0.is_file(path)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.0
            .read(path)
            .map_err(|e| io::Error::new(io::ErrorKind::NotFound, e.to_string()))
    }
}
