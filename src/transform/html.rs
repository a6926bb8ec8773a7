// src/transform/html.rs

//! HTML pages: minification plus script injection.
//!
//! Pages are copied from `src/` to `dist/` with their relative path intact.
//! Between the `<!-- inject:js -->` and `<!-- endinject -->` markers, one
//! `<script src>` tag is written per `.js` file already present in `dist/`,
//! each referenced relative to the page that includes it.

use std::path::{Component, Path};

use anyhow::Context;

use crate::errors::Result;
use crate::transform::sources::{collect_sources, output_path, walk_files};
use crate::transform::{TaskContext, TransformReport};
use crate::types::TaskKind;

pub const INJECT_START: &str = "<!-- inject:js -->";
pub const INJECT_END: &str = "<!-- endinject -->";

pub fn run(ctx: &TaskContext) -> Result<TransformReport> {
    let base = ctx.layout.source_base(TaskKind::Html);
    let out_dir = ctx.layout.output_dir(TaskKind::Html);

    let dest = ctx.layout.dest_dir();
    let scripts: Vec<_> = if ctx.fs.is_dir(&dest) {
        walk_files(ctx.fs.as_ref(), &dest)?
            .into_iter()
            .filter(|p| p.extension().is_some_and(|ext| ext == "js"))
            .collect()
    } else {
        Vec::new()
    };

    let mut report = TransformReport::default();
    for source in collect_sources(ctx.fs.as_ref(), &ctx.layout, TaskKind::Html)? {
        let out = output_path(&base, &out_dir, &source);
        let page_dir = out.parent().unwrap_or(&out_dir);
        let srcs: Vec<String> = scripts.iter().map(|s| relative_url(page_dir, s)).collect();

        let html = ctx.fs.read_to_string(&source)?;
        let html = inject_scripts(&minify(&html)?, &srcs);
        ctx.fs.write(&out, html.as_bytes())?;
        report.wrote(out);
    }
    Ok(report)
}

/// Minify a page. Comments survive so the inject markers can still be
/// found, and optional tags are kept so the output mirrors its source.
pub fn minify(html: &str) -> Result<String> {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = true;

    let bytes = minify_html::minify(html.as_bytes(), &cfg);
    let page = String::from_utf8(bytes).context("minified page is not utf-8")?;
    Ok(page)
}

/// Replace the contents of every inject block with one script tag per entry
/// of `srcs`. Pages without markers are returned unchanged.
pub fn inject_scripts(html: &str, srcs: &[String]) -> String {
    let tags: String = srcs
        .iter()
        .map(|src| format!(r#"<script src="{src}"></script>"#))
        .collect();

    let mut out = String::with_capacity(html.len() + tags.len());
    let mut rest = html;
    while let Some(start) = rest.find(INJECT_START) {
        let body = start + INJECT_START.len();
        let Some(end) = rest[body..].find(INJECT_END) else {
            break;
        };
        out.push_str(&rest[..body]);
        out.push_str(&tags);
        out.push_str(INJECT_END);
        rest = &rest[body + end + INJECT_END.len()..];
    }
    out.push_str(rest);
    out
}

/// `/`-separated path from directory `from` to `target`.
pub fn relative_url(from: &Path, target: &Path) -> String {
    let from: Vec<Component<'_>> = from.components().collect();
    let to: Vec<Component<'_>> = target.components().collect();
    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let ups = std::iter::repeat_n("..".to_string(), from.len() - common);
    let downs = to[common..]
        .iter()
        .map(|c| c.as_os_str().to_string_lossy().into_owned());
    ups.chain(downs).collect::<Vec<_>>().join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::test_support::mock_context;

    #[test]
    fn minify_keeps_preformatted_and_script_text() {
        let html = "<!DOCTYPE html>\n<html>\n  <body>\n    <p>Hello   <b>big</b>\n world</p>\n    <pre>  a\n   b</pre>\n    <script>\n  let x = 1;\n</script>\n  </body>\n</html>\n";
        let out = minify(html).unwrap();
        assert!(out.contains("<p>Hello <b>big</b> world</p>"), "got {out}");
        assert!(out.contains("<pre>  a\n   b</pre>"), "got {out}");
        assert!(out.contains("let x = 1;"), "got {out}");
        assert!(!out.contains("\n  <body>"), "got {out}");
    }

    #[test]
    fn space_between_inline_elements_survives() {
        let html = "<p><a href=\"/\">Home</a> <a href=\"/about\">About</a></p>\n<p>Hello <b>big</b> <i>world</i></p>";
        let out = minify(html).unwrap();
        assert!(out.contains("</a> <a"), "got {out}");
        assert!(out.contains("</b> <i>"), "got {out}");
    }

    #[test]
    fn inject_markers_survive_minification() {
        let html = "<html>\n  <head>\n    <!-- inject:js -->\n    <!-- endinject -->\n  </head>\n</html>";
        let out = minify(html).unwrap();
        assert!(out.contains(INJECT_START), "got {out}");
        assert!(out.contains(INJECT_END), "got {out}");
    }

    #[test]
    fn injection_replaces_previous_block_content() {
        let html = "<head><!-- inject:js --><script src=\"old.js\"></script><!-- endinject --></head>";
        let out = inject_scripts(html, &["js/bundle.js".to_string()]);
        assert_eq!(
            out,
            "<head><!-- inject:js --><script src=\"js/bundle.js\"></script><!-- endinject --></head>"
        );
    }

    #[test]
    fn pages_without_markers_are_untouched() {
        let html = "<p>no markers</p>";
        assert_eq!(inject_scripts(html, &["a.js".to_string()]), html);
    }

    #[test]
    fn relative_urls_climb_out_of_subdirectories() {
        assert_eq!(
            relative_url(Path::new("/site/dist"), Path::new("/site/dist/js/bundle.js")),
            "js/bundle.js"
        );
        assert_eq!(
            relative_url(Path::new("/site/dist/blog"), Path::new("/site/dist/js/bundle.js")),
            "../js/bundle.js"
        );
    }

    #[test]
    fn builds_pages_with_scripts_relative_to_each_page() {
        let (fs, ctx) = mock_context();
        fs.add_file(
            "/site/src/index.html",
            "<head>\n  <!-- inject:js -->\n  <!-- endinject -->\n</head>",
        );
        fs.add_file(
            "/site/src/blog/post.html",
            "<head><!-- inject:js --><!-- endinject --></head>",
        );
        fs.add_file("/site/dist/js/bundle.js", "run();");

        let report = run(&ctx).unwrap();
        assert_eq!(report.written.len(), 2);

        let index = ctx.fs.read_to_string(Path::new("/site/dist/index.html")).unwrap();
        assert!(
            index.contains("<!-- inject:js --><script src=\"js/bundle.js\"></script><!-- endinject -->"),
            "got {index}"
        );
        let post = ctx
            .fs
            .read_to_string(Path::new("/site/dist/blog/post.html"))
            .unwrap();
        assert!(post.contains("<script src=\"../js/bundle.js\"></script>"));
    }

    #[test]
    fn running_before_scripts_injects_nothing() {
        let (fs, ctx) = mock_context();
        fs.add_file(
            "/site/src/index.html",
            "<head><!-- inject:js --><!-- endinject --></head>",
        );

        run(&ctx).unwrap();
        let index = ctx.fs.read_to_string(Path::new("/site/dist/index.html")).unwrap();
        assert!(index.contains("<!-- inject:js --><!-- endinject -->"), "got {index}");
        assert!(!index.contains("<script"), "got {index}");
    }
}
