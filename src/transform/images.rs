// src/transform/images.rs

//! Lossless-ish image optimisation for `public/images`.
//!
//! | ext   | treatment                                   |
//! |-------|---------------------------------------------|
//! | `png` | re-encoded, best compression, adaptive filter |
//! | `jpg` | re-encoded at quality [`JPEG_QUALITY`]      |
//! | `svg` | re-serialised by `usvg` without indentation |
//! | `ico` | copied                                      |
//!
//! The optimised bytes are only kept when they are smaller than the
//! original. A file that fails to decode is copied unchanged. SVGs with
//! `<text>` are always copied, since the writer has no font support.

use std::path::{Path, PathBuf};

use anyhow::Context;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ImageFormat};
use rayon::prelude::*;

use crate::errors::Result;
use crate::transform::sources::{collect_sources, output_path};
use crate::transform::{TaskContext, TransformReport};
use crate::types::TaskKind;

pub const JPEG_QUALITY: u8 = 85;

enum Outcome {
    Optimised,
    Unchanged,
    Copied(String),
}

pub fn run(ctx: &TaskContext) -> Result<TransformReport> {
    let base = ctx.layout.source_base(TaskKind::Images);
    let out_dir = ctx.layout.output_dir(TaskKind::Images);
    let sources = collect_sources(ctx.fs.as_ref(), &ctx.layout, TaskKind::Images)?;

    let results: Vec<(PathBuf, PathBuf, Result<Outcome>)> = sources
        .par_iter()
        .map(|source| {
            let out = output_path(&base, &out_dir, source);
            let outcome = process_one(ctx, source, &out);
            (source.clone(), out, outcome)
        })
        .collect();

    let mut report = TransformReport::default();
    for (source, out, outcome) in results {
        match outcome? {
            Outcome::Optimised | Outcome::Unchanged => report.wrote(out),
            Outcome::Copied(reason) => {
                report.skip(source, format!("optimisation failed, copied as-is: {reason}"));
                report.wrote(out);
            }
        }
    }
    Ok(report)
}

fn process_one(ctx: &TaskContext, source: &Path, out: &Path) -> Result<Outcome> {
    let original = ctx.fs.read(source)?;
    let (bytes, outcome) = match optimise(source, &original) {
        Ok(Some(smaller)) if smaller.len() < original.len() => (smaller, Outcome::Optimised),
        Ok(_) => (original, Outcome::Unchanged),
        Err(err) => (original, Outcome::Copied(format!("{err:#}"))),
    };
    ctx.fs.write(out, &bytes)?;
    Ok(outcome)
}

/// Optimised bytes for one file, or `None` for formats that are copied.
fn optimise(path: &Path, bytes: &[u8]) -> anyhow::Result<Option<Vec<u8>>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "png" => {
            let img = image::load_from_memory_with_format(bytes, ImageFormat::Png)
                .context("decoding png")?;
            encode_png(&img).map(Some)
        }
        "jpg" => {
            let img = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)
                .context("decoding jpeg")?;
            encode_jpeg(&img).map(Some)
        }
        "svg" => optimise_svg(bytes),
        _ => Ok(None),
    }
}

pub(crate) fn encode_png(img: &DynamicImage) -> anyhow::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut buf, CompressionType::Best, FilterType::Adaptive);
    img.write_with_encoder(encoder).context("encoding png")?;
    Ok(buf)
}

fn encode_jpeg(img: &DynamicImage) -> anyhow::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY);
    DynamicImage::ImageRgb8(img.to_rgb8())
        .write_with_encoder(encoder)
        .context("encoding jpeg")?;
    Ok(buf)
}

/// Parse and write back without indentation, which drops comments and
/// formatting whitespace.
fn optimise_svg(bytes: &[u8]) -> anyhow::Result<Option<Vec<u8>>> {
    let text = std::str::from_utf8(bytes).context("svg is not utf-8")?;
    if text.contains("<text") {
        return Ok(None);
    }

    let tree = usvg::Tree::from_data(bytes, &usvg::Options::default()).context("parsing svg")?;
    let write_options = usvg::WriteOptions {
        indent: usvg::Indent::None,
        ..Default::default()
    };
    Ok(Some(tree.to_string(&write_options).into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::test_support::mock_context;
    use image::{Rgb, RgbImage};

    fn flat_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([10, 20, 30]));
        let mut buf = Vec::new();
        let encoder = PngEncoder::new_with_quality(&mut buf, CompressionType::Fast, FilterType::NoFilter);
        DynamicImage::ImageRgb8(img).write_with_encoder(encoder).unwrap();
        buf
    }

    fn chatty_svg() -> String {
        format!(
            "<!-- {} -->\n<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 10 10\">\n    <!-- body -->\n    <rect width=\"10\" height=\"10\"/>\n</svg>\n",
            "exported by a very talkative editor ".repeat(10)
        )
    }

    #[test]
    fn svg_loses_comments_and_indentation() {
        let svg = chatty_svg();
        let out = optimise(Path::new("logo.svg"), svg.as_bytes()).unwrap().unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.len() < svg.len());
        assert!(!out.contains("<!--"), "got {out}");
        assert!(!out.contains('\n'), "got {out}");
        assert!(usvg::Tree::from_data(out.as_bytes(), &usvg::Options::default()).is_ok());
    }

    #[test]
    fn svg_is_written_only_when_smaller() {
        let (fs, ctx) = mock_context();
        let tiny = "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 1 1\"><rect width=\"1\" height=\"1\"/></svg>";
        fs.add_file("/site/src/public/images/chatty.svg", chatty_svg());
        fs.add_file("/site/src/public/images/tiny.svg", tiny);

        let report = run(&ctx).unwrap();
        assert_eq!(report.written.len(), 2);
        assert!(report.skipped.is_empty());

        let chatty = ctx.fs.read(Path::new("/site/dist/public/images/chatty.svg")).unwrap();
        assert!(chatty.len() < chatty_svg().len());
        let kept = ctx.fs.read(Path::new("/site/dist/public/images/tiny.svg")).unwrap();
        assert!(kept.len() <= tiny.len());
    }

    #[test]
    fn svg_with_text_is_copied_unchanged() {
        let (fs, ctx) = mock_context();
        let svg = "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 9 9\">\n  <text x=\"0\" y=\"5\">a <tspan>b</tspan></text>\n</svg>\n";
        fs.add_file("/site/src/public/images/label.svg", svg);

        let report = run(&ctx).unwrap();
        assert!(report.skipped.is_empty());
        assert_eq!(
            ctx.fs.read(Path::new("/site/dist/public/images/label.svg")).unwrap(),
            svg.as_bytes().to_vec()
        );
    }

    #[test]
    fn png_is_recompressed_when_smaller() {
        let (fs, ctx) = mock_context();
        let original = flat_png(64, 64);
        fs.add_file("/site/src/public/images/flat.png", original.clone());

        let report = run(&ctx).unwrap();
        assert_eq!(report.written, vec![PathBuf::from("/site/dist/public/images/flat.png")]);
        assert!(report.skipped.is_empty());

        let written = ctx.fs.read(Path::new("/site/dist/public/images/flat.png")).unwrap();
        assert!(written.len() <= original.len());
        let decoded = image::load_from_memory(&written).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 64));
    }

    #[test]
    fn broken_image_is_copied_unchanged() {
        let (fs, ctx) = mock_context();
        fs.add_file("/site/src/public/images/broken.jpg", "not a jpeg");
        fs.add_file("/site/src/public/images/icon.ico", vec![0u8, 0, 1, 0]);
        fs.add_file("/site/src/public/images/cut.svg", "<svg xmlns=\"http://www.w3.org/2000/svg\"><rect");

        let report = run(&ctx).unwrap();
        assert_eq!(report.written.len(), 3);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(
            ctx.fs.read(Path::new("/site/dist/public/images/broken.jpg")).unwrap(),
            b"not a jpeg".to_vec()
        );
        assert_eq!(
            ctx.fs.read(Path::new("/site/dist/public/images/icon.ico")).unwrap(),
            vec![0u8, 0, 1, 0]
        );
        assert_eq!(
            ctx.fs.read(Path::new("/site/dist/public/images/cut.svg")).unwrap(),
            b"<svg xmlns=\"http://www.w3.org/2000/svg\"><rect".to_vec()
        );
    }
}
