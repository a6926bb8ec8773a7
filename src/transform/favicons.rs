// src/transform/favicons.rs

//! Favicon families generated from the PNGs in `public/favicons`.
//!
//! Which families are produced is controlled by the `[favicons]` config
//! section. Every run also writes `favicons.json`, listing each generated
//! file with its size in bytes. With several source icons, later ones (in
//! path order) overwrite the files of earlier ones.

use std::collections::BTreeMap;

use anyhow::Context;
use image::codecs::ico::{IcoEncoder, IcoFrame};
use image::imageops::FilterType as ResizeFilter;
use image::{DynamicImage, ExtendedColorType};
use serde::Serialize;
use tracing::debug;

use crate::config::FaviconSection;
use crate::errors::Result;
use crate::transform::images::encode_png;
use crate::transform::sources::collect_sources;
use crate::transform::{TaskContext, TransformReport};
use crate::types::TaskKind;

pub const STANDARD_SIZES: [u32; 3] = [16, 32, 48];
pub const APPLE_SIZES: [u32; 10] = [57, 60, 72, 76, 114, 120, 144, 152, 167, 180];
pub const ANDROID_SIZES: [u32; 9] = [36, 48, 72, 96, 144, 192, 256, 384, 512];

pub const METADATA_FILE: &str = "favicons.json";
pub const MANIFEST_FILE: &str = "manifest.webmanifest";

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    name: &'a str,
    short_name: &'a str,
    background_color: &'a str,
    theme_color: &'a str,
    display: &'static str,
    icons: Vec<ManifestIcon>,
}

#[derive(Debug, Serialize)]
struct ManifestIcon {
    src: String,
    sizes: String,
    #[serde(rename = "type")]
    mime: &'static str,
}

#[derive(Debug, Serialize)]
struct Metadata {
    files: BTreeMap<String, usize>,
}

pub fn run(ctx: &TaskContext) -> Result<TransformReport> {
    let out_dir = ctx.layout.output_dir(TaskKind::Favicons);
    let mut generated = BTreeMap::new();
    let mut report = TransformReport::default();

    for source in collect_sources(ctx.fs.as_ref(), &ctx.layout, TaskKind::Favicons)? {
        let bytes = ctx.fs.read(&source)?;
        let icon = match image::load_from_memory(&bytes) {
            Ok(icon) => icon,
            Err(err) => {
                report.skip(source, format!("cannot decode icon: {err}"));
                continue;
            }
        };

        debug!(file = ?source, "generating favicons");
        for (name, contents) in render_all(&icon, &ctx.favicons)? {
            let out = out_dir.join(&name);
            ctx.fs.write(&out, &contents)?;
            generated.insert(name, contents.len());
            report.wrote(out);
        }
    }

    let metadata = serde_json::to_vec_pretty(&Metadata { files: generated })
        .context("serialising favicon metadata")?;
    let meta_path = out_dir.join(METADATA_FILE);
    ctx.fs.write(&meta_path, &metadata)?;
    report.wrote(meta_path);

    Ok(report)
}

/// Every enabled file for one source icon, as `(file name, contents)`.
fn render_all(icon: &DynamicImage, cfg: &FaviconSection) -> Result<Vec<(String, Vec<u8>)>> {
    let mut files = Vec::new();

    if cfg.favicons {
        for size in STANDARD_SIZES {
            files.push((format!("favicon-{size}x{size}.png"), resized_png(icon, size)?));
        }
        files.push(("favicon.ico".to_string(), ico(icon, &STANDARD_SIZES)?));
    }

    if cfg.apple_icon {
        for size in APPLE_SIZES {
            files.push((format!("apple-touch-icon-{size}x{size}.png"), resized_png(icon, size)?));
        }
        files.push(("apple-touch-icon.png".to_string(), resized_png(icon, 180)?));
    }

    if cfg.android {
        let mut icons = Vec::with_capacity(ANDROID_SIZES.len());
        for size in ANDROID_SIZES {
            let name = format!("android-chrome-{size}x{size}.png");
            files.push((name.clone(), resized_png(icon, size)?));
            icons.push(ManifestIcon {
                src: name,
                sizes: format!("{size}x{size}"),
                mime: "image/png",
            });
        }
        let manifest = Manifest {
            name: &cfg.app_name,
            short_name: &cfg.app_name,
            background_color: &cfg.background,
            theme_color: &cfg.theme_color,
            display: "standalone",
            icons,
        };
        let json = serde_json::to_vec_pretty(&manifest).context("serialising web manifest")?;
        files.push((MANIFEST_FILE.to_string(), json));
    }

    Ok(files)
}

fn resized_png(icon: &DynamicImage, size: u32) -> Result<Vec<u8>> {
    let resized = icon.resize_exact(size, size, ResizeFilter::Lanczos3);
    Ok(encode_png(&resized)?)
}

fn ico(icon: &DynamicImage, sizes: &[u32]) -> Result<Vec<u8>> {
    let mut frames = Vec::with_capacity(sizes.len());
    for &size in sizes {
        let rgba = icon.resize_exact(size, size, ResizeFilter::Lanczos3).to_rgba8();
        let frame = IcoFrame::as_png(rgba.as_raw(), size, size, ExtendedColorType::Rgba8)
            .context("encoding ico frame")?;
        frames.push(frame);
    }

    let mut buf = Vec::new();
    IcoEncoder::new(&mut buf)
        .encode_images(&frames)
        .context("encoding ico")?;
    Ok(buf)
}
