// src/transform/fonts.rs

//! Web fonts are copied byte for byte.

use crate::errors::Result;
use crate::transform::sources::{collect_sources, output_path};
use crate::transform::{TaskContext, TransformReport};
use crate::types::TaskKind;

pub fn run(ctx: &TaskContext) -> Result<TransformReport> {
    let base = ctx.layout.source_base(TaskKind::Fonts);
    let out_dir = ctx.layout.output_dir(TaskKind::Fonts);
    let mut report = TransformReport::default();

    for source in collect_sources(ctx.fs.as_ref(), &ctx.layout, TaskKind::Fonts)? {
        let out = output_path(&base, &out_dir, &source);
        ctx.fs.write(&out, &ctx.fs.read(&source)?)?;
        report.wrote(out);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::test_support::mock_context;
    use std::path::{Path, PathBuf};

    #[test]
    fn copies_woff2_only() {
        let (fs, ctx) = mock_context();
        fs.add_file("/site/src/public/fonts/inter.woff2", vec![1u8, 2, 3]);
        fs.add_file("/site/src/public/fonts/inter.ttf", vec![9u8]);

        let report = run(&ctx).unwrap();
        assert_eq!(report.written, vec![PathBuf::from("/site/dist/public/fonts/inter.woff2")]);
        assert_eq!(
            ctx.fs.read(Path::new("/site/dist/public/fonts/inter.woff2")).unwrap(),
            vec![1u8, 2, 3]
        );
    }
}
