// tests/integration/fs_abstraction.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use sitepipe::clean::clean;
use sitepipe::config::{FaviconSection, Layout};
use sitepipe::fs::mock::MockFileSystem;
use sitepipe::fs::FileSystem;
use sitepipe::transform::{run_transform, TaskContext};
use sitepipe::types::TaskKind;

fn mock_site() -> (MockFileSystem, TaskContext) {
    let fs = MockFileSystem::new();
    let layout = Layout::new(Path::new("/site"), Path::new("src"), Path::new("dist"));
    let ctx = TaskContext::new(Arc::new(fs.clone()), layout, FaviconSection::default());
    (fs, ctx)
}

#[test]
fn test_mock_fs_scripts_then_html() {
    let (fs, ctx) = mock_site();
    fs.add_file("/site/src/js/a.js", "import { b } from './b.js';\nb();\n");
    fs.add_file("/site/src/js/b.js", "export function b() {}\n");
    fs.add_file(
        "/site/src/blog/post.html",
        "<html>\n  <head>\n    <!-- inject:js --><!-- endinject -->\n  </head>\n</html>\n",
    );

    run_transform(TaskKind::Scripts, &ctx).unwrap();
    let bundle = fs.read_to_string(Path::new("/site/dist/js/bundle.js")).unwrap();
    assert_eq!(bundle, "b();\n\nexport function b() {}\n");

    run_transform(TaskKind::Html, &ctx).unwrap();
    let page = fs.read_to_string(Path::new("/site/dist/blog/post.html")).unwrap();
    assert!(
        page.contains(r#"<!-- inject:js --><script src="../js/bundle.js"></script><!-- endinject -->"#),
        "got {page}"
    );
    assert!(page.contains("<html><head>"), "got {page}");
    assert!(!page.contains('\n'), "got {page}");
}

#[test]
fn test_mock_fs_fonts_and_clean() {
    let (fs, ctx) = mock_site();
    fs.add_file("/site/src/public/fonts/inter.woff2", vec![0u8, 1, 2]);
    fs.add_file("/site/src/public/fonts/notes.txt", "ignored");

    let report = run_transform(TaskKind::Fonts, &ctx).unwrap();
    assert_eq!(
        report.written,
        vec![PathBuf::from("/site/dist/public/fonts/inter.woff2")]
    );

    assert!(clean(&fs, &ctx.layout).unwrap());
    assert!(!fs.exists(Path::new("/site/dist")));
    assert!(fs.exists(Path::new("/site/src/public/fonts/inter.woff2")));
}
