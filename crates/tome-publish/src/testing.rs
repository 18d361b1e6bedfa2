//! Fixture sites for publisher tests.

use std::fs;
use std::path::{Path, PathBuf};

use tome_snapshot::BuildManifest;

pub(crate) const SOURCE_DIGEST: &str = "fixture-sources";

/// Write `pages` under `root/name` and record them as a completed build.
pub(crate) fn built_site(root: &Path, name: &str, pages: &[(&str, &str)]) -> PathBuf {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    for (file, content) in pages {
        let path = dir.join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    let html = pages.iter().filter(|(file, _)| file.ends_with(".html")).count();
    BuildManifest::for_site(&dir, html, SOURCE_DIGEST)
        .unwrap()
        .write(&dir)
        .unwrap();
    dir
}
