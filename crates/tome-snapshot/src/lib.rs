//! Rendered document sets on disk.
//!
//! A build writes its pages into a staging directory, records a
//! [`BuildManifest`] next to them and swaps the directory into place. A
//! publish later reads the manifest back and refuses any directory that
//! was not produced by a complete build, or was edited after one.
//!
//! ```no_run
//! use std::path::Path;
//! use tome_snapshot::BuildManifest;
//!
//! let manifest = BuildManifest::verify(Path::new("book"))?;
//! println!("{} pages built at {}", manifest.pages, manifest.built_at);
//! # Ok::<(), tome_snapshot::SnapshotError>(())
//! ```

mod error;
mod manifest;
mod tree;

pub use error::SnapshotError;
pub use manifest::{BuildManifest, MANIFEST_FILE};
pub use tree::{
    copy_tree, discard, list_files, remove_dir_if_exists, sibling, snapshot_digest,
    swap_into_place, timestamp,
};
