//! Snapshot publishing for rendered Tome books.
//!
//! A [`Publisher`] replaces the single current snapshot at its destination
//! with a rendered document set, atomically: [`GitPublisher`] force-pushes
//! one parentless commit, [`DirectoryPublisher`] swaps a staged copy into
//! place. [`PublishGuard`] decides from a [`TriggerContext`] whether the
//! current run may publish at all.
//!
//! Only directories written by a complete build are accepted: the build
//! manifest must be present and match the files on disk, and
//! [`require_current`] additionally ties it to the current sources.
//!
//! ```no_run
//! use std::path::Path;
//! use tome_publish::{
//!     Credential, GitPublisher, PublishGuard, Publisher, TriggerContext, TriggerFlags,
//! };
//!
//! PublishGuard::new("main").check(&TriggerContext::resolve(TriggerFlags::default()))?;
//! let credential = Credential::from_env("GITHUB_TOKEN")?;
//! let report = GitPublisher::new("https://github.com/acme/book.git", "gh-pages")
//!     .publish(Path::new("book"), &credential)?;
//! println!("published {} files", report.files);
//! # Ok::<(), tome_publish::PublishError>(())
//! ```

mod credential;
mod directory;
mod error;
mod git;
mod publisher;
#[cfg(test)]
mod testing;
mod trigger;

pub use credential::Credential;
pub use directory::DirectoryPublisher;
pub use error::PublishError;
pub use git::GitPublisher;
pub use publisher::{PublishReport, Publisher, require_current};
pub use tome_snapshot::snapshot_digest;
pub use trigger::{PublishGuard, TriggerContext, TriggerFlags};
