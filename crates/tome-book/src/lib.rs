//! Chapter model and loading for Tome books.
//!
//! A book is a directory of Markdown chapters. Each chapter carries an
//! ordinal position (front matter `position:` or a numeric filename prefix)
//! that defines reading order, and its body is split into prose and fenced
//! code samples annotated with a validation [`Directive`].
//!
//! # Example
//!
//! ```no_run
//! use tome_book::{Book, LanguageSupport};
//!
//! let book = Book::load("src", LanguageSupport::default().with_language("rust", true))?;
//! for chapter in &book.chapters {
//!     println!("{} {}", chapter.position, chapter.title);
//! }
//! # Ok::<(), tome_book::BookError>(())
//! ```

mod chapter;
mod error;
mod fence;
mod front_matter;
mod hidden;
mod loader;

pub use chapter::{Chapter, CodeSample, ContentBlock, LanguageSupport};
pub use error::BookError;
pub use fence::{Directive, FenceInfo};
pub use hidden::{compile_source, display_source};
pub use loader::{Book, BookLoader};
