//! Static site generation for Tome books.
//!
//! [`StaticSiteBuilder`] turns a loaded book into an index page plus one
//! page per chapter, in reading order. [`Pipeline`] is the full render
//! operation: load the chapters, validate their samples, build the site.
//!
//! ```no_run
//! use tome_config::Config;
//! use tome_site::Pipeline;
//!
//! let config = Config::load(None, None)?;
//! let report = Pipeline::new(&config).render()?;
//! println!("{} pages in {}", report.pages, report.output_dir.display());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod builder;
mod error;
mod pipeline;
mod sample;
mod template;

pub use builder::{BuildReport, StaticSiteBuilder};
pub use error::BuildError;
pub use pipeline::{Pipeline, RenderReport};
pub use sample::SampleProcessor;
