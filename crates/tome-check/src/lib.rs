//! Code sample validation for Tome books.
//!
//! Every fenced sample carries a directive: `Run` samples must build and
//! exit successfully, `BuildOnly` samples must build, `CompileFail` samples
//! must be rejected by the compiler, and `Ignore` samples are illustrative.
//! [`Checker`] enforces these with one [`Toolchain`] per language.
//!
//! ```no_run
//! use tome_book::{Book, LanguageSupport};
//! use tome_check::Checker;
//! use tome_config::CheckConfig;
//!
//! let config = CheckConfig::default();
//! let book = Book::load("src", LanguageSupport::default().with_language("rust", true))?;
//! let report = Checker::from_config(&config).check(&book)?;
//! println!("{} samples validated", report.validated);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod checker;
mod error;
mod toolchain;
mod wrap;

pub use checker::{CheckReport, Checker};
pub use error::{CheckError, SampleFailure, ToolchainError};
pub use toolchain::{CommandToolchain, Outcome, Toolchain};
pub use wrap::wrap_main;
