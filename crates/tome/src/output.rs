//! Status lines on stderr.

use std::fmt::Display;

use console::{Style, Term};
use tome_check::SampleFailure;

/// Writes colored status lines to stderr; stdout stays free for pipes.
pub(crate) struct Output {
    term: Term,
    ok: Style,
    warn: Style,
    fail: Style,
    detail: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            ok: Style::new().green(),
            warn: Style::new().yellow(),
            fail: Style::new().red(),
            detail: Style::new().dim(),
        }
    }

    fn line(&self, text: impl Display) {
        // Nothing useful can be done when stderr is gone.
        let _ = self.term.write_line(&text.to_string());
    }

    pub(crate) fn info(&self, msg: &str) {
        self.line(msg);
    }

    pub(crate) fn success(&self, msg: &str) {
        self.line(self.ok.apply_to(msg));
    }

    pub(crate) fn warning(&self, msg: &str) {
        self.line(self.warn.apply_to(msg));
    }

    pub(crate) fn error(&self, msg: &str) {
        self.line(self.fail.apply_to(msg));
    }

    /// One red line per failed sample, followed by its compiler or program
    /// output, indented and dimmed.
    pub(crate) fn sample_failures(&self, failures: &[SampleFailure]) {
        for failure in failures {
            self.line(self.fail.apply_to(failure));
            for diagnostic in failure.stderr.lines().filter(|l| !l.trim().is_empty()) {
                self.line(self.detail.apply_to(format!("    {diagnostic}")));
            }
        }
    }
}
