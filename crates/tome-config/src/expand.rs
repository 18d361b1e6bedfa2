//! `${VAR}` references in string settings.

use std::borrow::Cow;

use crate::ConfigError;

/// Expands braced environment references in config values.
///
/// Only `${VAR}` and `${VAR:-default}` spans are handed to `shellexpand`;
/// text outside them, bare `$org` included, is copied verbatim. Remotes like
/// `git@host:$org/${REPO}.git` therefore keep their literal `$`.
pub(crate) struct EnvExpander<F> {
    lookup: F,
}

impl EnvExpander<fn(&str) -> Option<String>> {
    /// Resolve references against the process environment.
    pub(crate) fn from_process() -> Self {
        Self::new(|name| std::env::var(name).ok())
    }
}

impl<F: Fn(&str) -> Option<String>> EnvExpander<F> {
    pub(crate) fn new(lookup: F) -> Self {
        Self { lookup }
    }

    /// Expand `value` of the setting `field`; an unset variable without a
    /// default is [`ConfigError::EnvVar`] naming `field`.
    pub(crate) fn expand(&self, field: &str, value: &str) -> Result<String, ConfigError> {
        let mut expanded = String::with_capacity(value.len());
        let mut rest = value;
        while let Some(start) = rest.find("${") {
            let Some(len) = rest[start..].find('}') else {
                break;
            };
            let end = start + len + 1;
            expanded.push_str(&rest[..start]);
            expanded.push_str(&self.reference(field, &rest[start..end])?);
            rest = &rest[end..];
        }
        expanded.push_str(rest);
        Ok(expanded)
    }

    /// Expand every element of an argv template, naming each as `field[i]`.
    pub(crate) fn expand_args(&self, field: &str, args: &[String]) -> Result<Vec<String>, ConfigError> {
        args.iter()
            .enumerate()
            .map(|(i, arg)| self.expand(&format!("{field}[{i}]"), arg))
            .collect()
    }

    fn reference(&self, field: &str, reference: &str) -> Result<String, ConfigError> {
        shellexpand::env_with_context(reference, |name| (self.lookup)(name).map(Some).ok_or(()))
            .map(Cow::into_owned)
            .map_err(|err| ConfigError::EnvVar {
                field: field.to_owned(),
                message: format!("{} is not set", err.var_name),
            })
    }
}
