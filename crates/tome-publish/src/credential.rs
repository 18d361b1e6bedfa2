//! Push credentials.

use std::fmt;

use crate::error::PublishError;

const REDACTED: &str = "***";

/// Token used to authenticate the push.
///
/// The secret never appears in `Debug` output; use [`Credential::redact`]
/// on any text that may have seen it.
#[derive(Clone)]
pub struct Credential {
    token: String,
}

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Read the token from environment variable `var`.
    ///
    /// An unset or blank variable is [`PublishError::MissingCredential`].
    pub fn from_env(var: &str) -> Result<Self, PublishError> {
        Self::from_lookup(var, |name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(
        var: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, PublishError> {
        match lookup(var) {
            Some(token) if !token.trim().is_empty() => Ok(Self::new(token.trim())),
            _ => Err(PublishError::MissingCredential(var.to_owned())),
        }
    }

    pub(crate) fn secret(&self) -> &str {
        &self.token
    }

    /// Replace every occurrence of the token in `text`.
    #[must_use]
    pub fn redact(&self, text: &str) -> String {
        if self.token.is_empty() {
            text.to_owned()
        } else {
            text.replace(&self.token, REDACTED)
        }
    }

    /// Remote URL carrying the token, for `https://` remotes.
    ///
    /// Other remotes (ssh, file, local paths) authenticate on their own and
    /// are returned unchanged, as are URLs that already carry user info.
    pub(crate) fn authenticate(&self, remote: &str) -> String {
        let Some(rest) = remote.strip_prefix("https://") else {
            return remote.to_owned();
        };
        let authority = rest.split('/').next().unwrap_or_default();
        if authority.contains('@') {
            return remote.to_owned();
        }
        format!("https://x-access-token:{}@{rest}", self.token)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &REDACTED)
            .finish()
    }
}
