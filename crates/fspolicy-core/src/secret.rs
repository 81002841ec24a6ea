//! Redacting wrapper for signing secrets.

use std::fmt;

use serde::{Deserialize, Deserializer};

/// A signing secret that never shows up in `Debug`/`Display` output.
///
/// Policies keep the secret they were bound to (or last signed with) so that
/// `renew` can sign the successor. Anything that formats a `Policy` for logs
/// goes through this type and prints `[REDACTED]`.
///
/// ```
/// use fspolicy_core::Secret;
///
/// let secret = Secret::new("app-secret");
/// assert_eq!(format!("{secret:?}"), "[REDACTED]");
/// assert_eq!(secret.expose_secret(), "app-secret");
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Secret {
    inner: String,
}

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            inner: value.into(),
        }
    }

    /// Explicit access to the raw secret. Do not log the result.
    pub fn expose_secret(&self) -> &str {
        &self.inner
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Secret::new)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}
