//! Typed construction for policies.

use crate::error::Result;
use crate::secret::Secret;

use super::{Call, Draft, OptionKey, OptionValue, Policy};

/// Collects options in call order and validates them on [`build`](Self::build).
///
/// ```
/// use fspolicy_core::{Call, Policy};
///
/// let policy = Policy::builder()
///     .expiry(1525500000i64)
///     .call([Call::Read, Call::Stat])
///     .path("/a/*")
///     .build()
///     .unwrap();
/// assert_eq!(policy.path(), Some("/a/*"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PolicyBuilder {
    options: Vec<(OptionKey, OptionValue)>,
    secret: Option<Secret>,
}

impl PolicyBuilder {
    pub fn call(self, calls: impl IntoIterator<Item = Call>) -> Self {
        let calls: Vec<Call> = calls.into_iter().collect();
        self.option(OptionKey::Call, calls)
    }

    pub fn expiry(self, expiry: impl Into<OptionValue>) -> Self {
        self.option(OptionKey::Expiry, expiry)
    }

    pub fn handle(self, handle: impl Into<OptionValue>) -> Self {
        self.option(OptionKey::Handle, handle)
    }

    pub fn path(self, path: impl Into<OptionValue>) -> Self {
        self.option(OptionKey::Path, path)
    }

    pub fn container(self, container: impl Into<OptionValue>) -> Self {
        self.option(OptionKey::Container, container)
    }

    pub fn url(self, url: impl Into<OptionValue>) -> Self {
        self.option(OptionKey::Url, url)
    }

    pub fn min_size(self, size: impl Into<OptionValue>) -> Self {
        self.option(OptionKey::MinSize, size)
    }

    pub fn max_size(self, size: impl Into<OptionValue>) -> Self {
        self.option(OptionKey::MaxSize, size)
    }

    /// Set any option by key.
    pub fn option(mut self, key: OptionKey, value: impl Into<OptionValue>) -> Self {
        self.options.push((key, value.into()));
        self
    }

    /// Bind a secret so the built policy can be signed and renewed without
    /// passing it again.
    pub fn secret(mut self, secret: impl Into<Secret>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    pub fn build(self) -> Result<Policy> {
        let mut draft = Draft::default();
        for (key, value) in &self.options {
            draft.set(*key, value)?;
        }
        draft.finish(self.secret)
    }
}
