//! Policy value object: validation, canonical document, signing, expiry.
//!
//! A `Policy` is built in one step from a set of options and is immutable
//! afterwards. The canonical JSON document and its encoded form are computed
//! at construction; signatures are computed on demand and the digest for the
//! most recently used secret is kept.
//!
//! Key order in the canonical document is the order options were supplied,
//! so two policies with the same options in a different order sign
//! differently.

mod builder;
mod document;
mod expiry;
mod option;

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde_json::Value;

use crate::codec;
use crate::error::{PolicyError, Result};
use crate::secret::Secret;

pub use builder::PolicyBuilder;
pub use option::{Call, OptionKey, OptionValue};

use document::Document;
use expiry::coerce_expiry;
use option::validate_calls;

/// Default `path` for the positional constructor.
pub const DEFAULT_PATH: &str = ".*";

/// Validate one option by name without building a policy.
///
/// Runs the same checks a constructor runs for that option: the name must be
/// in the allow-list, `call` must be a list of known calls, `expiry` must be
/// time-like. Other options accept any value.
///
/// ```
/// use fspolicy_core::{policy::validate_option, ErrorKind, OptionValue};
///
/// assert!(validate_option("call", &vec!["read", "stat"].into()).is_ok());
/// let err = validate_option("calls", &OptionValue::from("read")).unwrap_err();
/// assert_eq!(err.kind(), ErrorKind::UnknownOption);
/// ```
pub fn validate_option(name: &str, value: &OptionValue) -> Result<()> {
    let key = OptionKey::parse(name)?;
    Draft::default().set(key, value)
}

/// Options accepted so far, in supplied order.
#[derive(Debug, Clone, Default)]
pub(crate) struct Draft {
    order: Vec<OptionKey>,
    call: Option<Vec<Call>>,
    container: Option<Value>,
    expiry: Option<DateTime<Utc>>,
    handle: Option<Value>,
    max_size: Option<Value>,
    min_size: Option<Value>,
    path: Option<Value>,
    url: Option<Value>,
}

impl Draft {
    /// Validate one option and record it. A repeated key keeps its first
    /// position and takes the new value.
    pub(crate) fn set(&mut self, key: OptionKey, value: &OptionValue) -> Result<()> {
        match key {
            OptionKey::Call => self.call = Some(validate_calls(value)?),
            OptionKey::Expiry => self.expiry = Some(coerce_expiry(value)?),
            OptionKey::Container => self.container = Some(value.to_json()),
            OptionKey::Handle => self.handle = Some(value.to_json()),
            OptionKey::MaxSize => self.max_size = Some(value.to_json()),
            OptionKey::MinSize => self.min_size = Some(value.to_json()),
            OptionKey::Path => self.path = Some(value.to_json()),
            OptionKey::Url => self.url = Some(value.to_json()),
        }
        if !self.order.contains(&key) {
            self.order.push(key);
        }
        Ok(())
    }

    pub(crate) fn finish(self, secret: Option<Secret>) -> Result<Policy> {
        let expiry = self
            .expiry
            .ok_or_else(|| PolicyError::expiry("missing required option \"expiry\""))?;

        let mut policy = Policy {
            order: self.order,
            call: self.call,
            container: self.container,
            expiry,
            handle: self.handle,
            max_size: self.max_size,
            min_size: self.min_size,
            path: self.path,
            url: self.url,
            canonical: Vec::new(),
            encoded: String::new(),
            signing: Mutex::new(Signing {
                secret,
                digest: None,
            }),
        };

        policy.canonical = serde_json::to_vec(&Document(&policy))
            .map_err(|e| PolicyError::Encoding(format!("canonical json: {e}")))?;
        policy.encoded = codec::encode(&policy.canonical);

        tracing::debug!(
            keys = policy.order.len(),
            expiry = policy.expiry.timestamp(),
            "policy built"
        );
        Ok(policy)
    }
}

impl From<&Policy> for Draft {
    fn from(p: &Policy) -> Self {
        Self {
            order: p.order.clone(),
            call: p.call.clone(),
            container: p.container.clone(),
            expiry: Some(p.expiry),
            handle: p.handle.clone(),
            max_size: p.max_size.clone(),
            min_size: p.min_size.clone(),
            path: p.path.clone(),
            url: p.url.clone(),
        }
    }
}

/// New expiry for [`Policy::renew`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Renewal {
    /// Expire at this instant.
    At(DateTime<Utc>),
    /// Expire this long after `now`.
    After(Duration),
}

impl From<DateTime<Utc>> for Renewal {
    fn from(t: DateTime<Utc>) -> Self {
        Renewal::At(t)
    }
}

impl From<DateTime<FixedOffset>> for Renewal {
    fn from(t: DateTime<FixedOffset>) -> Self {
        Renewal::At(t.with_timezone(&Utc))
    }
}

impl From<Duration> for Renewal {
    fn from(d: Duration) -> Self {
        Renewal::After(d)
    }
}

/// Only instants convert; a relative renewal is built with
/// [`Renewal::After`] or `Renewal::from(chrono::Duration)`.
impl TryFrom<OptionValue> for Renewal {
    type Error = PolicyError;

    fn try_from(value: OptionValue) -> Result<Self> {
        match value {
            OptionValue::Instant(t) => Ok(Renewal::At(t)),
            OptionValue::ZonedInstant(t) => Ok(Renewal::from(t)),
            other => Err(PolicyError::InvalidArgument(format!(
                "renewal from an option value needs an instant, got {other:?}"
            ))),
        }
    }
}

/// A validated, immutable access policy.
pub struct Policy {
    order: Vec<OptionKey>,
    call: Option<Vec<Call>>,
    container: Option<Value>,
    expiry: DateTime<Utc>,
    handle: Option<Value>,
    max_size: Option<Value>,
    min_size: Option<Value>,
    path: Option<Value>,
    url: Option<Value>,

    canonical: Vec<u8>,
    encoded: String,

    signing: Mutex<Signing>,
}

/// Secret bound at construction or most recently used to sign, and the
/// digest under it once computed. Signing with another secret replaces both.
#[derive(Clone, Default)]
struct Signing {
    secret: Option<Secret>,
    digest: Option<String>,
}

impl Policy {
    /// Build from `(name, value)` pairs, validated in the order given.
    /// The first invalid option aborts construction.
    ///
    /// ```
    /// use fspolicy_core::Policy;
    ///
    /// let policy = Policy::new([
    ///     ("expiry", 1525500000i64.into()),
    ///     ("call", vec!["read", "stat"].into()),
    ///     ("path", "/a/*".into()),
    /// ])
    /// .unwrap();
    /// assert_eq!(
    ///     policy.encoded(),
    ///     "eyJleHBpcnkiOjE1MjU1MDAwMDAsImNhbGwiOlsicmVhZCIsInN0YXQiXSwicGF0aCI6Ii9hLyoifQ=="
    /// );
    /// ```
    pub fn new<I, K>(options: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, OptionValue)>,
        K: AsRef<str>,
    {
        let mut draft = Draft::default();
        for (name, value) in options {
            let key = OptionKey::parse(name.as_ref())?;
            draft.set(key, &value)?;
        }
        draft.finish(None)
    }

    /// Build from a JSON object; key order is preserved.
    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| {
            PolicyError::InvalidArgument("policy options must be a JSON object".into())
        })?;
        Self::new(
            obj.iter()
                .map(|(k, v)| (k.as_str(), OptionValue::from(v.clone()))),
        )
    }

    /// Typed builder; setter call order is the document key order.
    pub fn builder() -> PolicyBuilder {
        PolicyBuilder::default()
    }

    /// Positional form: `expiry`, `call`, `path` in that order, secret bound.
    /// `path: None` means [`DEFAULT_PATH`]; an empty path is left out.
    pub fn for_calls(
        calls: &[Call],
        expiry: impl Into<OptionValue>,
        path: Option<&str>,
        secret: impl Into<Secret>,
    ) -> Result<Self> {
        let mut draft = Draft::default();
        draft.set(OptionKey::Expiry, &expiry.into())?;
        draft.set(OptionKey::Call, &OptionValue::from(calls))?;
        let path = path.unwrap_or(DEFAULT_PATH);
        if !path.is_empty() {
            draft.set(OptionKey::Path, &OptionValue::from(path))?;
        }
        draft.finish(Some(secret.into()))
    }

    pub fn expiry(&self) -> DateTime<Utc> {
        self.expiry
    }

    pub fn calls(&self) -> Option<&[Call]> {
        self.call.as_deref()
    }

    /// Options present in this policy, in document order.
    pub fn keys(&self) -> &[OptionKey] {
        &self.order
    }

    /// An option's value as it appears in the canonical document. Owned,
    /// since `call` and `expiry` are stored typed and rendered here.
    pub fn get(&self, key: OptionKey) -> Option<Value> {
        match key {
            OptionKey::Call => self.call.as_ref().map(|c| {
                Value::from(c.iter().map(|c| c.as_str()).collect::<Vec<_>>())
            }),
            OptionKey::Expiry => Some(Value::from(self.expiry.timestamp())),
            OptionKey::Container => self.container.clone(),
            OptionKey::Handle => self.handle.clone(),
            OptionKey::MaxSize => self.max_size.clone(),
            OptionKey::MinSize => self.min_size.clone(),
            OptionKey::Path => self.path.clone(),
            OptionKey::Url => self.url.clone(),
        }
    }

    pub fn handle(&self) -> Option<&str> {
        self.handle.as_ref().and_then(Value::as_str)
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_ref().and_then(Value::as_str)
    }

    pub fn container(&self) -> Option<&str> {
        self.container.as_ref().and_then(Value::as_str)
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_ref().and_then(Value::as_str)
    }

    pub(crate) fn stored(&self, key: OptionKey) -> Option<&Value> {
        match key {
            OptionKey::Container => self.container.as_ref(),
            OptionKey::Handle => self.handle.as_ref(),
            OptionKey::MaxSize => self.max_size.as_ref(),
            OptionKey::MinSize => self.min_size.as_ref(),
            OptionKey::Path => self.path.as_ref(),
            OptionKey::Url => self.url.as_ref(),
            OptionKey::Call | OptionKey::Expiry => None,
        }
    }

    /// Canonical JSON bytes (the signing input, before encoding).
    pub fn canonical_json(&self) -> &[u8] {
        &self.canonical
    }

    /// Encoded policy, as sent in `policy=`.
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    /// HMAC-SHA256 signature under `secret`. Only the digest for the most
    /// recent secret is memoized, so alternating secrets recomputes.
    /// The secret becomes the one [`Policy::renew`] signs with.
    pub fn sign(&self, secret: &str) -> Result<String> {
        let mut signing = lock(&self.signing);
        if let (Some(bound), Some(digest)) = (&signing.secret, &signing.digest) {
            if bound.expose_secret() == secret {
                tracing::trace!("signature cache hit");
                return Ok(digest.clone());
            }
        }
        let digest = codec::sign(&self.encoded, secret)?;
        *signing = Signing {
            secret: Some(Secret::new(secret)),
            digest: Some(digest.clone()),
        };
        Ok(digest)
    }

    /// Signature under the associated secret.
    pub fn signature(&self) -> Result<String> {
        let secret = self.bound_secret().ok_or(PolicyError::NotSignedYet)?;
        self.sign(secret.expose_secret())
    }

    /// Whether a secret is bound or has been used to sign.
    pub fn is_signed(&self) -> bool {
        lock(&self.signing).secret.is_some()
    }

    fn bound_secret(&self) -> Option<Secret> {
        lock(&self.signing).secret.clone()
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// True iff `now >= expiry`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiry
    }

    pub fn time_until_expiry(&self) -> Duration {
        self.time_until_expiry_at(Utc::now())
    }

    /// `expiry - now`: zero at the expiry instant, negative after it.
    pub fn time_until_expiry_at(&self, now: DateTime<Utc>) -> Duration {
        self.expiry.signed_duration_since(now)
    }

    pub fn renew(&self, to: impl Into<Renewal>) -> Result<Policy> {
        self.renew_at(to, Utc::now())
    }

    /// New policy with the same options and a new expiry, bound to this
    /// policy's secret. `self` is left untouched.
    pub fn renew_at(&self, to: impl Into<Renewal>, now: DateTime<Utc>) -> Result<Policy> {
        let expiry = match to.into() {
            Renewal::At(t) => t,
            Renewal::After(d) => now.checked_add_signed(d).ok_or_else(|| {
                PolicyError::InvalidArgument("renewal duration out of range".into())
            })?,
        };

        let secret = self.bound_secret().ok_or(PolicyError::NotSignedYet)?;

        let mut draft = Draft::from(self);
        draft.set(OptionKey::Expiry, &OptionValue::Instant(expiry))?;
        let renewed = draft.finish(Some(secret))?;

        tracing::debug!(
            from = self.expiry.timestamp(),
            to = renewed.expiry.timestamp(),
            "policy renewed"
        );
        Ok(renewed)
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Clone for Policy {
    fn clone(&self) -> Self {
        Self {
            order: self.order.clone(),
            call: self.call.clone(),
            container: self.container.clone(),
            expiry: self.expiry,
            handle: self.handle.clone(),
            max_size: self.max_size.clone(),
            min_size: self.min_size.clone(),
            path: self.path.clone(),
            url: self.url.clone(),
            canonical: self.canonical.clone(),
            encoded: self.encoded.clone(),
            signing: Mutex::new(lock(&self.signing).clone()),
        }
    }
}

/// Equal when the canonical documents are byte-identical.
impl PartialEq for Policy {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for Policy {}

impl fmt::Debug for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Policy")
            .field("keys", &self.order)
            .field("expiry", &self.expiry)
            .field("encoded", &self.encoded)
            .field("signed", &self.is_signed())
            .finish()
    }
}
