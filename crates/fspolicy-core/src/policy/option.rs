//! Policy option names, the call vocabulary, and input values.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PolicyError, Result};

/// The eight options a policy may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKey {
    Call,
    Container,
    Expiry,
    Handle,
    MaxSize,
    MinSize,
    Path,
    Url,
}

impl OptionKey {
    /// Allow-list, in schema order.
    pub const ALL: [OptionKey; 8] = [
        OptionKey::Call,
        OptionKey::Container,
        OptionKey::Expiry,
        OptionKey::Handle,
        OptionKey::MaxSize,
        OptionKey::MinSize,
        OptionKey::Path,
        OptionKey::Url,
    ];

    /// Wire name (JSON key).
    pub fn as_str(self) -> &'static str {
        match self {
            OptionKey::Call => "call",
            OptionKey::Container => "container",
            OptionKey::Expiry => "expiry",
            OptionKey::Handle => "handle",
            OptionKey::MaxSize => "maxSize",
            OptionKey::MinSize => "minSize",
            OptionKey::Path => "path",
            OptionKey::Url => "url",
        }
    }

    /// Resolve a supplied option name against the allow-list.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "call" => Ok(OptionKey::Call),
            "container" => Ok(OptionKey::Container),
            "expiry" => Ok(OptionKey::Expiry),
            "handle" => Ok(OptionKey::Handle),
            "maxSize" => Ok(OptionKey::MaxSize),
            "minSize" => Ok(OptionKey::MinSize),
            "path" => Ok(OptionKey::Path),
            "url" => Ok(OptionKey::Url),
            other => Err(PolicyError::UnknownOption {
                option: other.to_string(),
            }),
        }
    }

    pub(crate) fn allowed_list() -> String {
        OptionKey::ALL
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote operations a policy can grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Call {
    #[serde(rename = "convert")]
    Convert,
    #[serde(rename = "exif")]
    Exif,
    #[serde(rename = "pick")]
    Pick,
    #[serde(rename = "read")]
    Read,
    #[serde(rename = "remove")]
    Remove,
    #[serde(rename = "stat")]
    Stat,
    #[serde(rename = "store")]
    Store,
    #[serde(rename = "write")]
    Write,
    #[serde(rename = "writeUrl")]
    WriteUrl,
}

impl Call {
    pub const ALL: [Call; 9] = [
        Call::Convert,
        Call::Exif,
        Call::Pick,
        Call::Read,
        Call::Remove,
        Call::Stat,
        Call::Store,
        Call::Write,
        Call::WriteUrl,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Call::Convert => "convert",
            Call::Exif => "exif",
            Call::Pick => "pick",
            Call::Read => "read",
            Call::Remove => "remove",
            Call::Stat => "stat",
            Call::Store => "store",
            Call::Write => "write",
            Call::WriteUrl => "writeUrl",
        }
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Call {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self> {
        Call::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| PolicyError::invalid_calls(vec![s.to_string()]))
    }
}

/// A caller-supplied option value of not-yet-validated shape.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Text(String),
    Integer(i64),
    List(Vec<String>),
    /// UTC instant, used as-is for `expiry`.
    Instant(DateTime<Utc>),
    /// Instant with a fixed offset; converted to the same UTC point.
    ZonedInstant(DateTime<FixedOffset>),
    /// Any other JSON value.
    Json(Value),
}

impl OptionValue {
    /// Rendering used in the canonical document for options other than
    /// `call` and `expiry`.
    pub(crate) fn to_json(&self) -> Value {
        match self {
            OptionValue::Text(s) => Value::String(s.clone()),
            OptionValue::Integer(n) => Value::from(*n),
            OptionValue::List(items) => Value::from(items.clone()),
            OptionValue::Instant(t) => Value::from(t.timestamp()),
            OptionValue::ZonedInstant(t) => Value::from(t.timestamp()),
            OptionValue::Json(v) => v.clone(),
        }
    }
}

impl From<&str> for OptionValue {
    fn from(v: &str) -> Self {
        OptionValue::Text(v.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(v: String) -> Self {
        OptionValue::Text(v)
    }
}

impl From<i64> for OptionValue {
    fn from(v: i64) -> Self {
        OptionValue::Integer(v)
    }
}

impl From<i32> for OptionValue {
    fn from(v: i32) -> Self {
        OptionValue::Integer(i64::from(v))
    }
}

impl From<u32> for OptionValue {
    fn from(v: u32) -> Self {
        OptionValue::Integer(i64::from(v))
    }
}

impl From<u64> for OptionValue {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(n) => OptionValue::Integer(n),
            Err(_) => OptionValue::Json(Value::from(v)),
        }
    }
}

impl From<Vec<&str>> for OptionValue {
    fn from(v: Vec<&str>) -> Self {
        OptionValue::List(v.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for OptionValue {
    fn from(v: Vec<String>) -> Self {
        OptionValue::List(v)
    }
}

impl From<&[Call]> for OptionValue {
    fn from(v: &[Call]) -> Self {
        OptionValue::List(v.iter().map(|c| c.as_str().to_string()).collect())
    }
}

impl From<Vec<Call>> for OptionValue {
    fn from(v: Vec<Call>) -> Self {
        OptionValue::from(v.as_slice())
    }
}

impl From<DateTime<Utc>> for OptionValue {
    fn from(v: DateTime<Utc>) -> Self {
        OptionValue::Instant(v)
    }
}

impl From<DateTime<FixedOffset>> for OptionValue {
    fn from(v: DateTime<FixedOffset>) -> Self {
        OptionValue::ZonedInstant(v)
    }
}

impl From<Value> for OptionValue {
    fn from(v: Value) -> Self {
        match v {
            Value::String(s) => OptionValue::Text(s),
            Value::Number(n) if n.is_i64() => match n.as_i64() {
                Some(i) => OptionValue::Integer(i),
                None => OptionValue::Json(Value::Number(n)),
            },
            Value::Array(items) if items.iter().all(Value::is_string) => OptionValue::List(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            ),
            other => OptionValue::Json(other),
        }
    }
}

/// Check a `call` value: must be a list and every entry must be a known call.
/// All unknown entries are reported together.
pub(crate) fn validate_calls(value: &OptionValue) -> Result<Vec<Call>> {
    let names: Vec<String> = match value {
        OptionValue::List(items) => items.clone(),
        OptionValue::Json(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        _ => return Err(PolicyError::call_not_a_list()),
    };

    let mut calls = Vec::with_capacity(names.len());
    let mut invalid = Vec::new();
    for name in names {
        match Call::ALL.iter().find(|c| c.as_str() == name) {
            Some(c) => calls.push(*c),
            None => invalid.push(name),
        }
    }

    if !invalid.is_empty() {
        return Err(PolicyError::invalid_calls(invalid));
    }
    Ok(calls)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::panic)]

    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn option_keys_round_trip_through_wire_names() {
        for key in OptionKey::ALL {
            assert_eq!(OptionKey::parse(key.as_str()).unwrap(), key);
        }
        let err = OptionKey::parse("max_size").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownOption);
        assert!(err.to_string().contains(
            "call, container, expiry, handle, maxSize, minSize, path, url"
        ));
    }

    #[test]
    fn call_names_are_case_sensitive() {
        assert_eq!("writeUrl".parse::<Call>().unwrap(), Call::WriteUrl);
        assert!("writeurl".parse::<Call>().is_err());
        assert_eq!(
            serde_json::to_string(&Call::WriteUrl).unwrap(),
            "\"writeUrl\""
        );
    }

    #[test]
    fn all_invalid_calls_reported_together() {
        let value = OptionValue::from(vec!["read", "fly", "stat", "swim"]);
        match validate_calls(&value).unwrap_err() {
            PolicyError::InvalidCallList { invalid, detail } => {
                assert_eq!(invalid, vec!["fly", "swim"]);
                assert_eq!(detail, "fly, swim");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn call_must_be_a_list() {
        let err = validate_calls(&OptionValue::from("read")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCallList);
    }

    #[test]
    fn json_arrays_with_non_strings_are_rejected_by_value() {
        let value = OptionValue::from(serde_json::json!(["read", 7]));
        match validate_calls(&value).unwrap_err() {
            PolicyError::InvalidCallList { invalid, .. } => assert_eq!(invalid, vec!["7"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
