//! Canonical JSON document.
//!
//! Keys are written in the policy's recorded order, `expiry` as integer epoch
//! seconds and `call` as a string array in supplied order. Absent options are
//! omitted (no nulls). serde_json writes `/` unescaped, which matches the
//! recorded wire vectors.

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::{OptionKey, Policy};

pub(crate) struct Document<'a>(pub(crate) &'a Policy);

impl Serialize for Document<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let policy = self.0;
        let mut map = serializer.serialize_map(Some(policy.order.len()))?;
        for key in &policy.order {
            match key {
                OptionKey::Expiry => {
                    map.serialize_entry(key.as_str(), &policy.expiry.timestamp())?;
                }
                OptionKey::Call => {
                    if let Some(calls) = &policy.call {
                        map.serialize_entry(key.as_str(), calls)?;
                    }
                }
                other => {
                    if let Some(value) = policy.stored(*other) {
                        map.serialize_entry(key.as_str(), value)?;
                    }
                }
            }
        }
        map.end()
    }
}
