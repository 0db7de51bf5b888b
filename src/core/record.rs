//! Records: ordered field-name to value mappings

use crate::core::field::FieldValue;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Field holding the record identifier (a UUID rendered as text)
pub const ID_FIELD: &str = "id";
/// Field holding the creation timestamp
pub const CREATED_AT_FIELD: &str = "created_at";
/// Field holding the last-update timestamp
pub const UPDATED_AT_FIELD: &str = "updated_at";

/// One schema-conforming entity (a student, a feedback entry, ...)
///
/// Field order is insertion order and is preserved through serialization.
/// A field that is absent from the mapping is "missing"; there is no null.
///
/// `Deserialize` is schema-less: each value takes the first [`FieldValue`]
/// variant that accepts it, so a text field holding an RFC 3339 string comes
/// back as a date. Use [`RecordSchema::decode`] to read records with their
/// declared types.
///
/// [`RecordSchema::decode`]: crate::core::schema::RecordSchema::decode
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: IndexMap<String, FieldValue>,
}

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Get a field value by name
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Set a field, replacing any previous value in place
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Remove a field, keeping the order of the remaining ones
    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.shift_remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over `(name, value)` pairs in field order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Copy every field of `changes` into this record
    pub fn merge(&mut self, changes: Record) {
        for (name, value) in changes.fields {
            self.fields.insert(name, value);
        }
    }

    /// The record identifier, when present and well-formed
    pub fn id(&self) -> Option<Uuid> {
        self.get(ID_FIELD)
            .and_then(FieldValue::as_text)
            .and_then(|s| Uuid::parse_str(s).ok())
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.get(CREATED_AT_FIELD).and_then(FieldValue::as_date)
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.get(UPDATED_AT_FIELD).and_then(FieldValue::as_date)
    }

    /// Render the record as a JSON object
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl FromIterator<(String, FieldValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Record
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect()
    }
}
