//! Collection schemas
//!
//! A [`RecordSchema`] names a collection, declares its typed fields and the
//! rules attached to them, and says which fields free-text search looks at.
//! Every record additionally carries the system fields `id`, `created_at`
//! and `updated_at`, which are managed by the storage layer.

use crate::core::error::ValidationError;
use crate::core::field::{FieldType, FieldValue};
use crate::core::query::SortDirection;
use crate::core::record::{CREATED_AT_FIELD, ID_FIELD, Record, UPDATED_AT_FIELD};
use crate::core::validation::{FieldFilter, FieldValidator, ValidationMode, validate_payload};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Fields present on every stored record
pub const SYSTEM_FIELDS: [(&str, FieldType); 3] = [
    (ID_FIELD, FieldType::Text),
    (CREATED_AT_FIELD, FieldType::Date),
    (UPDATED_AT_FIELD, FieldType::Date),
];

/// Definition of one user-supplied field
#[derive(Clone)]
pub struct FieldDef {
    name: String,
    field_type: FieldType,
    required: bool,
    unique: bool,
    filters: Vec<FieldFilter>,
    validators: Vec<FieldValidator>,
}

impl fmt::Debug for FieldDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDef")
            .field("name", &self.name)
            .field("field_type", &self.field_type)
            .field("required", &self.required)
            .field("unique", &self.unique)
            .field("filters", &self.filters.len())
            .field("validators", &self.validators.len())
            .finish()
    }
}

impl FieldDef {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
            unique: false,
            filters: Vec::new(),
            validators: Vec::new(),
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Text)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Number)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Date)
    }

    /// The field must be present (and non-empty) when a record is created
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// No two records of the collection may hold the same value
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Add a filter, run on the raw value before parsing
    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&str, Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.filters.push(Arc::new(filter));
        self
    }

    /// Add a validator, run on the parsed value
    pub fn validate<V>(mut self, validator: V) -> Self
    where
        V: Fn(&FieldValue) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validators.push(Arc::new(validator));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn filters(&self) -> &[FieldFilter] {
        &self.filters
    }

    pub fn validators(&self) -> &[FieldValidator] {
        &self.validators
    }
}

/// Schema of one collection
///
/// # Example
/// ```rust,ignore
/// let schema = RecordSchema::new("course", "courses")
///     .with_field(FieldDef::text("name").required().unique())
///     .search_on(["name"])
///     .sorted_by("name", SortDirection::Ascending);
/// ```
#[derive(Debug, Clone)]
pub struct RecordSchema {
    singular: String,
    plural: String,
    fields: IndexMap<String, FieldDef>,
    search_fields: Vec<String>,
    default_sort: Option<(String, SortDirection)>,
}

impl RecordSchema {
    pub fn new(singular: impl Into<String>, plural: impl Into<String>) -> Self {
        Self {
            singular: singular.into(),
            plural: plural.into(),
            fields: IndexMap::new(),
            search_fields: Vec::new(),
            default_sort: None,
        }
    }

    /// Add a field; a later definition with the same name replaces the earlier one
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    /// Fields consulted by free-text search
    pub fn search_on<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Ordering applied when a list request does not ask for one
    pub fn sorted_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.default_sort = Some((field.into(), direction));
        self
    }

    pub fn singular(&self) -> &str {
        &self.singular
    }

    pub fn plural(&self) -> &str {
        &self.plural
    }

    /// User-defined fields, in declaration order
    pub fn fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.values()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.get(name)
    }

    /// Type of a user-defined or system field
    pub fn field_type(&self, name: &str) -> Option<FieldType> {
        self.fields.get(name).map(FieldDef::field_type).or_else(|| {
            SYSTEM_FIELDS
                .iter()
                .find(|(system, _)| *system == name)
                .map(|(_, field_type)| *field_type)
        })
    }

    /// Whether `name` can be filtered or sorted on
    pub fn has_field(&self, name: &str) -> bool {
        self.field_type(name).is_some()
    }

    pub fn unique_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.values().filter(|f| f.is_unique())
    }

    pub fn search_fields(&self) -> &[String] {
        &self.search_fields
    }

    pub fn default_sort(&self) -> Option<(&str, SortDirection)> {
        self.default_sort
            .as_ref()
            .map(|(field, direction)| (field.as_str(), *direction))
    }

    /// Validate a request body and turn it into a typed record
    ///
    /// The returned record holds only user-defined fields.
    pub fn validate(&self, payload: Value, mode: ValidationMode) -> Result<Record, ValidationError> {
        validate_payload(self, payload, mode)
    }

    /// Rebuild a record from its stored JSON form
    ///
    /// Used for rows that were validated on the way in; values that no longer
    /// parse against the schema are dropped instead of failing the read.
    pub fn decode(&self, stored: &Value) -> Record {
        let Some(object) = stored.as_object() else {
            return Record::new();
        };

        let system_first = std::iter::once((ID_FIELD, FieldType::Text));
        let user_fields = self
            .fields
            .values()
            .map(|f| (f.name.as_str(), f.field_type));
        let timestamps = SYSTEM_FIELDS[1..].iter().copied();

        system_first
            .chain(user_fields)
            .chain(timestamps)
            .filter_map(|(name, field_type)| {
                object
                    .get(name)
                    .and_then(|raw| FieldValue::from_json(field_type, raw))
                    .map(|value| (name.to_string(), value))
            })
            .collect()
    }

    /// Serializable description used by the collections listing
    pub fn summary(&self) -> SchemaSummary {
        SchemaSummary {
            name: self.plural.clone(),
            singular: self.singular.clone(),
            fields: self
                .fields
                .values()
                .map(|f| FieldSummary {
                    name: f.name.clone(),
                    field_type: f.field_type,
                    required: f.required,
                    unique: f.unique,
                })
                .collect(),
            search_fields: self.search_fields.clone(),
            default_sort: self
                .default_sort
                .as_ref()
                .map(|(field, direction)| format!("{field}:{direction}")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemaSummary {
    pub name: String,
    pub singular: String,
    pub fields: Vec<FieldSummary>,
    pub search_fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_sort: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    pub unique: bool,
}
