//! Service trait for record operations
//!
//! A [`RecordService`] owns one collection. Implementations decide where the
//! records live; the helpers at the bottom of this module hold the rules
//! every backend applies the same way (system fields, partial updates,
//! uniqueness).

use crate::core::error::{RecordError, ValidationError};
use crate::core::field::FieldValue;
use crate::core::query::{QueryDescriptor, QueryResult};
use crate::core::record::{CREATED_AT_FIELD, ID_FIELD, Record, UPDATED_AT_FIELD};
use crate::core::schema::RecordSchema;
use crate::core::stats::{GroupStats, StatsRequest, group_stats};
use crate::core::validation::ValidationMode;
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

/// Service trait for managing the records of one collection
///
/// Errors are typed ([`RecordError`], [`ValidationError`], ...) and carried
/// inside `anyhow::Error`.
#[async_trait]
pub trait RecordService: Send + Sync {
    /// Schema of the collection this service manages
    fn schema(&self) -> &RecordSchema;

    /// Validate a payload and store it as a new record
    async fn create(&self, payload: Value) -> Result<Record>;

    /// Get a record by ID
    async fn get(&self, id: &Uuid) -> Result<Option<Record>>;

    /// List all records in insertion order
    async fn list(&self) -> Result<Vec<Record>>;

    /// Merge the fields present in `changes` into an existing record
    async fn update(&self, id: &Uuid, changes: Value) -> Result<Record>;

    /// Delete a record
    async fn delete(&self, id: &Uuid) -> Result<()>;

    /// Filter, search, sort and paginate the collection
    async fn query(&self, descriptor: &QueryDescriptor) -> Result<QueryResult>;

    /// Grouped aggregates over the whole collection
    async fn stats(&self, request: &StatsRequest) -> Result<Vec<GroupStats>> {
        let records = self.list().await?;
        Ok(group_stats(&records, request))
    }

    /// Number of records in the collection
    async fn count(&self) -> Result<usize> {
        Ok(self.list().await?.len())
    }
}

/// Build a new record from a create payload
///
/// The result carries a fresh v4 `id` first, then the validated fields,
/// then equal `created_at` and `updated_at` stamps.
pub fn new_record(schema: &RecordSchema, payload: Value) -> Result<Record, ValidationError> {
    let fields = schema.validate(payload, ValidationMode::Create)?;
    let now = Utc::now();

    let mut record = Record::new().with(ID_FIELD, Uuid::new_v4().to_string());
    record.merge(fields);
    record.set(CREATED_AT_FIELD, now);
    record.set(UPDATED_AT_FIELD, now);
    Ok(record)
}

/// Apply a partial update payload to a copy of `existing`
///
/// Fields absent from `changes` keep their value; `id` and `created_at`
/// never change.
pub fn apply_changes(
    schema: &RecordSchema,
    existing: &Record,
    changes: Value,
) -> Result<Record, ValidationError> {
    let fields = schema.validate(changes, ValidationMode::Update)?;

    let mut updated = existing.clone();
    updated.merge(fields);
    updated.set(UPDATED_AT_FIELD, Utc::now());
    Ok(updated)
}

/// Fail if `candidate` shares a unique field value with any of `others`
///
/// A record never conflicts with itself, so `others` may include the stored
/// version of `candidate`.
pub fn check_unique<'a>(
    schema: &RecordSchema,
    candidate: &Record,
    others: impl IntoIterator<Item = &'a Record>,
) -> Result<(), RecordError> {
    let unique: Vec<(&str, &FieldValue)> = schema
        .unique_fields()
        .filter_map(|def| candidate.get(def.name()).map(|v| (def.name(), v)))
        .collect();
    if unique.is_empty() {
        return Ok(());
    }

    let candidate_id = candidate.id();
    for other in others {
        if candidate_id.is_some() && other.id() == candidate_id {
            continue;
        }
        for (field, value) in &unique {
            if other.get(field).is_some_and(|v| v.matches(value)) {
                return Err(RecordError::DuplicateKey {
                    collection: schema.singular().to_string(),
                    field: field.to_string(),
                    value: value.to_string(),
                });
            }
        }
    }
    Ok(())
}
