//! In-memory implementation of RecordService for testing and development

use crate::core::error::RecordError;
use crate::core::pipeline::RecordQueryPipeline;
use crate::core::query::{QueryDescriptor, QueryResult};
use crate::core::record::Record;
use crate::core::schema::RecordSchema;
use crate::core::service::{RecordService, apply_changes, check_unique, new_record};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::{Arc, RwLock};
use tracing::debug;
use uuid::Uuid;

/// In-memory record service implementation
///
/// Records are kept in insertion order. Uses RwLock for thread-safe access;
/// queries run on a snapshot taken under the read lock, so a slow query
/// never blocks writers.
#[derive(Clone)]
pub struct InMemoryRecordService {
    schema: Arc<RecordSchema>,
    records: Arc<RwLock<IndexMap<Uuid, Record>>>,
}

impl InMemoryRecordService {
    /// Create an empty service for a collection
    pub fn new(schema: RecordSchema) -> Self {
        Self {
            schema: Arc::new(schema),
            records: Arc::new(RwLock::new(IndexMap::new())),
        }
    }

    fn snapshot(&self) -> Result<Vec<Record>> {
        let records = self
            .records
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(records.values().cloned().collect())
    }

    fn not_found(&self, id: &Uuid) -> RecordError {
        RecordError::NotFound {
            collection: self.schema.singular().to_string(),
            id: *id,
        }
    }
}

#[async_trait]
impl RecordService for InMemoryRecordService {
    fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    async fn create(&self, payload: Value) -> Result<Record> {
        let record = new_record(&self.schema, payload)?;
        let id = record
            .id()
            .ok_or_else(|| anyhow!("New record is missing its id"))?;

        let mut records = self
            .records
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        check_unique(&self.schema, &record, records.values())?;
        records.insert(id, record.clone());

        debug!(collection = self.schema.plural(), %id, "record created");
        Ok(record)
    }

    async fn get(&self, id: &Uuid) -> Result<Option<Record>> {
        let records = self
            .records
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(records.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Record>> {
        self.snapshot()
    }

    async fn update(&self, id: &Uuid, changes: Value) -> Result<Record> {
        let mut records = self
            .records
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let existing = records.get(id).ok_or_else(|| self.not_found(id))?;
        let updated = apply_changes(&self.schema, existing, changes)?;
        check_unique(&self.schema, &updated, records.values())?;

        // Replacing an existing key keeps its position
        records.insert(*id, updated.clone());

        debug!(collection = self.schema.plural(), %id, "record updated");
        Ok(updated)
    }

    async fn delete(&self, id: &Uuid) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        records
            .shift_remove(id)
            .ok_or_else(|| self.not_found(id))?;

        debug!(collection = self.schema.plural(), %id, "record deleted");
        Ok(())
    }

    async fn query(&self, descriptor: &QueryDescriptor) -> Result<QueryResult> {
        descriptor.validate()?;
        let records = self.snapshot()?;
        Ok(RecordQueryPipeline::execute(&records, descriptor))
    }

    async fn count(&self) -> Result<usize> {
        let records = self
            .records
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(records.len())
    }
}
