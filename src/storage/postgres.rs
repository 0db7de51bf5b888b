//! PostgreSQL storage backend using sqlx.
//!
//! Provides `PostgresRecordService`, a [`RecordService`] backed by a
//! PostgreSQL database via `sqlx::PgPool`. List queries are translated by
//! [`SqlQuery`] and run in the database instead of in memory.
//!
//! # Feature flag
//!
//! This module is gated behind the `postgres` feature flag:
//! ```toml
//! [dependencies]
//! recordbook = { version = "0.1", features = ["postgres"] }
//! ```
//!
//! # Schema
//!
//! All collections share one `records` table. System fields are columns;
//! user fields are stored in a JSONB `data` column. `seq` records insertion
//! order.
//!
//! Writes that touch unique fields run in a transaction holding a
//! transaction-level advisory lock on the collection name, so a uniqueness
//! check and the write that follows it cannot interleave with another
//! writer's.

use crate::core::error::{RecordError, StorageError};
use crate::core::query::{QueryDescriptor, QueryResult};
use crate::core::record::{CREATED_AT_FIELD, ID_FIELD, Record, UPDATED_AT_FIELD};
use crate::core::schema::RecordSchema;
use crate::core::service::{RecordService, apply_changes, new_record};
use crate::core::sql::{RECORD_COLUMNS, SqlParam, SqlQuery};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

type RecordRow = (Uuid, Value, DateTime<Utc>, DateTime<Utc>);

// ---------------------------------------------------------------------------
// Schema management
// ---------------------------------------------------------------------------

/// Apply the required table and indexes (idempotent).
///
/// Safe to call on every startup.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS records (
            seq BIGSERIAL PRIMARY KEY,
            id UUID NOT NULL UNIQUE,
            collection TEXT NOT NULL,
            data JSONB NOT NULL DEFAULT '{}'::jsonb,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        )",
    )
    .execute(pool)
    .await
    .map_err(storage_error("create records table"))?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_records_collection ON records (collection, seq)")
        .execute(pool)
        .await
        .map_err(storage_error("create records index"))?;

    Ok(())
}

fn storage_error(operation: &'static str) -> impl FnOnce(sqlx::Error) -> anyhow::Error {
    move |e| {
        StorageError::OperationFailed {
            operation: operation.to_string(),
            message: e.to_string(),
        }
        .into()
    }
}

macro_rules! bind_params {
    ($query:expr, $params:expr) => {{
        let mut query = $query;
        for param in $params {
            query = match param {
                SqlParam::Text(v) => query.bind(v.clone()),
                SqlParam::Float(v) => query.bind(*v),
                SqlParam::Bool(v) => query.bind(*v),
                SqlParam::Timestamp(v) => query.bind(*v),
                SqlParam::BigInt(v) => query.bind(*v),
            };
        }
        query
    }};
}

/// Record storage service backed by PostgreSQL.
#[derive(Clone, Debug)]
pub struct PostgresRecordService {
    pool: PgPool,
    schema: Arc<RecordSchema>,
}

impl PostgresRecordService {
    /// Create a new `PostgresRecordService` with the given connection pool.
    pub fn new(pool: PgPool, schema: RecordSchema) -> Self {
        Self {
            pool,
            schema: Arc::new(schema),
        }
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn not_found(&self, id: &Uuid) -> anyhow::Error {
        RecordError::NotFound {
            collection: self.schema.singular().to_string(),
            id: *id,
        }
        .into()
    }

    /// Open a write transaction, serialised per collection
    async fn begin_write(&self) -> Result<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await.map_err(storage_error("begin"))?;
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(self.schema.plural())
            .execute(&mut *tx)
            .await
            .map_err(storage_error("collection lock"))?;
        Ok(tx)
    }

    /// Reject `record` if another row holds one of its unique values
    ///
    /// Only meaningful inside a transaction from [`Self::begin_write`].
    async fn ensure_unique(&self, conn: &mut PgConnection, record: &Record) -> Result<()> {
        let id = record
            .id()
            .ok_or_else(|| anyhow!("Record is missing its id"))?;

        for def in self.schema.unique_fields() {
            let Some(value) = record.get(def.name()) else {
                continue;
            };
            let taken: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM records
                 WHERE collection = $1 AND data->$2::text = $3 AND id <> $4)",
            )
            .bind(self.schema.plural())
            .bind(def.name())
            .bind(serde_json::to_value(value)?)
            .bind(id)
            .fetch_one(&mut *conn)
            .await
            .map_err(storage_error("uniqueness check"))?;

            if taken {
                return Err(RecordError::DuplicateKey {
                    collection: self.schema.singular().to_string(),
                    field: def.name().to_string(),
                    value: value.to_string(),
                }
                .into());
            }
        }
        Ok(())
    }
}

/// User fields of `record` as the JSONB `data` object
pub fn record_data(schema: &RecordSchema, record: &Record) -> Value {
    let data: Map<String, Value> = record
        .iter()
        .filter(|(name, _)| schema.field(name).is_some())
        .filter_map(|(name, value)| {
            serde_json::to_value(value)
                .ok()
                .map(|v| (name.to_string(), v))
        })
        .collect();
    Value::Object(data)
}

/// Rebuild a record from a `records` row
pub fn row_to_record(schema: &RecordSchema, row: RecordRow) -> Record {
    let (id, data, created_at, updated_at) = row;

    let mut record = Record::new().with(ID_FIELD, id.to_string());
    record.merge(schema.decode(&data));
    record.set(CREATED_AT_FIELD, created_at);
    record.set(UPDATED_AT_FIELD, updated_at);
    record
}

#[async_trait]
impl RecordService for PostgresRecordService {
    fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    async fn create(&self, payload: Value) -> Result<Record> {
        let record = new_record(&self.schema, payload)?;
        let mut tx = self.begin_write().await?;
        self.ensure_unique(&mut *tx, &record).await?;

        let id = record
            .id()
            .ok_or_else(|| anyhow!("New record is missing its id"))?;
        let created_at = record.created_at().unwrap_or_else(Utc::now);

        sqlx::query(
            "INSERT INTO records (id, collection, data, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $4)",
        )
        .bind(id)
        .bind(self.schema.plural())
        .bind(record_data(&self.schema, &record))
        .bind(created_at)
        .execute(&mut *tx)
        .await
        .map_err(storage_error("insert"))?;
        tx.commit().await.map_err(storage_error("commit"))?;

        debug!(collection = self.schema.plural(), %id, "record created");
        Ok(record)
    }

    async fn get(&self, id: &Uuid) -> Result<Option<Record>> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM records WHERE collection = $1 AND id = $2");
        let row = sqlx::query_as::<_, RecordRow>(&sql)
            .bind(self.schema.plural())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error("select"))?;

        Ok(row.map(|row| row_to_record(&self.schema, row)))
    }

    async fn list(&self) -> Result<Vec<Record>> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM records WHERE collection = $1 ORDER BY seq");
        let rows = sqlx::query_as::<_, RecordRow>(&sql)
            .bind(self.schema.plural())
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error("select"))?;

        Ok(rows
            .into_iter()
            .map(|row| row_to_record(&self.schema, row))
            .collect())
    }

    async fn update(&self, id: &Uuid, changes: Value) -> Result<Record> {
        let mut tx = self.begin_write().await?;

        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM records WHERE collection = $1 AND id = $2 FOR UPDATE"
        );
        let existing = sqlx::query_as::<_, RecordRow>(&sql)
            .bind(self.schema.plural())
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(storage_error("select"))?
            .map(|row| row_to_record(&self.schema, row))
            .ok_or_else(|| self.not_found(id))?;

        let updated = apply_changes(&self.schema, &existing, changes)?;
        self.ensure_unique(&mut *tx, &updated).await?;

        let result = sqlx::query(
            "UPDATE records SET data = $1, updated_at = $2 WHERE collection = $3 AND id = $4",
        )
        .bind(record_data(&self.schema, &updated))
        .bind(updated.updated_at().unwrap_or_else(Utc::now))
        .bind(self.schema.plural())
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(storage_error("update"))?;

        if result.rows_affected() == 0 {
            return Err(self.not_found(id));
        }
        tx.commit().await.map_err(storage_error("commit"))?;

        debug!(collection = self.schema.plural(), %id, "record updated");
        Ok(updated)
    }

    async fn delete(&self, id: &Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM records WHERE collection = $1 AND id = $2")
            .bind(self.schema.plural())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage_error("delete"))?;

        if result.rows_affected() == 0 {
            return Err(self.not_found(id));
        }

        debug!(collection = self.schema.plural(), %id, "record deleted");
        Ok(())
    }

    async fn query(&self, descriptor: &QueryDescriptor) -> Result<QueryResult> {
        descriptor.validate()?;
        let sql = SqlQuery::from_descriptor(&self.schema, descriptor);

        let total: i64 = bind_params!(sqlx::query_scalar::<sqlx::Postgres, i64>(&sql.count), sql.count_params())
            .fetch_one(&self.pool)
            .await
            .map_err(storage_error("count"))?;

        let rows: Vec<RecordRow> =
            bind_params!(sqlx::query_as::<sqlx::Postgres, RecordRow>(&sql.select), &sql.params)
                .fetch_all(&self.pool)
                .await
                .map_err(storage_error("select"))?;

        let items = rows
            .into_iter()
            .map(|row| row_to_record(&self.schema, row))
            .collect();

        Ok(QueryResult::new(
            items,
            usize::try_from(total).unwrap_or(0),
            descriptor.page,
            descriptor.page_size,
        ))
    }

    async fn count(&self) -> Result<usize> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM records WHERE collection = $1")
            .bind(self.schema.plural())
            .fetch_one(&self.pool)
            .await
            .map_err(storage_error("count"))?;

        Ok(usize::try_from(total).unwrap_or(0))
    }
}
