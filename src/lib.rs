//! # recordbook
//!
//! Schema-described record collections served over a REST API, with one
//! query pipeline shared by every collection.
//!
//! ## Features
//!
//! - **Typed records**: text, number, boolean and date fields resolved once
//!   against the collection schema
//! - **Query pipeline**: filter, search, sort and paginate with
//!   deterministic, stable results
//! - **Validation**: per-field filters and validators, all failures
//!   reported together
//! - **Storage backends**: in memory by default, PostgreSQL (JSONB) behind
//!   the `postgres` feature
//! - **Built-in collections**: students, courses, users, tasks and feedback
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use recordbook::prelude::*;
//!
//! let students = InMemoryRecordService::new(catalog::students());
//! students
//!     .create(json!({
//!         "student_id": "20210001",
//!         "full_name": "John Doe",
//!         "email": "john.doe@example.com",
//!         "status": "Active",
//!         "grade": 85
//!     }))
//!     .await?;
//!
//! let page = students
//!     .query(
//!         &QueryDescriptor::new()
//!             .filter_eq("status", "Active")
//!             .sort_by("grade", SortDirection::Descending)
//!             .page(1, 20),
//!     )
//!     .await?;
//!
//! ServerBuilder::new()
//!     .register(students)?
//!     .serve("127.0.0.1:3000")
//!     .await?;
//! ```

pub mod config;
pub mod core;
pub mod entities;
pub mod server;
pub mod storage;
pub mod telemetry;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        error::{
            ConfigError, FieldValidationError, QueryError, RecordError, RecordbookError,
            StorageError, ValidationError,
        },
        field::{FieldFormat, FieldType, FieldValue},
        pipeline::RecordQueryPipeline,
        query::{PaginatedResponse, PaginationMeta, QueryDescriptor, QueryResult, SortDirection},
        record::Record,
        schema::{FieldDef, RecordSchema},
        service::RecordService,
        stats::{GroupStats, StatsRequest, group_stats},
        validation::{ValidationMode, filters, validators},
    };

    // === Collections ===
    pub use crate::entities::{catalog, seeds};

    // === Storage ===
    pub use crate::storage::{InMemoryRecordService, SeedReport, load_seed_file, seed_records};
    #[cfg(feature = "postgres")]
    pub use crate::storage::PostgresRecordService;

    // === Config ===
    pub use crate::config::{AppConfig, CollectionConfig, PaginationConfig, ServerConfig};

    // === Server ===
    pub use crate::server::{CollectionRegistry, ListParams, ServerBuilder};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::{Value, json};
    pub use uuid::Uuid;

    // === Axum ===
    pub use axum::{
        Router,
        routing::{delete, get, post, put},
    };
}
