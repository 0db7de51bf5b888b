//! Core module containing the record model, schemas and the query pipeline

pub mod error;
pub mod field;
pub mod pipeline;
pub mod query;
pub mod record;
pub mod schema;
pub mod service;
pub mod sql;
pub mod stats;
pub mod validation;

pub use error::{RecordbookError, ValidationError};
pub use field::{FieldFormat, FieldType, FieldValue};
pub use pipeline::RecordQueryPipeline;
pub use query::{PaginatedResponse, PaginationMeta, QueryDescriptor, QueryResult, SortDirection};
pub use record::Record;
pub use schema::{FieldDef, RecordSchema};
pub use service::RecordService;
pub use stats::{GroupStats, StatsRequest};
