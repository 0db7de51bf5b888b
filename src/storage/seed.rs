//! Loading initial records into a collection
//!
//! Seeds go through [`RecordService::create`] like any other payload, so
//! they are validated and stamped with fresh ids. Seeding twice is harmless
//! for collections with a unique field: the second run skips duplicates.

use crate::config::read_file;
use crate::core::error::{ConfigError, RecordError, ValidationError};
use crate::core::service::RecordService;
use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tracing::{info, warn};

/// Outcome of a seeding run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub inserted: usize,
    /// Payloads that clashed with an existing unique value
    pub duplicates: usize,
    /// Payloads that failed validation
    pub invalid: usize,
}

/// Read a JSON file holding an array of record payloads
pub fn load_seed_file(path: impl AsRef<Path>) -> Result<Vec<Value>, ConfigError> {
    let path = path.as_ref();
    let content = read_file(path)?;

    let parse_error = |message: String| ConfigError::ParseError {
        file: Some(path.display().to_string()),
        message,
    };

    match serde_json::from_str::<Value>(&content).map_err(|e| parse_error(e.to_string()))? {
        Value::Array(items) => Ok(items),
        _ => Err(parse_error("expected a JSON array of objects".to_string())),
    }
}

/// Create every payload through `service`
///
/// Duplicate and invalid payloads are logged and counted. Any other failure
/// aborts the run.
pub async fn seed_records(service: &dyn RecordService, payloads: Vec<Value>) -> Result<SeedReport> {
    let collection = service.schema().plural().to_string();
    let mut report = SeedReport::default();

    for payload in payloads {
        match service.create(payload).await {
            Ok(_) => report.inserted += 1,
            Err(e) if matches!(
                e.downcast_ref::<RecordError>(),
                Some(RecordError::DuplicateKey { .. })
            ) =>
            {
                report.duplicates += 1;
                warn!(%collection, error = %e, "skipping seed record");
            }
            Err(e) if e.downcast_ref::<ValidationError>().is_some() => {
                report.invalid += 1;
                warn!(%collection, error = %e, "skipping invalid seed record");
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        %collection,
        inserted = report.inserted,
        duplicates = report.duplicates,
        invalid = report.invalid,
        "seeded collection"
    );
    Ok(report)
}
