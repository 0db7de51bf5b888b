//! Validation and filtering system
//!
//! Each schema field carries a list of filters, which rewrite the raw JSON
//! value before it is parsed (trimming, lowercasing), and a list of
//! validators, which check the parsed [`FieldValue`]. [`validate_payload`]
//! runs both for every field of a request body and collects all failures.

pub mod filters;
pub mod record;
pub mod validators;

use crate::core::field::FieldValue;
use serde_json::Value;
use std::sync::Arc;

pub use record::{ValidationMode, validate_payload};

/// Rewrites a raw field value before it is parsed
pub type FieldFilter = Arc<dyn Fn(&str, Value) -> anyhow::Result<Value> + Send + Sync>;

/// Checks a parsed field value, returning a message on failure
pub type FieldValidator = Arc<dyn Fn(&FieldValue) -> Result<(), String> + Send + Sync>;
