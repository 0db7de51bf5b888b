//! Whole-payload validation against a schema

use super::FieldFilter;
use crate::core::error::{FieldValidationError, ValidationError};
use crate::core::field::FieldValue;
use crate::core::record::Record;
use crate::core::schema::{FieldDef, RecordSchema};
use serde_json::Value;

/// Which rules apply to a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Full record: every required field must be present
    Create,
    /// Partial record: only the fields present are checked
    Update,
}

/// Filter, parse and validate every schema field of `payload`
///
/// Keys the schema does not declare (including the system fields) are
/// dropped. All failing fields are reported together.
pub fn validate_payload(
    schema: &RecordSchema,
    payload: Value,
    mode: ValidationMode,
) -> Result<Record, ValidationError> {
    let mut object = match payload {
        Value::Object(object) => object,
        other => {
            return Err(ValidationError::NotAnObject {
                found: json_kind(&other).to_string(),
            });
        }
    };

    let mut record = Record::new();
    let mut errors = Vec::new();

    for def in schema.fields() {
        let name = def.name();
        let present = object.contains_key(name);

        let raw = match object.remove(name) {
            Some(Value::Null) | None => None,
            Some(raw) => match apply_filters(def.filters(), name, raw) {
                Ok(filtered) => Some(filtered),
                Err(e) => {
                    errors.push(FieldValidationError::new(name, e.to_string()));
                    continue;
                }
            },
        };

        // Blank text counts as missing
        let Some(raw) = raw.filter(|v| !is_blank(v)) else {
            if def.is_required() && (mode == ValidationMode::Create || present) {
                errors.push(FieldValidationError::new(name, "is required"));
            }
            continue;
        };

        match parse_and_check(def, &raw) {
            Ok(value) => record.set(name, value),
            Err(mut field_errors) => errors.append(&mut field_errors),
        }
    }

    if errors.is_empty() {
        Ok(record)
    } else {
        Err(ValidationError::FieldErrors(errors))
    }
}

fn apply_filters(filters: &[FieldFilter], name: &str, mut value: Value) -> anyhow::Result<Value> {
    for filter in filters {
        value = filter(name, value)?;
    }
    Ok(value)
}

fn parse_and_check(def: &FieldDef, raw: &Value) -> Result<FieldValue, Vec<FieldValidationError>> {
    let Some(value) = FieldValue::from_json(def.field_type(), raw) else {
        return Err(vec![FieldValidationError::new(
            def.name(),
            type_message(def),
        )]);
    };

    let errors: Vec<FieldValidationError> = def
        .validators()
        .iter()
        .filter_map(|validator| validator(&value).err())
        .map(|message| FieldValidationError::new(def.name(), message))
        .collect();

    if errors.is_empty() {
        Ok(value)
    } else {
        Err(errors)
    }
}

fn type_message(def: &FieldDef) -> String {
    use crate::core::field::FieldType;
    match def.field_type() {
        FieldType::Text => "must be a string".to_string(),
        FieldType::Number => "must be a number".to_string(),
        FieldType::Boolean => "must be a boolean".to_string(),
        FieldType::Date => "must be a valid date (RFC 3339 or YYYY-MM-DD)".to_string(),
    }
}

fn is_blank(value: &Value) -> bool {
    value.as_str().is_some_and(|s| s.trim().is_empty())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
