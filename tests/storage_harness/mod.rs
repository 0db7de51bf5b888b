//! Shared test harness for storage backend testing
//!
//! Provides a `members` schema with one field of every [`FieldType`], payload
//! helpers, and the `record_service_tests!` contract suite.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//! use storage_harness::*;
//! ```

#![allow(dead_code)]

#[macro_use]
pub mod record_service_tests;

use recordbook::core::validation::{filters, validators};
use recordbook::prelude::*;

/// Schema covering every field type, with one unique field
pub fn members_schema() -> RecordSchema {
    RecordSchema::new("member", "members")
        .with_field(FieldDef::text("name").required().filter(filters::trim()))
        .with_field(
            FieldDef::text("email")
                .required()
                .unique()
                .filter(filters::lowercase())
                .validate(validators::format(FieldFormat::Email)),
        )
        .with_field(FieldDef::number("age").validate(validators::min_value(0.0)))
        .with_field(FieldDef::number("score"))
        .with_field(FieldDef::boolean("active"))
        .with_field(FieldDef::date("joined"))
        .search_on(["name", "email"])
}

pub fn member(name: &str, email: &str, age: i64, score: f64, active: bool) -> Value {
    json!({
        "name": name,
        "email": email,
        "age": age,
        "score": score,
        "active": active,
        "joined": "2024-01-15"
    })
}

/// `count` distinct valid payloads
pub fn sample_batch(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            member(
                &format!("Member {i}"),
                &format!("member{i}@test.com"),
                20 + i as i64,
                i as f64 * 1.5,
                i % 2 == 0,
            )
        })
        .collect()
}

pub fn text<'a>(record: &'a Record, field: &str) -> Option<&'a str> {
    record.get(field).and_then(FieldValue::as_text)
}

pub fn number(record: &Record, field: &str) -> Option<f64> {
    record.get(field).and_then(FieldValue::as_number)
}

pub fn names(records: &[Record]) -> Vec<&str> {
    records.iter().filter_map(|r| text(r, "name")).collect()
}
