//! Text normalisation applied to payload values before parsing
//!
//! A filter sees the raw JSON value of one field. Only strings are
//! rewritten; numbers, booleans and nulls reach the parser unchanged.

use anyhow::Result;
use serde_json::Value;

/// Build a filter that rewrites string values with `f`
fn on_text<F>(f: F) -> impl Fn(&str, Value) -> Result<Value> + Send + Sync + Clone
where
    F: Fn(&str) -> String + Send + Sync + Clone,
{
    move |_field: &str, value: Value| match value {
        Value::String(s) => Ok(Value::String(f(&s))),
        other => Ok(other),
    }
}

/// Strip leading and trailing whitespace
pub fn trim() -> impl Fn(&str, Value) -> Result<Value> + Send + Sync + Clone {
    on_text(|s| s.trim().to_string())
}

pub fn lowercase() -> impl Fn(&str, Value) -> Result<Value> + Send + Sync + Clone {
    on_text(str::to_lowercase)
}

/// Trim, then reduce every inner run of whitespace to one space
///
/// Meant for person names typed by hand: `" Ada   Lovelace "` is stored as
/// `"Ada Lovelace"`.
pub fn collapse_spaces() -> impl Fn(&str, Value) -> Result<Value> + Send + Sync + Clone {
    on_text(|s| s.split_whitespace().collect::<Vec<_>>().join(" "))
}
