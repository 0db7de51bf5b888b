//! Field value types and validation

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

/// Semantic type of a field, fixed per collection by its schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Boolean,
    Date,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
        };
        f.write_str(name)
    }
}

/// A typed scalar value stored in a record
///
/// Values are resolved against the collection schema once, at the boundary,
/// so comparisons dispatch on the variant instead of re-parsing strings.
///
/// Untagged deserialization tries `Date` before `Text` and cannot know the
/// field's declared type. Typed reads go through [`FieldValue::from_json`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Boolean(bool),
    Number(f64),
    Date(DateTime<Utc>),
    Text(String),
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Boolean(b) => serializer.serialize_bool(*b),
            FieldValue::Number(n) => match as_whole_number(*n) {
                Some(i) => serializer.serialize_i64(i),
                None => serializer.serialize_f64(*n),
            },
            FieldValue::Date(d) => serializer.serialize_str(&format_date(d)),
            FieldValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl FieldValue {
    /// The semantic type of this value
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::Text(_) => FieldType::Text,
            FieldValue::Number(_) => FieldType::Number,
            FieldValue::Boolean(_) => FieldType::Boolean,
            FieldValue::Date(_) => FieldType::Date,
        }
    }

    /// Get the value as a string if possible
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as a number if possible
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the value as a boolean if possible
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the value as an instant if possible
    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Render the value the way it is shown and searched
    ///
    /// Whole numbers render without a fractional part (`85`, not `85.0`) and
    /// dates render as RFC 3339 with millisecond precision and a `Z` suffix.
    pub fn to_search_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Number(n) => format_number(*n),
            FieldValue::Boolean(b) => b.to_string(),
            FieldValue::Date(d) => format_date(d),
        }
    }

    /// Case-insensitive substring match against an already lowercased needle
    pub fn contains_text(&self, needle_lowercase: &str) -> bool {
        self.to_search_text()
            .to_lowercase()
            .contains(needle_lowercase)
    }

    /// Type-aware equality
    ///
    /// Values of different types never match: a text `"85"` is not equal to
    /// the number `85`.
    pub fn matches(&self, other: &FieldValue) -> bool {
        match (self, other) {
            (FieldValue::Number(a), FieldValue::Number(b)) => a == b,
            (FieldValue::Text(a), FieldValue::Text(b)) => a == b,
            (FieldValue::Boolean(a), FieldValue::Boolean(b)) => a == b,
            (FieldValue::Date(a), FieldValue::Date(b)) => a == b,
            _ => false,
        }
    }

    /// Ordering used by the sort stage
    ///
    /// Numbers compare numerically, dates by instant, booleans with
    /// `false < true`. Anything else, including mixed types, falls back to
    /// lexicographic order of the rendered text.
    pub fn compare(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::Number(a), FieldValue::Number(b)) => a.total_cmp(b),
            (FieldValue::Date(a), FieldValue::Date(b)) => a.cmp(b),
            (FieldValue::Boolean(a), FieldValue::Boolean(b)) => a.cmp(b),
            (FieldValue::Text(a), FieldValue::Text(b)) => a.cmp(b),
            _ => self.to_search_text().cmp(&other.to_search_text()),
        }
    }

    /// Parse a raw JSON value into a value of the given type
    ///
    /// Strings are accepted for every type so that query-string parameters
    /// (`age=30`, `is_active=true`) resolve the same way JSON bodies do.
    /// Returns `None` when the value cannot represent the type.
    pub fn from_json(field_type: FieldType, value: &Value) -> Option<FieldValue> {
        match field_type {
            FieldType::Text => match value {
                Value::String(s) => Some(FieldValue::Text(s.clone())),
                _ => None,
            },
            FieldType::Number => match value {
                Value::Number(n) => n.as_f64().map(FieldValue::Number),
                Value::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .map(FieldValue::Number),
                _ => None,
            },
            FieldType::Boolean => match value {
                Value::Bool(b) => Some(FieldValue::Boolean(*b)),
                Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" => Some(FieldValue::Boolean(true)),
                    "false" => Some(FieldValue::Boolean(false)),
                    _ => None,
                },
                _ => None,
            },
            FieldType::Date => value.as_str().and_then(parse_date).map(FieldValue::Date),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_search_text())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Number(f64::from(value))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Date(value)
    }
}

/// Parse an ISO-8601 date or date-time into a UTC instant
///
/// Accepts RFC 3339 (`2024-05-01T10:00:00Z`, with any offset), a naive
/// date-time (`2024-05-01T10:00:00`, read as UTC) or a plain date
/// (`2024-05-01`, read as midnight UTC).
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn format_date(d: &DateTime<Utc>) -> String {
    d.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn as_whole_number(n: f64) -> Option<i64> {
    // 2^53: beyond this f64 cannot represent every integer exactly
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    if n.fract() == 0.0 && n.abs() <= MAX_EXACT {
        Some(n as i64)
    } else {
        None
    }
}

fn format_number(n: f64) -> String {
    match as_whole_number(n) {
        Some(i) => i.to_string(),
        None => n.to_string(),
    }
}

/// String formats checked by the `format` validator
#[derive(Debug, Clone)]
pub enum FieldFormat {
    Email,
    Url,
    Phone,
    Custom(Regex),
}

impl FieldFormat {
    /// Validate a field value against this format
    ///
    /// Only text values can satisfy a format.
    pub fn validate(&self, value: &FieldValue) -> bool {
        let Some(string_value) = value.as_text() else {
            return false;
        };

        match self {
            FieldFormat::Email => Self::is_valid_email(string_value),
            FieldFormat::Url => Self::is_valid_url(string_value),
            FieldFormat::Phone => Self::is_valid_phone(string_value),
            FieldFormat::Custom(regex) => regex.is_match(string_value),
        }
    }

    /// Short name used in validation messages
    pub fn describe(&self) -> &str {
        match self {
            FieldFormat::Email => "email address",
            FieldFormat::Url => "URL",
            FieldFormat::Phone => "phone number",
            FieldFormat::Custom(regex) => regex.as_str(),
        }
    }

    fn is_valid_email(email: &str) -> bool {
        static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = EMAIL_REGEX.get_or_init(|| {
            Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
                .expect("email pattern is valid")
        });
        regex.is_match(email)
    }

    fn is_valid_url(url: &str) -> bool {
        static URL_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = URL_REGEX.get_or_init(|| {
            Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").expect("url pattern is valid")
        });
        regex.is_match(url)
    }

    fn is_valid_phone(phone: &str) -> bool {
        static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = PHONE_REGEX.get_or_init(|| {
            // 8 to 15 digits, optional leading + (E.164)
            Regex::new(r"^\+?[1-9]\d{7,14}$").expect("phone pattern is valid")
        });
        regex.is_match(phone)
    }
}
