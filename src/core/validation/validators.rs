//! Reusable field validators
//!
//! Validators only look at the values they understand: a length check
//! ignores numbers, a range check ignores text. Type mismatches are caught
//! earlier, when the raw value is parsed against the schema.

use crate::core::field::{FieldFormat, FieldValue};

/// Validator: text must have at least `min` characters
pub fn min_length(min: usize) -> impl Fn(&FieldValue) -> Result<(), String> + Send + Sync + Clone {
    move |value: &FieldValue| match value.as_text() {
        Some(s) if s.chars().count() < min => Err(format!(
            "must be at least {} characters (got {})",
            min,
            s.chars().count()
        )),
        _ => Ok(()),
    }
}

/// Validator: text must have at most `max` characters
pub fn max_length(max: usize) -> impl Fn(&FieldValue) -> Result<(), String> + Send + Sync + Clone {
    move |value: &FieldValue| match value.as_text() {
        Some(s) if s.chars().count() > max => Err(format!(
            "must not exceed {} characters (got {})",
            max,
            s.chars().count()
        )),
        _ => Ok(()),
    }
}

/// Validator: text must match a format
pub fn format(format: FieldFormat) -> impl Fn(&FieldValue) -> Result<(), String> + Send + Sync + Clone {
    move |value: &FieldValue| {
        if value.as_text().is_none() || format.validate(value) {
            Ok(())
        } else {
            Err(format!("must be a valid {}", format.describe()))
        }
    }
}

/// Validator: number must be at least `min`
pub fn min_value(min: f64) -> impl Fn(&FieldValue) -> Result<(), String> + Send + Sync + Clone {
    move |value: &FieldValue| match value.as_number() {
        Some(n) if n < min => Err(format!("must be at least {} (got {})", min, value)),
        _ => Ok(()),
    }
}

/// Validator: number must not exceed `max`
pub fn max_value(max: f64) -> impl Fn(&FieldValue) -> Result<(), String> + Send + Sync + Clone {
    move |value: &FieldValue| match value.as_number() {
        Some(n) if n > max => Err(format!("must be at most {} (got {})", max, value)),
        _ => Ok(()),
    }
}

/// Validator: text must be one of the allowed values
pub fn one_of(
    allowed: &[&str],
) -> impl Fn(&FieldValue) -> Result<(), String> + Send + Sync + Clone + use<> {
    let allowed: Vec<String> = allowed.iter().map(|s| s.to_string()).collect();
    move |value: &FieldValue| match value.as_text() {
        Some(s) if !allowed.iter().any(|a| a == s) => Err(format!(
            "must be one of: {} (got {})",
            allowed.join(", "),
            s
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> FieldValue {
        FieldValue::from(s)
    }

    // === min_length() / max_length() ===

    #[test]
    fn test_min_length_too_short_returns_error() {
        let v = min_length(4);
        let result = v(&text("123"));
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("at least 4"));
    }

    #[test]
    fn test_min_length_exact_returns_ok() {
        let v = min_length(4);
        assert!(v(&text("2021")).is_ok());
    }

    #[test]
    fn test_min_length_counts_characters_not_bytes() {
        let v = min_length(3);
        assert!(v(&text("Zoé")).is_ok());
        let v = max_length(3);
        assert!(v(&text("Zoé")).is_ok());
    }

    #[test]
    fn test_max_length_too_long_returns_error() {
        let v = max_length(5);
        let result = v(&text("abcdef"));
        assert!(result.unwrap_err().contains("exceed 5"));
    }

    #[test]
    fn test_length_non_text_passthrough() {
        assert!(min_length(5)(&FieldValue::Number(1.0)).is_ok());
        assert!(max_length(0)(&FieldValue::Boolean(true)).is_ok());
    }

    // === format() ===

    #[test]
    fn test_format_email() {
        let v = format(FieldFormat::Email);
        assert!(v(&text("john.doe@example.com")).is_ok());
        let result = v(&text("not-an-email"));
        assert_eq!(result.unwrap_err(), "must be a valid email address");
    }

    #[test]
    fn test_format_non_text_passthrough() {
        let v = format(FieldFormat::Phone);
        assert!(v(&FieldValue::Number(42.0)).is_ok());
    }

    // === min_value() / max_value() ===

    #[test]
    fn test_min_value_below_returns_error() {
        let v = min_value(0.0);
        let result = v(&FieldValue::Number(-1.0));
        assert!(result.unwrap_err().contains("at least 0"));
    }

    #[test]
    fn test_min_value_equal_returns_ok() {
        let v = min_value(1.0);
        assert!(v(&FieldValue::Number(1.0)).is_ok());
    }

    #[test]
    fn test_max_value_over_returns_error() {
        let v = max_value(100.0);
        let result = v(&FieldValue::Number(101.0));
        assert!(result.unwrap_err().contains("at most 100"));
    }

    #[test]
    fn test_range_non_number_passthrough() {
        assert!(max_value(1.0)(&text("hello")).is_ok());
        assert!(min_value(1.0)(&text("hello")).is_ok());
    }

    // === one_of() ===

    #[test]
    fn test_one_of_accepts_listed_value() {
        let v = one_of(&["Active", "Inactive", "Graduated"]);
        assert!(v(&text("Graduated")).is_ok());
    }

    #[test]
    fn test_one_of_rejects_other_value() {
        let v = one_of(&["Active", "Inactive"]);
        let result = v(&text("Expelled"));
        assert!(result.unwrap_err().contains("Active, Inactive"));
    }

    #[test]
    fn test_one_of_is_case_sensitive() {
        let v = one_of(&["yes", "no", "maybe"]);
        assert!(v(&text("Yes")).is_err());
    }

    #[test]
    fn test_one_of_empty_list_rejects_all_text() {
        let v = one_of(&[]);
        assert!(v(&text("anything")).is_err());
    }
}
