//! Schemas of the built-in collections

use crate::core::field::FieldFormat;
use crate::core::query::SortDirection;
use crate::core::schema::{FieldDef, RecordSchema};
use crate::core::validation::{filters, validators};

/// Plural names of every built-in collection
pub const NAMES: [&str; 5] = ["students", "courses", "users", "tasks", "feedback"];

pub const YEAR_LEVELS: [&str; 4] = ["1st Year", "2nd Year", "3rd Year", "4th Year"];
pub const STUDENT_STATUSES: [&str; 3] = ["Active", "Inactive", "Graduated"];
pub const TASK_STATUSES: [&str; 3] = ["pending", "in-progress", "completed"];
pub const FEEDBACK_CATEGORIES: [&str; 4] = ["product", "service", "website", "other"];
pub const RECOMMEND_ANSWERS: [&str; 3] = ["yes", "no", "maybe"];

/// Look up a built-in schema by plural name
pub fn builtin(name: &str) -> Option<RecordSchema> {
    match name {
        "students" => Some(students()),
        "courses" => Some(courses()),
        "users" => Some(users()),
        "tasks" => Some(tasks()),
        "feedback" => Some(feedback()),
        _ => None,
    }
}

/// Every built-in schema, in [`NAMES`] order
pub fn all() -> Vec<RecordSchema> {
    NAMES.iter().filter_map(|name| builtin(name)).collect()
}

pub fn students() -> RecordSchema {
    RecordSchema::new("student", "students")
        .with_field(
            FieldDef::text("student_id")
                .required()
                .unique()
                .filter(filters::trim())
                .validate(validators::min_length(4)),
        )
        .with_field(
            FieldDef::text("full_name")
                .required()
                .filter(filters::collapse_spaces())
                .validate(validators::min_length(2)),
        )
        .with_field(
            FieldDef::text("email")
                .required()
                .filter(filters::trim())
                .validate(validators::format(FieldFormat::Email)),
        )
        .with_field(FieldDef::text("course").filter(filters::trim()))
        .with_field(FieldDef::text("year_level").validate(validators::one_of(&YEAR_LEVELS)))
        .with_field(
            FieldDef::text("status")
                .required()
                .validate(validators::one_of(&STUDENT_STATUSES)),
        )
        .with_field(
            FieldDef::number("grade")
                .validate(validators::min_value(0.0))
                .validate(validators::max_value(100.0)),
        )
        .with_field(FieldDef::date("enrolled_at"))
        .search_on(["full_name", "student_id", "email"])
        .sorted_by("student_id", SortDirection::Ascending)
}

pub fn courses() -> RecordSchema {
    RecordSchema::new("course", "courses")
        .with_field(
            FieldDef::text("name")
                .required()
                .unique()
                .filter(filters::trim())
                .validate(validators::min_length(2)),
        )
        .search_on(["name"])
        .sorted_by("name", SortDirection::Ascending)
}

pub fn users() -> RecordSchema {
    RecordSchema::new("user", "users")
        .with_field(
            FieldDef::text("name")
                .required()
                .filter(filters::collapse_spaces()),
        )
        .with_field(
            FieldDef::text("email")
                .required()
                .unique()
                .filter(filters::trim())
                .filter(filters::lowercase())
                .validate(validators::format(FieldFormat::Email)),
        )
        .with_field(
            FieldDef::text("phone")
                .filter(filters::trim())
                .validate(validators::format(FieldFormat::Phone)),
        )
        .with_field(FieldDef::text("city").filter(filters::trim()))
        .with_field(FieldDef::number("age").validate(validators::min_value(0.0)))
        .with_field(FieldDef::boolean("is_active"))
        .search_on(["name", "email"])
        .sorted_by("name", SortDirection::Ascending)
}

pub fn tasks() -> RecordSchema {
    RecordSchema::new("task", "tasks")
        .with_field(FieldDef::text("title").required().filter(filters::trim()))
        .with_field(FieldDef::text("description"))
        .with_field(FieldDef::text("status").validate(validators::one_of(&TASK_STATUSES)))
        .search_on(["title", "description"])
}

pub fn feedback() -> RecordSchema {
    RecordSchema::new("feedback", "feedback")
        .with_field(
            FieldDef::text("name")
                .required()
                .filter(filters::trim())
                .validate(validators::min_length(2)),
        )
        .with_field(
            FieldDef::text("email")
                .required()
                .filter(filters::trim())
                .validate(validators::format(FieldFormat::Email)),
        )
        .with_field(
            FieldDef::text("category")
                .required()
                .validate(validators::one_of(&FEEDBACK_CATEGORIES)),
        )
        .with_field(
            FieldDef::number("rating")
                .required()
                .validate(validators::min_value(1.0))
                .validate(validators::max_value(5.0)),
        )
        .with_field(
            FieldDef::text("comments")
                .required()
                .validate(validators::min_length(5)),
        )
        .with_field(FieldDef::text("recommend").validate(validators::one_of(&RECOMMEND_ANSWERS)))
        .with_field(FieldDef::date("date"))
        .search_on(["name", "comments"])
        .sorted_by("date", SortDirection::Descending)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ValidationError;
    use crate::core::field::FieldValue;
    use crate::core::validation::ValidationMode;
    use serde_json::json;

    #[test]
    fn test_every_name_resolves() {
        for name in NAMES {
            let schema = builtin(name).unwrap();
            assert_eq!(schema.plural(), name);
        }
        assert!(builtin("invoices").is_none());
        assert_eq!(all().len(), NAMES.len());
    }

    #[test]
    fn test_search_and_sort_fields_exist() {
        for schema in all() {
            for field in schema.search_fields() {
                assert!(schema.has_field(field), "{}.{}", schema.plural(), field);
            }
            if let Some((field, _)) = schema.default_sort() {
                assert!(schema.has_field(field), "{}.{}", schema.plural(), field);
            }
        }
    }

    #[test]
    fn test_student_rules() {
        let schema = students();
        let result = schema.validate(
            json!({
                "student_id": "123",
                "full_name": "J",
                "email": "nope",
                "year_level": "5th Year",
                "status": "Suspended",
                "grade": 101
            }),
            ValidationMode::Create,
        );

        let Err(ValidationError::FieldErrors(errors)) = result else {
            panic!("expected field errors");
        };
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["student_id", "full_name", "email", "year_level", "status", "grade"]
        );
    }

    #[test]
    fn test_user_email_is_normalised() {
        let record = users()
            .validate(
                json!({"name": " Grace   Hopper ", "email": "  Grace@Navy.MIL "}),
                ValidationMode::Create,
            )
            .unwrap();
        assert_eq!(record.get("email"), Some(&FieldValue::from("grace@navy.mil")));
        assert_eq!(record.get("name"), Some(&FieldValue::from("Grace Hopper")));
    }

    #[test]
    fn test_feedback_rating_bounds() {
        let base = json!({
            "name": "Alex",
            "email": "alex@example.com",
            "category": "product",
            "comments": "Works well"
        });

        for (rating, ok) in [(0, false), (1, true), (5, true), (6, false)] {
            let mut payload = base.clone();
            payload["rating"] = json!(rating);
            assert_eq!(
                feedback().validate(payload, ValidationMode::Create).is_ok(),
                ok,
                "rating {rating}"
            );
        }
    }
}
