//! Query-string parameters for list and stats requests
//!
//! ```text
//! GET /api/students?page=2&limit=10
//! GET /api/students?search=jo&sort=-grade
//! GET /api/students?status=Active&year_level=all
//! GET /api/students?filter={"grade>=": 80, "course": "Data Science"}
//! GET /api/users/stats?group_by=city&average=age&flag=is_active
//! ```
//!
//! Parameters are read from the raw `(key, value)` pairs so that any key
//! naming a schema field can act as an equality filter.

use crate::config::PaginationConfig;
use crate::core::error::QueryError;
use crate::core::field::FieldValue;
use crate::core::query::{QueryDescriptor, SortDirection};
use crate::core::schema::RecordSchema;
use crate::core::stats::StatsRequest;
use indexmap::IndexMap;
use serde_json::Value;

const RESERVED: [&str; 5] = ["page", "limit", "search", "sort", "filter"];

/// Value meaning "no filter" in equality parameters
const MATCH_ALL: &str = "all";

/// Parameters of a list request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub search: Option<String>,

    /// `field`, `field:asc`, `field:desc` or `-field`
    pub sort: Option<String>,

    /// JSON object: `{"field": v}`, `{"field>=": n}`, `{"field<=": n}`
    pub filter: Option<String>,

    /// Any other `key=value` pair
    pub equals: IndexMap<String, String>,
}

impl ListParams {
    /// Collect parameters from decoded query-string pairs
    ///
    /// A repeated key keeps its last value.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, QueryError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "page" => params.page = Some(parse_count("page", &value)?),
                "limit" => params.limit = Some(parse_count("limit", &value)?),
                "search" => params.search = Some(value),
                "sort" => params.sort = Some(value),
                "filter" => params.filter = Some(value),
                _ => {
                    params.equals.insert(key, value);
                }
            }
        }
        Ok(params)
    }

    /// Page number, 1 when absent
    pub fn page(&self) -> usize {
        self.page.unwrap_or(1)
    }

    /// Page size, capped at the configured maximum
    ///
    /// An explicit `limit=0` stays 0 and is rejected by [`Self::to_descriptor`].
    pub fn limit(&self, pagination: &PaginationConfig) -> usize {
        pagination.page_size(self.limit)
    }

    /// Resolve every parameter against a schema
    ///
    /// `page=0` and `limit=0` fail with [`QueryError::InvalidPage`] and
    /// [`QueryError::InvalidPageSize`].
    pub fn to_descriptor(
        &self,
        schema: &RecordSchema,
        pagination: &PaginationConfig,
    ) -> Result<QueryDescriptor, QueryError> {
        let mut query = QueryDescriptor::new().page(self.page(), self.limit(pagination));
        query.validate()?;

        if let Some(text) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            query = query.search(text.trim(), schema.search_fields().iter().cloned());
        }

        if let Some(raw) = self.filter.as_deref().filter(|s| !s.trim().is_empty()) {
            query = apply_filter_json(query, schema, raw)?;
        }

        for (field, raw) in &self.equals {
            if RESERVED.contains(&field.as_str()) {
                continue;
            }
            if let Some(value) = equality_value(schema, field, &Value::String(raw.clone()))? {
                query = query.filter_eq(field.as_str(), value);
            }
        }

        match self.sort.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(raw) => {
                let (field, direction) = parse_sort(raw)?;
                require_field(schema, &field)?;
                query = query.sort_by(field, direction);
            }
            None => {
                if let Some((field, direction)) = schema.default_sort() {
                    query = query.sort_by(field, direction);
                }
            }
        }

        Ok(query)
    }
}

fn parse_count(name: &str, raw: &str) -> Result<usize, QueryError> {
    raw.trim().parse().map_err(|_| QueryError::InvalidFilter {
        message: format!("'{name}' must be a non-negative integer (got '{raw}')"),
    })
}

/// Split a sort parameter into field and direction
pub fn parse_sort(raw: &str) -> Result<(String, SortDirection), QueryError> {
    let raw = raw.trim();
    if let Some(field) = raw.strip_prefix('-') {
        return Ok((field.to_string(), SortDirection::Descending));
    }
    match raw.split_once(':') {
        Some((field, direction)) => Ok((field.to_string(), direction.parse()?)),
        None => Ok((raw.to_string(), SortDirection::Ascending)),
    }
}

fn require_field(schema: &RecordSchema, field: &str) -> Result<(), QueryError> {
    if schema.has_field(field) {
        Ok(())
    } else {
        Err(QueryError::UnknownField {
            collection: schema.plural().to_string(),
            field: field.to_string(),
        })
    }
}

/// Resolve an equality value; `None` means "do not filter"
fn equality_value(
    schema: &RecordSchema,
    field: &str,
    raw: &Value,
) -> Result<Option<FieldValue>, QueryError> {
    require_field(schema, field)?;

    let ignored = match raw {
        Value::Null => true,
        Value::String(s) => s.is_empty() || s == MATCH_ALL,
        _ => false,
    };
    if ignored {
        return Ok(None);
    }

    let Some(field_type) = schema.field_type(field) else {
        return Ok(None);
    };
    FieldValue::from_json(field_type, raw)
        .map(Some)
        .ok_or_else(|| QueryError::InvalidFilter {
            message: format!("value {raw} for '{field}' is not a valid {field_type}"),
        })
}

fn apply_filter_json(
    mut query: QueryDescriptor,
    schema: &RecordSchema,
    raw: &str,
) -> Result<QueryDescriptor, QueryError> {
    let parsed: Value = serde_json::from_str(raw).map_err(|e| QueryError::InvalidFilter {
        message: format!("filter is not valid JSON: {e}"),
    })?;
    let Value::Object(entries) = parsed else {
        return Err(QueryError::InvalidFilter {
            message: "filter must be a JSON object".to_string(),
        });
    };

    for (key, value) in entries {
        if let Some(field) = key.strip_suffix(">=") {
            require_field(schema, field)?;
            query = query.filter_min(field, bound_value(field, &value)?);
        } else if let Some(field) = key.strip_suffix("<=") {
            require_field(schema, field)?;
            query = query.filter_max(field, bound_value(field, &value)?);
        } else if let Some(value) = equality_value(schema, &key, &value)? {
            query = query.filter_eq(key, value);
        }
    }
    Ok(query)
}

fn bound_value(field: &str, raw: &Value) -> Result<f64, QueryError> {
    match FieldValue::from_json(crate::core::field::FieldType::Number, raw) {
        Some(FieldValue::Number(n)) => Ok(n),
        _ => Err(QueryError::InvalidFilter {
            message: format!("bound {raw} for '{field}' is not a number"),
        }),
    }
}

/// Parameters of a stats request
pub fn stats_request<I>(schema: &RecordSchema, pairs: I) -> Result<StatsRequest, QueryError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut group_by = None;
    let mut average = None;
    let mut flag = None;
    for (key, value) in pairs {
        let value = Some(value).filter(|v| !v.trim().is_empty());
        match key.as_str() {
            "group_by" => group_by = value,
            "average" => average = value,
            "flag" => flag = value,
            _ => {}
        }
    }

    let group_by = group_by.ok_or_else(|| QueryError::InvalidFilter {
        message: "'group_by' is required".to_string(),
    })?;
    require_field(schema, &group_by)?;

    let mut request = StatsRequest::new(group_by);
    if let Some(field) = average {
        require_field(schema, &field)?;
        request = request.average(field);
    }
    if let Some(field) = flag {
        require_field(schema, &field)?;
        request = request.flag(field);
    }
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::catalog;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn descriptor(items: &[(&str, &str)]) -> Result<QueryDescriptor, QueryError> {
        ListParams::from_pairs(pairs(items))?
            .to_descriptor(&catalog::students(), &PaginationConfig::default())
    }

    #[test]
    fn test_defaults_use_schema_sort() {
        let query = descriptor(&[]).unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, 10);
        assert_eq!(query.sort_key.as_deref(), Some("student_id"));
        assert_eq!(query.sort_direction, SortDirection::Ascending);
        assert!(!query.has_search());
    }

    #[test]
    fn test_limit_is_capped() {
        let query = descriptor(&[("page", "3"), ("limit", "500")]).unwrap();
        assert_eq!(query.page, 3);
        assert_eq!(query.page_size, 100);

        assert!(descriptor(&[("page", "two")]).is_err());
    }

    #[test]
    fn test_zero_page_or_limit_is_rejected() {
        let err = descriptor(&[("page", "0"), ("limit", "0")]).unwrap_err();
        assert!(matches!(err, QueryError::InvalidPage { page: 0 }));

        let err = descriptor(&[("limit", "0")]).unwrap_err();
        assert!(matches!(err, QueryError::InvalidPageSize { page_size: 0 }));
    }

    #[test]
    fn test_search_uses_schema_fields() {
        let query = descriptor(&[("search", " jo ")]).unwrap();
        assert_eq!(query.search_text, "jo");
        assert_eq!(query.search_fields, vec!["full_name", "student_id", "email"]);
    }

    #[test]
    fn test_sort_forms() {
        assert_eq!(
            parse_sort("grade").unwrap(),
            ("grade".to_string(), SortDirection::Ascending)
        );
        assert_eq!(
            parse_sort("grade:desc").unwrap(),
            ("grade".to_string(), SortDirection::Descending)
        );
        assert_eq!(
            parse_sort("-grade").unwrap(),
            ("grade".to_string(), SortDirection::Descending)
        );
        assert!(parse_sort("grade:up").is_err());
    }

    #[test]
    fn test_sort_on_unknown_field_is_rejected() {
        let err = descriptor(&[("sort", "shoe_size")]).unwrap_err();
        assert!(matches!(err, QueryError::UnknownField { ref field, .. } if field == "shoe_size"));
    }

    #[test]
    fn test_equality_params_are_typed() {
        let query = descriptor(&[("status", "Active"), ("grade", "85"), ("year_level", "all")])
            .unwrap();
        assert_eq!(query.equality_filters.len(), 2);
        assert_eq!(query.equality_filters["status"], FieldValue::from("Active"));
        assert_eq!(query.equality_filters["grade"], FieldValue::Number(85.0));

        assert!(descriptor(&[("grade", "high")]).is_err());
        assert!(descriptor(&[("nickname", "JD")]).is_err());
    }

    #[test]
    fn test_filter_json() {
        let query = descriptor(&[(
            "filter",
            r#"{"grade>=": 80, "grade<=": "95", "course": "Data Science", "status": "all"}"#,
        )])
        .unwrap();

        assert_eq!(query.min_value_filters["grade"], 80.0);
        assert_eq!(query.max_value_filters["grade"], 95.0);
        assert_eq!(query.equality_filters.len(), 1);
        assert_eq!(query.equality_filters["course"], FieldValue::from("Data Science"));
    }

    #[test]
    fn test_filter_json_errors() {
        assert!(matches!(
            descriptor(&[("filter", "{not json")]),
            Err(QueryError::InvalidFilter { .. })
        ));
        assert!(matches!(
            descriptor(&[("filter", "[1]")]),
            Err(QueryError::InvalidFilter { .. })
        ));
        assert!(matches!(
            descriptor(&[("filter", r#"{"grade>=": "lots"}"#)]),
            Err(QueryError::InvalidFilter { .. })
        ));
        assert!(matches!(
            descriptor(&[("filter", r#"{"height>=": 1}"#)]),
            Err(QueryError::UnknownField { .. })
        ));
    }

    #[test]
    fn test_stats_request() {
        let schema = catalog::users();
        let request = stats_request(
            &schema,
            pairs(&[("group_by", "city"), ("average", "age"), ("flag", "is_active")]),
        )
        .unwrap();
        assert_eq!(request, StatsRequest::new("city").average("age").flag("is_active"));

        assert!(stats_request(&schema, pairs(&[])).is_err());
        assert!(stats_request(&schema, pairs(&[("group_by", "planet")])).is_err());
    }
}
