//! Translation of query descriptors into PostgreSQL
//!
//! Records live in one `records` table: the system fields are columns and
//! the user fields sit in a JSONB `data` column. The statements built here
//! select the same records, in the same order, as
//! [`RecordQueryPipeline`](crate::core::pipeline::RecordQueryPipeline) would
//! over the decoded rows:
//!
//! - expressions are typed from the schema, so a filter whose value has a
//!   different type than the field never matches;
//! - text sorts with `COLLATE "C"` (byte order, like `str::cmp`);
//! - missing values sort first ascending and last descending, and `seq`
//!   (insertion order) breaks ties in both directions.
//!
//! Field names and values are always bound as parameters.

use crate::core::field::{FieldType, FieldValue};
use crate::core::query::{QueryDescriptor, SortDirection};
use crate::core::record::{CREATED_AT_FIELD, ID_FIELD, UPDATED_AT_FIELD};
use crate::core::schema::RecordSchema;
use chrono::{DateTime, Utc};

/// Columns returned by [`SqlQuery::select`]
pub const RECORD_COLUMNS: &str = "id, data, created_at, updated_at";

/// A bound statement parameter
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Float(f64),
    Bool(bool),
    Timestamp(DateTime<Utc>),
    BigInt(i64),
}

/// A pair of statements for one descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    /// One page of rows
    pub select: String,
    /// `COUNT(*)` of all matching rows
    pub count: String,
    /// Parameters of `select`; the first `count_params` also belong to `count`
    pub params: Vec<SqlParam>,
    pub count_params: usize,
}

impl SqlQuery {
    pub fn from_descriptor(schema: &RecordSchema, descriptor: &QueryDescriptor) -> Self {
        let mut builder = Builder::default();

        let collection = builder.bind(SqlParam::Text(schema.plural().to_string()));
        let mut conditions = vec![format!("collection = {collection}")];

        for (field, expected) in &descriptor.equality_filters {
            conditions.push(builder.equality(schema, field, expected));
        }
        for (field, min) in &descriptor.min_value_filters {
            conditions.push(builder.bound(schema, field, ">=", *min));
        }
        for (field, max) in &descriptor.max_value_filters {
            conditions.push(builder.bound(schema, field, "<=", *max));
        }
        if descriptor.has_search() {
            conditions.push(builder.search(descriptor));
        }

        let where_clause = conditions.join(" AND ");
        let count = format!("SELECT COUNT(*) FROM records WHERE {where_clause}");
        let count_params = builder.params.len();

        let mut order_by = Vec::new();
        if let Some(key) = descriptor.sort_key.as_deref() {
            if let Some(expr) = builder.sort_expression(schema, key) {
                order_by.push(match descriptor.sort_direction {
                    SortDirection::Ascending => format!("{expr} ASC NULLS FIRST"),
                    SortDirection::Descending => format!("{expr} DESC NULLS LAST"),
                });
            }
        }
        order_by.push("seq ASC".to_string());

        let limit = builder.bind(SqlParam::BigInt(to_bigint(descriptor.page_size)));
        let offset = builder.bind(SqlParam::BigInt(to_bigint(descriptor.offset())));

        let select = format!(
            "SELECT {RECORD_COLUMNS} FROM records WHERE {where_clause} ORDER BY {} LIMIT {limit} OFFSET {offset}",
            order_by.join(", ")
        );

        Self {
            select,
            count,
            params: builder.params,
            count_params,
        }
    }

    pub fn count_params(&self) -> &[SqlParam] {
        &self.params[..self.count_params]
    }
}

fn to_bigint(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Escape `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern
pub fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Default)]
struct Builder {
    params: Vec<SqlParam>,
}

impl Builder {
    fn bind(&mut self, param: SqlParam) -> String {
        self.params.push(param);
        format!("${}", self.params.len())
    }

    fn bind_field(&mut self, field: &str) -> String {
        let placeholder = self.bind(SqlParam::Text(field.to_string()));
        format!("{placeholder}::text")
    }

    /// Typed expression for a field, `None` when the schema does not know it
    fn typed(&mut self, schema: &RecordSchema, field: &str) -> Option<(String, FieldType)> {
        let field_type = schema.field_type(field)?;
        let expr = match field {
            ID_FIELD => "id::text".to_string(),
            CREATED_AT_FIELD => "created_at".to_string(),
            UPDATED_AT_FIELD => "updated_at".to_string(),
            _ => {
                let name = self.bind_field(field);
                match field_type {
                    FieldType::Text => format!(
                        "(CASE WHEN jsonb_typeof(data->{name}) = 'string' THEN data->>{name} END)"
                    ),
                    FieldType::Number => format!(
                        "(CASE WHEN jsonb_typeof(data->{name}) = 'number' THEN (data->>{name})::double precision END)"
                    ),
                    FieldType::Boolean => format!(
                        "(CASE WHEN jsonb_typeof(data->{name}) = 'boolean' THEN (data->>{name})::boolean END)"
                    ),
                    FieldType::Date => format!("(data->>{name})::timestamptz"),
                }
            }
        };
        Some((expr, field_type))
    }

    fn equality(&mut self, schema: &RecordSchema, field: &str, expected: &FieldValue) -> String {
        if schema.field_type(field) != Some(expected.field_type()) {
            return "FALSE".to_string();
        }
        let Some((expr, _)) = self.typed(schema, field) else {
            return "FALSE".to_string();
        };
        let value = self.bind(match expected {
            FieldValue::Text(s) => SqlParam::Text(s.clone()),
            FieldValue::Number(n) => SqlParam::Float(*n),
            FieldValue::Boolean(b) => SqlParam::Bool(*b),
            FieldValue::Date(d) => SqlParam::Timestamp(*d),
        });
        format!("{expr} = {value}")
    }

    fn bound(&mut self, schema: &RecordSchema, field: &str, op: &str, limit: f64) -> String {
        if schema.field_type(field) != Some(FieldType::Number) {
            return "FALSE".to_string();
        }
        match self.typed(schema, field) {
            Some((expr, _)) => {
                let value = self.bind(SqlParam::Float(limit));
                format!("{expr} {op} {value}")
            }
            None => "FALSE".to_string(),
        }
    }

    fn search(&mut self, descriptor: &QueryDescriptor) -> String {
        let pattern = format!("%{}%", escape_like(&descriptor.search_text.to_lowercase()));
        let mut alternatives = Vec::new();
        let mut pattern_placeholder = None;

        for field in &descriptor.search_fields {
            let text = match field.as_str() {
                ID_FIELD => "id::text".to_string(),
                CREATED_AT_FIELD | UPDATED_AT_FIELD => format!(
                    "to_char({field} AT TIME ZONE 'UTC', 'YYYY-MM-DD\"T\"HH24:MI:SS.MS\"Z\"')"
                ),
                _ => {
                    let name = self.bind_field(field);
                    format!("(data->>{name})")
                }
            };
            let p = pattern_placeholder
                .get_or_insert_with(|| self.bind(SqlParam::Text(pattern.clone())))
                .clone();
            alternatives.push(format!("LOWER({text}) LIKE {p} ESCAPE '\\'"));
        }

        if alternatives.is_empty() {
            "FALSE".to_string()
        } else {
            format!("({})", alternatives.join(" OR "))
        }
    }

    fn sort_expression(&mut self, schema: &RecordSchema, key: &str) -> Option<String> {
        let (expr, field_type) = self.typed(schema, key)?;
        Some(match field_type {
            FieldType::Text => format!("{expr} COLLATE \"C\""),
            _ => expr,
        })
    }
}
