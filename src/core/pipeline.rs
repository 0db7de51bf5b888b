//! The filter -> search -> sort -> paginate pipeline
//!
//! [`RecordQueryPipeline::execute`] is a pure, synchronous function over a
//! borrowed slice of records. It never mutates its input and keeps nothing
//! between calls, so the same `(records, descriptor)` pair always yields the
//! same [`QueryResult`].

use crate::core::field::FieldValue;
use crate::core::query::{QueryDescriptor, QueryResult, SortDirection};
use crate::core::record::Record;
use std::cmp::Ordering;

/// In-memory evaluator for [`QueryDescriptor`]s
pub struct RecordQueryPipeline;

impl RecordQueryPipeline {
    /// Run all four stages and return one page plus the total match count
    ///
    /// Out-of-range pages yield empty `items`; they are not errors.
    pub fn execute(records: &[Record], descriptor: &QueryDescriptor) -> QueryResult {
        let needle = descriptor.search_text.to_lowercase();

        let mut matched: Vec<&Record> = records
            .iter()
            .filter(|record| Self::passes_filters(record, descriptor))
            .filter(|record| Self::matches_search(record, &needle, &descriptor.search_fields))
            .collect();

        if let Some(key) = descriptor.sort_key.as_deref() {
            Self::sort(&mut matched, key, descriptor.sort_direction);
        }

        let total_matched = matched.len();
        let items = matched
            .into_iter()
            .skip(descriptor.offset())
            .take(descriptor.page_size)
            .cloned()
            .collect();

        QueryResult::new(items, total_matched, descriptor.page, descriptor.page_size)
    }

    /// Stage 1: equality and range filters
    ///
    /// A record missing a filtered field never passes.
    pub fn passes_filters(record: &Record, descriptor: &QueryDescriptor) -> bool {
        let equal = descriptor
            .equality_filters
            .iter()
            .all(|(field, expected)| record.get(field).is_some_and(|v| v.matches(expected)));

        let above_min = descriptor.min_value_filters.iter().all(|(field, min)| {
            record
                .get(field)
                .and_then(FieldValue::as_number)
                .is_some_and(|n| n >= *min)
        });

        let below_max = descriptor.max_value_filters.iter().all(|(field, max)| {
            record
                .get(field)
                .and_then(FieldValue::as_number)
                .is_some_and(|n| n <= *max)
        });

        equal && above_min && below_max
    }

    /// Stage 2: case-insensitive substring search over any listed field
    ///
    /// `needle` must already be lowercase; an empty needle matches everything.
    pub fn matches_search(record: &Record, needle: &str, fields: &[String]) -> bool {
        if needle.is_empty() {
            return true;
        }
        fields
            .iter()
            .filter_map(|field| record.get(field))
            .any(|value| value.contains_text(needle))
    }

    /// Stage 3: stable sort on one key
    pub fn sort(records: &mut [&Record], key: &str, direction: SortDirection) {
        // slice::sort_by is stable, so ties keep their filtered order in
        // both directions
        records.sort_by(|a, b| {
            let ordering = compare_missing_lowest(a.get(key), b.get(key));
            match direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
    }
}

/// Compare two optional values with missing ones ordered first
pub fn compare_missing_lowest(a: Option<&FieldValue>, b: Option<&FieldValue>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a.compare(b),
    }
}
