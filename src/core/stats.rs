//! Grouped aggregates over a collection

use crate::core::field::FieldValue;
use crate::core::record::Record;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// What to aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsRequest {
    pub group_by: String,

    /// Numeric field to average within each group
    #[serde(default)]
    pub average: Option<String>,

    /// Boolean field whose `true` values are counted within each group
    #[serde(default)]
    pub flag: Option<String>,
}

impl StatsRequest {
    pub fn new(group_by: impl Into<String>) -> Self {
        Self {
            group_by: group_by.into(),
            average: None,
            flag: None,
        }
    }

    pub fn average(mut self, field: impl Into<String>) -> Self {
        self.average = Some(field.into());
        self
    }

    pub fn flag(mut self, field: impl Into<String>) -> Self {
        self.flag = Some(field.into());
        self
    }
}

/// Aggregates for one distinct `group_by` value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    /// Group value; `None` collects records missing the field
    pub key: Option<FieldValue>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flagged: Option<usize>,
}

#[derive(Default)]
struct Accumulator {
    key: Option<FieldValue>,
    count: usize,
    sum: f64,
    numeric: usize,
    flagged: usize,
}

/// Group records and compute per-group aggregates
///
/// Groups are ordered by count, largest first; equal counts keep the order
/// in which their key was first seen. The average only covers records with a
/// numeric value and is `None` for a group that has none.
pub fn group_stats(records: &[Record], request: &StatsRequest) -> Vec<GroupStats> {
    let mut groups: IndexMap<String, Accumulator> = IndexMap::new();

    for record in records {
        let key = record.get(&request.group_by);
        // Keyed on type plus rendering so 1 and "1" stay apart
        let slot = match key {
            Some(value) => format!("{}:{}", value.field_type(), value),
            None => String::new(),
        };
        let acc = groups.entry(slot).or_insert_with(|| Accumulator {
            key: key.cloned(),
            ..Default::default()
        });

        acc.count += 1;
        if let Some(n) = request
            .average
            .as_deref()
            .and_then(|field| record.get(field))
            .and_then(FieldValue::as_number)
        {
            acc.sum += n;
            acc.numeric += 1;
        }
        if request
            .flag
            .as_deref()
            .and_then(|field| record.get(field))
            .and_then(FieldValue::as_bool)
            .unwrap_or(false)
        {
            acc.flagged += 1;
        }
    }

    let mut stats: Vec<GroupStats> = groups
        .into_values()
        .map(|acc| GroupStats {
            key: acc.key,
            count: acc.count,
            average: request
                .average
                .as_ref()
                .filter(|_| acc.numeric > 0)
                .map(|_| acc.sum / acc.numeric as f64),
            flagged: request.flag.as_ref().map(|_| acc.flagged),
        })
        .collect();

    stats.sort_by(|a, b| b.count.cmp(&a.count));
    stats
}
