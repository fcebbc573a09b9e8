//! Yearly aggregation with optional categorical stacking.

use std::collections::{BTreeMap, HashSet};

use chrono::Datelike;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ChartError, Result};
use crate::schema::Record;

/// Label used for rows whose category cell is blank
pub const BLANK_CATEGORY: &str = "Unknown";

/// Category a record falls under, as shown in the legend
pub fn category_label<'a>(record: &'a Record, column: &str) -> &'a str {
    match record.field(column) {
        "" => BLANK_CATEGORY,
        other => other,
    }
}

/// Inclusive calendar-year range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, year: i32) -> bool {
        year >= self.start && year <= self.end
    }

    /// Smallest range covering every record; None when there are none
    pub fn spanning(rows: &[Record]) -> Option<Self> {
        let years = rows.iter().map(|r| r.date.year());
        let min = years.clone().min()?;
        let max = years.max()?;
        Some(Self::new(min, max))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum GroupingMode {
    #[default]
    Ungrouped,
    GroupedBy(String),
}

impl GroupingMode {
    pub fn from_column(column: Option<&str>) -> Self {
        match column.map(str::trim) {
            Some(c) if !c.is_empty() => GroupingMode::GroupedBy(c.to_string()),
            _ => GroupingMode::Ungrouped,
        }
    }

    pub fn is_grouped(&self) -> bool {
        matches!(self, GroupingMode::GroupedBy(_))
    }
}

/// One time bucket of the aggregation
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedRow {
    pub period: i32,
    /// Per-category sums; empty when ungrouped
    pub value_by_category: BTreeMap<String, f64>,
    pub total: f64,
    pub row_count: usize,
}

impl AggregatedRow {
    /// Value for a category, 0 when the category never appears
    pub fn value_for(&self, category: &str) -> f64 {
        self.value_by_category.get(category).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub rows: Vec<AggregatedRow>,
    /// Distinct category labels in first-seen order
    pub categories: Vec<String>,
    pub grouping: GroupingMode,
}

impl Aggregation {
    pub fn periods(&self) -> Vec<i32> {
        self.rows.iter().map(|r| r.period).collect()
    }

    pub fn counts(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.row_count as f64).collect()
    }
}

#[derive(Default)]
struct Bucket {
    values: BTreeMap<String, f64>,
    total: f64,
    count: usize,
}

/// Bucket rows by year within `range`, optionally cross-tabulated by a column
pub fn aggregate(rows: &[&Record], range: YearRange, grouping: &GroupingMode) -> Result<Aggregation> {
    // 1. Restrict to the requested years
    let in_range: Vec<&Record> = rows
        .iter()
        .copied()
        .filter(|r| range.contains(r.date.year()))
        .collect();

    if in_range.is_empty() {
        return Err(ChartError::EmptyRange {
            start: range.start,
            end: range.end,
        });
    }

    if let GroupingMode::GroupedBy(column) = grouping {
        if !in_range.iter().any(|r| r.has_field(column)) {
            return Err(ChartError::ColumnNotFound(column.clone()));
        }
    }

    // 2. Accumulate per period
    let mut buckets: BTreeMap<i32, Bucket> = BTreeMap::new();
    let mut categories: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for record in in_range {
        let bucket = buckets.entry(record.date.year()).or_default();
        bucket.total += record.value;
        bucket.count += 1;

        if let GroupingMode::GroupedBy(column) = grouping {
            let label = category_label(record, column).to_string();
            if seen.insert(label.clone()) {
                categories.push(label.clone());
            }
            *bucket.values.entry(label).or_insert(0.0) += record.value;
        }
    }

    // 3. Pivot: every category present in every row
    let rows: Vec<AggregatedRow> = buckets
        .into_iter()
        .map(|(period, mut bucket)| {
            for cat in &categories {
                bucket.values.entry(cat.clone()).or_insert(0.0);
            }
            AggregatedRow {
                period,
                value_by_category: bucket.values,
                total: bucket.total,
                row_count: bucket.count,
            }
        })
        .collect();

    debug!(
        buckets = rows.len(),
        categories = categories.len(),
        start = range.start,
        end = range.end,
        "aggregated records"
    );

    Ok(Aggregation {
        rows,
        categories,
        grouping: grouping.clone(),
    })
}
