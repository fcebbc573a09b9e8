//! Schema normalization.
//!
//! Resolves the required logical columns (date and monetary value) against the
//! input headers, parses dates and values, and produces immutable [`Record`]s.
//! Rows with unparseable dates are dropped; malformed values are an error.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::debug;

use crate::data::PlotData;
use crate::error::{ChartError, Result};

/// Candidate date patterns tried, in order, by [`DateFormat::Auto`]
const DATE_CANDIDATES: &[&str] = &[
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%d-%m-%Y",
    "%d.%m.%Y",
];

const DATETIME_CANDIDATES: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// One logical column with its two accepted literal header names
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ColumnSpec {
    pub logical: String,
    pub primary: String,
    pub alias: String,
}

impl ColumnSpec {
    pub fn new(logical: &str, primary: &str, alias: &str) -> Self {
        Self {
            logical: logical.to_string(),
            primary: primary.to_string(),
            alias: alias.to_string(),
        }
    }

    /// Index of the matching header; primary wins over the alias
    fn resolve(&self, headers: &[String]) -> Result<usize> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name.trim());
        find(&self.primary)
            .or_else(|| find(&self.alias))
            .ok_or_else(|| ChartError::Schema {
                logical: self.logical.clone(),
                primary: self.primary.clone(),
                alias: self.alias.clone(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFormat {
    #[default]
    Auto,
    /// A chrono strftime pattern applied to every row
    Fixed(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Schema {
    pub date: ColumnSpec,
    pub value: ColumnSpec,
    pub date_format: DateFormat,
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            date: ColumnSpec::new("date", "Date", "Deal Date"),
            value: ColumnSpec::new("value", "Amount", "Deal Value"),
            date_format: DateFormat::Auto,
        }
    }
}

/// A normalized input row
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub date: NaiveDate,
    pub value: f64,
    /// Every input column, keyed by trimmed header name
    pub fields: BTreeMap<String, String>,
}

impl Record {
    /// Raw cell text for a column, trimmed; absent columns read as ""
    pub fn field(&self, column: &str) -> &str {
        self.fields
            .get(column.trim())
            .map(|s| s.trim())
            .unwrap_or("")
    }

    pub fn has_field(&self, column: &str) -> bool {
        self.fields.contains_key(column.trim())
    }
}

/// Validate columns and convert raw rows into records
pub fn normalize(data: &PlotData, schema: &Schema) -> Result<Vec<Record>> {
    let date_idx = schema.date.resolve(&data.headers)?;
    let value_idx = schema.value.resolve(&data.headers)?;
    let value_header = data.headers[value_idx].trim().to_string();

    let pattern = match &schema.date_format {
        DateFormat::Fixed(p) => Some(p.clone()),
        DateFormat::Auto => detect_date_format(data.rows.iter().map(|r| cell(r, date_idx))),
    };
    let fallback = matches!(schema.date_format, DateFormat::Auto);

    let trimmed_headers: Vec<String> = data.headers.iter().map(|h| h.trim().to_string()).collect();

    let mut records = Vec::with_capacity(data.rows.len());
    let mut dropped = 0usize;

    for (row_idx, row) in data.rows.iter().enumerate() {
        let text = cell(row, date_idx);
        let parsed = pattern.as_deref().and_then(|p| parse_date(text, p));
        let date = match parsed.or_else(|| if fallback { parse_any_date(text) } else { None }) {
            Some(d) => d,
            None => {
                dropped += 1;
                continue;
            }
        };

        let raw_value = cell(row, value_idx);
        let value = raw_value.parse::<f64>().map_err(|_| ChartError::ValueParse {
            row: row_idx + 1,
            column: value_header.clone(),
            value: raw_value.to_string(),
        })?;

        let fields = trimmed_headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), row.get(i).cloned().unwrap_or_default()))
            .collect();

        records.push(Record { date, value, fields });
    }

    debug!(
        kept = records.len(),
        dropped,
        format = pattern.as_deref().unwrap_or("<none>"),
        "normalized input rows"
    );

    Ok(records)
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(|s| s.trim()).unwrap_or("")
}

fn candidates() -> impl Iterator<Item = &'static str> {
    DATE_CANDIDATES.iter().chain(DATETIME_CANDIDATES.iter()).copied()
}

/// Pattern of the first date cell that any candidate parses. Cells that
/// match no candidate are skipped.
fn detect_date_format<'a>(mut cells: impl Iterator<Item = &'a str>) -> Option<String> {
    cells
        .find_map(|c| candidates().find(|p| parse_date(c, p).is_some()))
        .map(str::to_string)
}

/// Rows written in another format than the detected one still parse
fn parse_any_date(text: &str) -> Option<NaiveDate> {
    candidates().find_map(|p| parse_date(text, p))
}

fn parse_date(text: &str, pattern: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, pattern)
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(text, pattern).ok().map(|dt| dt.date()))
}
