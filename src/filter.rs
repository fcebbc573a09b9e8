// Include/exclude filtering on a single column

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::aggregate::category_label;
use crate::schema::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    Include,
    Exclude,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct FilterSpec {
    pub column: String,
    pub mode: FilterMode,
    #[serde(default)]
    pub values: BTreeSet<String>,
}

impl FilterSpec {
    pub fn new<I, S>(column: &str, mode: FilterMode, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            column: column.to_string(),
            mode,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// True when the filter leaves every row in place
    pub fn is_identity(&self) -> bool {
        self.column.trim().is_empty() || self.values.is_empty()
    }

    /// Blank cells match the same label the legend shows for them
    fn keeps(&self, record: &Record) -> bool {
        let hit = self.values.contains(category_label(record, &self.column));
        match self.mode {
            FilterMode::Include => hit,
            FilterMode::Exclude => !hit,
        }
    }
}

/// Apply an optional filter; unset or empty filters return the input unchanged
pub fn filter<'a>(rows: &'a [Record], spec: Option<&FilterSpec>) -> Vec<&'a Record> {
    match spec {
        Some(spec) if !spec.is_identity() => rows.iter().filter(|r| spec.keeps(r)).collect(),
        _ => rows.iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_record(year: i32, region: &str) -> Record {
        Record {
            date: NaiveDate::from_ymd_opt(year, 1, 1).unwrap(),
            value: 1.0,
            fields: [("Region".to_string(), region.to_string())].into_iter().collect(),
        }
    }

    fn make_rows() -> Vec<Record> {
        vec![
            make_record(2020, "North"),
            make_record(2020, "South"),
            make_record(2021, " East "),
            make_record(2021, "North"),
        ]
    }

    #[test]
    fn test_filter_none_is_identity() {
        let rows = make_rows();
        assert_eq!(filter(&rows, None).len(), 4);
    }

    #[test]
    fn test_filter_empty_values_is_identity() {
        let rows = make_rows();
        let spec = FilterSpec::new("Region", FilterMode::Exclude, Vec::<String>::new());
        assert_eq!(filter(&rows, Some(&spec)).len(), 4);
    }

    #[test]
    fn test_filter_include() {
        let rows = make_rows();
        let spec = FilterSpec::new("Region", FilterMode::Include, ["North", "East"]);
        let kept = filter(&rows, Some(&spec));
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn test_filter_exclude() {
        let rows = make_rows();
        let spec = FilterSpec::new("Region", FilterMode::Exclude, ["North"]);
        let kept = filter(&rows, Some(&spec));
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|r| r.field("Region") != "North"));
    }

    #[test]
    fn test_filter_blank_cell_matches_unknown() {
        let mut rows = make_rows();
        rows.push(make_record(2021, "  "));
        let exclude = FilterSpec::new("Region", FilterMode::Exclude, ["Unknown"]);
        let kept = filter(&rows, Some(&exclude));
        assert_eq!(kept.len(), 4);
        assert!(kept.iter().all(|r| !r.field("Region").is_empty()));

        let include = FilterSpec::new("Region", FilterMode::Include, ["Unknown"]);
        assert_eq!(filter(&rows, Some(&include)).len(), 1);
    }

    #[test]
    fn test_filter_missing_column_reads_empty() {
        let rows = make_rows();
        let include = FilterSpec::new("Sector", FilterMode::Include, ["Tech"]);
        assert!(filter(&rows, Some(&include)).is_empty());
        let exclude = FilterSpec::new("Sector", FilterMode::Exclude, ["Tech"]);
        assert_eq!(filter(&rows, Some(&exclude)).len(), 4);
    }
}
