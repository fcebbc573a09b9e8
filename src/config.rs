// Immutable chart configuration, loaded from JSON and/or CLI flags

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::aggregate::{GroupingMode, YearRange};
use crate::color::{Rgb, LINE_COLOR, SINGLE_BAR_COLOR};
use crate::error::{ChartError, Result};
use crate::filter::FilterSpec;
use crate::placement::LineLabelMode;
use crate::schema::Schema;
use crate::RenderOptions;

/// Upper bound on width x height x scale^2 of a raster render
pub const MAX_RASTER_PIXELS: f64 = 50_000_000.0;

/// Caller-supplied display settings for one category
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CategoryStyle {
    pub label: String,
    #[serde(default)]
    pub color: Option<Rgb>,
    /// Lower values are drawn first, at the bottom of the stack
    #[serde(default)]
    pub order: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LegendLabels {
    pub total: String,
    pub line: String,
    pub predicted_suffix: String,
}

impl Default for LegendLabels {
    fn default() -> Self {
        Self {
            total: "Total Amount".to_string(),
            line: "Number of Deals".to_string(),
            predicted_suffix: " (Predicted)".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// None means the full span of the loaded data
    pub years: Option<YearRange>,
    pub category_column: Option<String>,
    pub show_bars: bool,
    pub show_line: bool,
    pub categories: Vec<CategoryStyle>,
    pub filter: Option<FilterSpec>,
    pub title: Option<String>,
    /// Buckets at or after this year are drawn as predictions
    pub prediction_start_year: Option<i32>,
    pub line_label_mode: LineLabelMode,
    pub legend: LegendLabels,
    pub bar_color: Rgb,
    pub line_color: Rgb,
    pub schema: Schema,
    pub render: RenderOptions,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            years: None,
            category_column: None,
            show_bars: true,
            show_line: true,
            categories: Vec::new(),
            filter: None,
            title: None,
            prediction_start_year: None,
            line_label_mode: LineLabelMode::default(),
            legend: LegendLabels::default(),
            bar_color: SINGLE_BAR_COLOR,
            line_color: LINE_COLOR,
            schema: Schema::default(),
            render: RenderOptions::default(),
        }
    }
}

impl ChartConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: ChartConfig = serde_json::from_str(text)
            .map_err(|e| ChartError::InvalidConfig(e.to_string()))?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ChartError::InvalidConfig(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        Self::from_json_str(&text)
    }

    pub fn grouping(&self) -> GroupingMode {
        GroupingMode::from_column(self.category_column.as_deref())
    }

    /// Style entry for a category label, if the caller supplied one
    pub fn style_for(&self, label: &str) -> Option<&CategoryStyle> {
        self.categories.iter().find(|s| s.label == label)
    }

    /// Reject combinations the pipeline cannot render
    pub fn validate(&self) -> Result<()> {
        if let Some(range) = &self.years {
            if range.start > range.end {
                return Err(ChartError::InvalidConfig(format!(
                    "Start year {} is after end year {}",
                    range.start, range.end
                )));
            }
        }

        if !self.show_bars && !self.show_line {
            return Err(ChartError::InvalidConfig(
                "At least one of bars or line must be shown".to_string(),
            ));
        }

        let mut labels = HashSet::new();
        for style in &self.categories {
            if !labels.insert(style.label.as_str()) {
                return Err(ChartError::InvalidConfig(format!(
                    "Category '{}' is styled more than once",
                    style.label
                )));
            }
        }

        if let Some(filter) = &self.filter {
            if filter.column.trim().is_empty() && !filter.values.is_empty() {
                return Err(ChartError::InvalidConfig(
                    "Filter values given without a filter column".to_string(),
                ));
            }
        }

        if self.render.width == 0 || self.render.height == 0 {
            return Err(ChartError::InvalidConfig(
                "Render width and height must be positive".to_string(),
            ));
        }

        if !(self.render.scale.is_finite() && self.render.scale > 0.0) {
            return Err(ChartError::InvalidConfig(
                "Render scale must be a positive number".to_string(),
            ));
        }

        let scale = self.render.scale;
        let pixels = (self.render.width as f64 * scale) * (self.render.height as f64 * scale);
        if pixels > MAX_RASTER_PIXELS {
            return Err(ChartError::InvalidConfig(format!(
                "Render size {}x{} at scale {} exceeds {} pixels",
                self.render.width, self.render.height, scale, MAX_RASTER_PIXELS
            )));
        }

        Ok(())
    }
}
