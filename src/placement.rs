//! Label placement for line points and bar segments.
//!
//! Line labels go above or below their marker depending on the local slope
//! pattern around the point, so text sits on the open side of the line. Bar
//! labels sit on the baseline for the bottom segment of a stack and at the
//! vertical midpoint for every other segment.

use std::cmp::Ordering;

use serde::Deserialize;

use crate::color::{contrast_text, Rgb};
use crate::format::{format_count, format_currency};

/// Line label offset as a fraction of the line axis display range
pub const LINE_OFFSET_FRACTION: f64 = 0.025;
/// Line axis display range as a multiple of the largest count
pub const LINE_AXIS_HEADROOM: f64 = 1.5;
/// Bottom-segment label offset as a fraction of the tallest stack
pub const BAR_BASELINE_FRACTION: f64 = 0.01;

pub const MIN_FONT_SIZE: u32 = 8;
pub const MAX_FONT_SIZE: u32 = 22;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelPosition {
    /// Text bottom sits at `y`
    Above,
    /// Text top sits at `y`
    Below,
    /// Text vertically centered on `y`
    Center,
    /// Text bottom sits at `y`, just above the x axis
    Baseline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineLabelMode {
    #[default]
    PeakValley,
    /// Legacy rule: below whenever an immediate neighbor is greater
    Neighbor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelPlacement {
    pub position: LabelPosition,
    pub y: f64,
    pub text: String,
    pub text_color: Rgb,
}

/// Above/below decision for every point of a line (`true` = above)
pub fn classify_line_points(y: &[f64]) -> Vec<bool> {
    let n = y.len();
    (0..n)
        .map(|i| {
            if n == 1 {
                return true;
            }
            if i == 0 {
                // Outgoing slope only; flat defaults to above
                return y[1] >= y[0];
            }
            if i == n - 1 {
                return y[i - 1] <= y[i];
            }
            classify_interior(y[i - 1], y[i], y[i + 1])
        })
        .collect()
}

fn classify_interior(prev: f64, cur: f64, next: f64) -> bool {
    use Ordering::{Equal, Greater, Less};

    let incoming = cur.partial_cmp(&prev);
    let outgoing = next.partial_cmp(&cur);
    match (incoming, outgoing) {
        // peak
        (Some(Greater), Some(Less)) => true,
        // valley
        (Some(Less), Some(Greater)) => false,
        // strictly rising / falling
        (Some(Greater), Some(Greater)) => true,
        (Some(Less), Some(Less)) => false,
        // flat then rising / falling
        (Some(Equal), Some(Greater)) => true,
        (Some(Equal), Some(Less)) => false,
        // rising / falling then flat
        (Some(Greater), Some(Equal)) => true,
        (Some(Less), Some(Equal)) => false,
        _ => true,
    }
}

/// Legacy neighbor-only rule
pub fn classify_line_points_neighbor(y: &[f64]) -> Vec<bool> {
    (0..y.len())
        .map(|i| {
            let left = i.checked_sub(1).map(|j| y[j] > y[i]).unwrap_or(false);
            let right = y.get(i + 1).map(|&v| v > y[i]).unwrap_or(false);
            !(left || right)
        })
        .collect()
}

/// Top of the line axis: `1.5 × max(y)`, or 1 when the max is not positive
pub fn line_axis_max(y: &[f64]) -> f64 {
    let max = y.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max.is_finite() && max > 0.0 {
        max * LINE_AXIS_HEADROOM
    } else {
        1.0
    }
}

/// Count labels for every line point
pub fn place_line_labels(y: &[f64], mode: LineLabelMode, color: Rgb) -> Vec<LabelPlacement> {
    let offset = line_axis_max(y) * LINE_OFFSET_FRACTION;
    let above = match mode {
        LineLabelMode::PeakValley => classify_line_points(y),
        LineLabelMode::Neighbor => classify_line_points_neighbor(y),
    };

    y.iter()
        .zip(above)
        .map(|(&value, above)| LabelPlacement {
            position: if above { LabelPosition::Above } else { LabelPosition::Below },
            y: if above { value + offset } else { value - offset },
            text: format_count(value),
            text_color: color,
        })
        .collect()
}

/// One drawn piece of a (possibly stacked) bar
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarSegment {
    /// 0 for the bottommost segment of the stack
    pub stack_index: usize,
    pub bottom: f64,
    pub value: f64,
    pub fill: Rgb,
}

/// Label for a bar segment; None for non-positive values
pub fn place_bar_label(segment: &BarSegment, max_stacked_total: f64) -> Option<LabelPlacement> {
    if segment.value <= 0.0 {
        return None;
    }

    let (position, y) = if segment.stack_index == 0 {
        (LabelPosition::Baseline, max_stacked_total * BAR_BASELINE_FRACTION)
    } else {
        (LabelPosition::Center, segment.bottom + segment.value / 2.0)
    };

    Some(LabelPlacement {
        position,
        y,
        text: format_currency(segment.value),
        text_color: contrast_text(segment.fill),
    })
}

/// Label font size shrinking with the number of buckets
pub fn dynamic_font_size(num_buckets: usize) -> u32 {
    if num_buckets == 0 {
        return MAX_FONT_SIZE;
    }
    ((150 / num_buckets) as u32).clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
}
