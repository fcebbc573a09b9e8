use crate::color::Rgb;

// =============================================================================
// Scene Graph
// =============================================================================

/// Which vertical axis a command's y values are expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Bar values
    Primary,
    /// Line counts
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HAnchor {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VAnchor {
    Top,
    Center,
    Bottom,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub size: f64,
    pub bold: bool,
    pub color: Rgb,
}

/// A list of primitive drawing commands.
/// The Backend just executes these blindly, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    DrawRect {
        // Top-Left, Bottom-Right, in primary axis coordinates
        tl: (f64, f64),
        br: (f64, f64),
        fill: Rgb,
    },
    DrawLine {
        axis: Axis,
        points: Vec<(f64, f64)>,
        color: Rgb,
        width: f64,
        dashed: bool,
    },
    DrawPoint {
        axis: Axis,
        points: Vec<(f64, f64)>,
        color: Rgb,
        radius: f64,
    },
    DrawText {
        axis: Axis,
        at: (f64, f64),
        text: String,
        style: TextStyle,
        h_anchor: HAnchor,
        v_anchor: VAnchor,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum LegendSwatch {
    Solid(Rgb),
    Hatched(Rgb),
    Line { color: Rgb, dashed: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub swatch: LegendSwatch,
}

/// Year label under one bucket
#[derive(Debug, Clone, PartialEq)]
pub struct TickLabel {
    pub x: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneGraph {
    pub width: u32,
    pub height: u32,
    pub title: Option<String>,
    /// Bucket i is centered at x = i
    pub x_range: (f64, f64),
    pub primary_y: (f64, f64),
    /// Present only when the count line is drawn
    pub secondary_y: Option<(f64, f64)>,
    pub font_size: u32,
    pub x_labels: Vec<TickLabel>,
    pub commands: Vec<DrawCommand>,
    pub legend: Vec<LegendEntry>,
}
