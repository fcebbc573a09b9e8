use crate::aggregate::{AggregatedRow, Aggregation, GroupingMode};
use crate::color::{ColorPalette, Rgb};
use crate::config::ChartConfig;
use crate::error::{ChartError, Result};
use crate::ir::{
    Axis, DrawCommand, HAnchor, LegendEntry, LegendSwatch, SceneGraph, TextStyle,
    TickLabel, VAnchor,
};
use crate::placement::{
    dynamic_font_size, line_axis_max, place_bar_label, place_line_labels, BarSegment,
    LabelPosition,
};

/// Fraction of a bucket slot covered by its bar
const BAR_WIDTH: f64 = 0.8;
/// Bar axis headroom over the tallest stack
const BAR_AXIS_HEADROOM: f64 = 1.1;
/// How far predicted bar fills are blended toward white
const PREDICTED_LIGHTEN: f64 = 0.45;
const HATCH_SPACING: f64 = 0.2;
const LINE_WIDTH: f64 = 2.0;
const MARKER_RADIUS: f64 = 4.0;

/// A stackable series with its resolved display settings
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub label: String,
    pub color: Rgb,
    pub stack_order: i32,
}

/// Resolve colors and stack order, sorted bottom-of-stack first.
/// Unstyled categories cycle the palette by first-seen index and default
/// their order to that index; ties keep first-seen order.
pub fn resolve_categories(aggregation: &Aggregation, config: &ChartConfig) -> Vec<Category> {
    match &aggregation.grouping {
        GroupingMode::Ungrouped => vec![Category {
            label: config.legend.total.clone(),
            color: config.bar_color,
            stack_order: 0,
        }],
        GroupingMode::GroupedBy(_) => {
            let palette = ColorPalette::category10();
            let mut indexed: Vec<(usize, Category)> = aggregation
                .categories
                .iter()
                .enumerate()
                .map(|(i, label)| {
                    let style = config.style_for(label);
                    let category = Category {
                        label: label.clone(),
                        color: style
                            .and_then(|s| s.color)
                            .unwrap_or_else(|| palette.color_at(i)),
                        stack_order: style.and_then(|s| s.order).unwrap_or(i as i32),
                    };
                    (i, category)
                })
                .collect();
            indexed.sort_by_key(|(i, c)| (c.stack_order, *i));
            indexed.into_iter().map(|(_, c)| c).collect()
        }
    }
}

/// Value of one category's segment within a bucket
fn segment_value(row: &AggregatedRow, grouping: &GroupingMode, category: &Category) -> f64 {
    match grouping {
        GroupingMode::Ungrouped => row.total,
        GroupingMode::GroupedBy(_) => row.value_for(&category.label),
    }
}

/// Compile an aggregation into a SceneGraph of drawing commands
pub fn compile_chart(aggregation: &Aggregation, config: &ChartConfig) -> Result<SceneGraph> {
    let rows = &aggregation.rows;
    if rows.is_empty() {
        return Err(ChartError::Render("Cannot compile a chart with no buckets".to_string()));
    }

    let categories = resolve_categories(aggregation, config);
    let n = rows.len();
    let font_size = dynamic_font_size(n);
    let predicted: Vec<bool> = rows
        .iter()
        .map(|r| config.prediction_start_year.map_or(false, |t| r.period >= t))
        .collect();
    let any_predicted = predicted.iter().any(|&p| p);
    let any_actual = predicted.iter().any(|&p| !p);

    // Tallest stack drives both the bar axis and the baseline label offset
    let max_stacked_total = rows
        .iter()
        .map(|row| {
            categories
                .iter()
                .map(|c| segment_value(row, &aggregation.grouping, c))
                .sum::<f64>()
        })
        .fold(f64::NEG_INFINITY, f64::max);
    let primary_top = if max_stacked_total > 0.0 {
        max_stacked_total * BAR_AXIS_HEADROOM
    } else {
        1.0
    };

    let mut commands = Vec::new();

    // 1. Bars, then their labels so text is never covered by a later segment
    if config.show_bars {
        let mut labels = Vec::new();
        for (i, row) in rows.iter().enumerate() {
            let x = i as f64;
            let mut bottom = 0.0;
            for (stack_index, category) in categories.iter().enumerate() {
                let value = segment_value(row, &aggregation.grouping, category);
                let fill = if predicted[i] {
                    category.color.lighten(PREDICTED_LIGHTEN)
                } else {
                    category.color
                };
                let tl = (x - BAR_WIDTH / 2.0, bottom + value);
                let br = (x + BAR_WIDTH / 2.0, bottom);

                commands.push(DrawCommand::DrawRect { tl, br, fill });
                if predicted[i] && value != 0.0 {
                    commands.extend(hatch_commands(tl, br, category.color));
                }

                let segment = BarSegment { stack_index, bottom, value, fill };
                if let Some(label) = place_bar_label(&segment, max_stacked_total) {
                    labels.push(DrawCommand::DrawText {
                        axis: Axis::Primary,
                        at: (x, label.y),
                        text: label.text,
                        style: TextStyle {
                            size: font_size as f64,
                            bold: true,
                            color: label.text_color,
                        },
                        h_anchor: HAnchor::Center,
                        v_anchor: v_anchor_for(label.position),
                    });
                }
                bottom += value;
            }
        }
        commands.extend(labels);
    }

    // 2. Count line on the secondary axis
    let secondary_y = if config.show_line {
        let counts = aggregation.counts();
        let points: Vec<(f64, f64)> = counts.iter().enumerate().map(|(i, &c)| (i as f64, c)).collect();

        // Predicted buckets form a suffix; the dashed part starts at the last actual point
        let first_predicted = predicted.iter().position(|&p| p).unwrap_or(n);
        let solid = &points[..first_predicted];
        let dashed = &points[first_predicted.saturating_sub(1)..];

        if solid.len() >= 2 {
            commands.push(DrawCommand::DrawLine {
                axis: Axis::Secondary,
                points: solid.to_vec(),
                color: config.line_color,
                width: LINE_WIDTH,
                dashed: false,
            });
        }
        if any_predicted && dashed.len() >= 2 {
            commands.push(DrawCommand::DrawLine {
                axis: Axis::Secondary,
                points: dashed.to_vec(),
                color: config.line_color,
                width: LINE_WIDTH,
                dashed: true,
            });
        }

        commands.push(DrawCommand::DrawPoint {
            axis: Axis::Secondary,
            points: points.clone(),
            color: config.line_color,
            radius: MARKER_RADIUS,
        });

        for (i, label) in place_line_labels(&counts, config.line_label_mode, config.line_color)
            .into_iter()
            .enumerate()
        {
            commands.push(DrawCommand::DrawText {
                axis: Axis::Secondary,
                at: (i as f64, label.y),
                text: label.text,
                style: TextStyle {
                    size: font_size as f64,
                    bold: true,
                    color: label.text_color,
                },
                h_anchor: HAnchor::Center,
                v_anchor: v_anchor_for(label.position),
            });
        }

        Some((0.0, line_axis_max(&counts)))
    } else {
        None
    };

    // 3. Legend
    let mut legend = Vec::new();
    if config.show_bars {
        if any_actual {
            legend.extend(categories.iter().map(|c| LegendEntry {
                label: c.label.clone(),
                swatch: LegendSwatch::Solid(c.color),
            }));
        }
        if any_predicted {
            legend.extend(categories.iter().map(|c| LegendEntry {
                label: format!("{}{}", c.label, config.legend.predicted_suffix),
                swatch: LegendSwatch::Hatched(c.color),
            }));
        }
    }
    if config.show_line {
        if any_actual {
            legend.push(LegendEntry {
                label: config.legend.line.clone(),
                swatch: LegendSwatch::Line { color: config.line_color, dashed: false },
            });
        }
        if any_predicted {
            legend.push(LegendEntry {
                label: format!("{}{}", config.legend.line, config.legend.predicted_suffix),
                swatch: LegendSwatch::Line { color: config.line_color, dashed: true },
            });
        }
    }

    let x_labels = rows
        .iter()
        .enumerate()
        .map(|(i, r)| TickLabel { x: i as f64, text: r.period.to_string() })
        .collect();

    Ok(SceneGraph {
        width: config.render.width,
        height: config.render.height,
        title: config.title.clone().filter(|t| !t.trim().is_empty()),
        x_range: (-0.5, n as f64 - 0.5),
        primary_y: (0.0, primary_top),
        secondary_y,
        font_size,
        x_labels,
        commands,
        legend,
    })
}

fn v_anchor_for(position: LabelPosition) -> VAnchor {
    match position {
        LabelPosition::Above | LabelPosition::Baseline => VAnchor::Bottom,
        LabelPosition::Below => VAnchor::Top,
        LabelPosition::Center => VAnchor::Center,
    }
}

/// Diagonal hatch lines plus a dashed outline for a predicted bar segment
fn hatch_commands(tl: (f64, f64), br: (f64, f64), color: Rgb) -> Vec<DrawCommand> {
    let (x0, x1) = (tl.0, br.0);
    let (y0, y1) = (br.1, tl.1);
    let to_data = |u: f64, v: f64| (x0 + u * (x1 - x0), y0 + v * (y1 - y0));

    let mut commands = Vec::new();

    // Lines v = u - c across the unit square, clipped to its edges
    let steps = (2.0 / HATCH_SPACING).round() as i32;
    for k in 1..steps {
        let c = -1.0 + k as f64 * HATCH_SPACING;
        let u_start = c.max(0.0);
        let u_end = (1.0 + c).min(1.0);
        commands.push(DrawCommand::DrawLine {
            axis: Axis::Primary,
            points: vec![to_data(u_start, u_start - c), to_data(u_end, u_end - c)],
            color,
            width: 1.0,
            dashed: false,
        });
    }

    commands.push(DrawCommand::DrawLine {
        axis: Axis::Primary,
        points: vec![(x0, y0), (x0, y1), (x1, y1), (x1, y0), (x0, y0)],
        color,
        width: 1.0,
        dashed: true,
    });

    commands
}
