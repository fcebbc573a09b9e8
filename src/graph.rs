use anyhow::Context;
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::FontStyle;
use tracing::{debug, warn};

use crate::color::Rgb;
use crate::error::{ChartError, Result};
use crate::ir::{Axis, DrawCommand, HAnchor, LegendSwatch, SceneGraph, TextStyle, VAnchor};
use crate::RenderOptions;

// Layout in logical pixels; raster output multiplies by the scale factor
const MARGIN: f64 = 20.0;
const TITLE_AREA: f64 = 50.0;
const TITLE_FONT_SIZE: f64 = 18.0;
const X_LABEL_AREA: f64 = 40.0;
const LEGEND_FONT_SIZE: f64 = 12.0;
const LEGEND_SWATCH: (f64, f64) = (24.0, 12.0);
const LEGEND_ROW: f64 = 20.0;
const DASH: (f64, f64) = (6.0, 4.0);

const FONT_FAMILY: &str = "sans-serif";

/// Draw on the primary or secondary coordinate system of a dual-axis chart
macro_rules! draw_on {
    ($chart:expr, $axis:expr, $series:expr) => {
        match $axis {
            Axis::Primary => $chart.draw_series($series).map(|_| ()),
            Axis::Secondary => $chart.draw_secondary_series($series).map(|_| ()),
        }
    };
}

/// Render a scene to PNG bytes at `options.scale` times its logical size
pub fn render_png(scene: &SceneGraph, options: &RenderOptions) -> Result<Vec<u8>> {
    let scale = options.scale;
    let width = scaled(scene.width as f64, scale).max(1) as u32;
    let height = scaled(scene.height as f64, scale).max(1) as u32;

    let mut buffer = vec![0u8; (width as usize) * (height as usize) * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        draw_scene(&root, scene, scale)
            .and_then(|_| root.present().context("Failed to present drawing"))
            .map_err(render_error)?;
    }

    let mut png_bytes = Vec::new();
    {
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(&buffer, width, height, image::ColorType::Rgb8)
            .map_err(|e| ChartError::Render(format!("Failed to encode PNG: {}", e)))?;
    }

    debug!(width, height, bytes = png_bytes.len(), "Encoded PNG");
    Ok(png_bytes)
}

/// Render a scene to an SVG document at its logical size
pub fn render_svg(scene: &SceneGraph) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (scene.width, scene.height)).into_drawing_area();
        draw_scene(&root, scene, 1.0)
            .and_then(|_| root.present().context("Failed to present drawing"))
            .map_err(render_error)?;
    }

    debug!(bytes = svg.len(), "Rendered SVG");
    Ok(svg)
}

fn render_error(e: anyhow::Error) -> ChartError {
    ChartError::Render(format!("{:#}", e))
}

fn scaled(value: f64, scale: f64) -> i32 {
    (value * scale).round() as i32
}

fn to_rgb(color: Rgb) -> RGBColor {
    RGBColor(color.0, color.1, color.2)
}

fn text_style(style: &TextStyle, h: HAnchor, v: VAnchor, scale: f64) -> plotters::style::TextStyle<'static> {
    let font = (FONT_FAMILY, style.size * scale).into_font();
    let font = if style.bold { font.style(FontStyle::Bold) } else { font };
    font.color(&to_rgb(style.color)).pos(Pos::new(
        match h {
            HAnchor::Left => HPos::Left,
            HAnchor::Center => HPos::Center,
            HAnchor::Right => HPos::Right,
        },
        match v {
            VAnchor::Top => VPos::Top,
            VAnchor::Center => VPos::Center,
            VAnchor::Bottom => VPos::Bottom,
        },
    ))
}

/// Text needs system fonts on raster backends; a missing font drops the text only
fn skip_text_failure<T, E: std::fmt::Display>(result: std::result::Result<T, E>, what: &str) {
    if let Err(e) = result {
        warn!("Skipping {} render: {}", what, e);
    }
}

/// Execute a scene graph on any plotters backend
fn draw_scene<DB>(root: &DrawingArea<DB, Shift>, scene: &SceneGraph, scale: f64) -> anyhow::Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).context("Failed to fill background")?;

    // 1. Plot area
    let top = if scene.title.is_some() { TITLE_AREA } else { MARGIN };
    let plot_area = root.margin(
        scaled(top, scale),
        scaled(X_LABEL_AREA, scale),
        scaled(MARGIN, scale),
        scaled(MARGIN, scale),
    );
    let (plot_left, plot_top) = plot_area.get_base_pixel();
    let (plot_width, plot_height) = plot_area.dim_in_pixel();

    let (x0, x1) = scene.x_range;
    let (y0, y1) = scene.primary_y;
    let (s0, s1) = scene.secondary_y.unwrap_or((0.0, 1.0));

    let mut chart = ChartBuilder::on(&plot_area)
        .build_cartesian_2d(x0..x1, y0..y1)
        .context("Failed to build chart")?
        .set_secondary_coord(x0..x1, s0..s1);

    // 2. Scene commands, in order
    for command in &scene.commands {
        match command {
            DrawCommand::DrawRect { tl, br, fill } => {
                let rect = Rectangle::new([*tl, *br], to_rgb(*fill).filled());
                chart
                    .draw_series(std::iter::once(rect))
                    .context("Failed to draw bar")?;
            }
            DrawCommand::DrawLine { axis, points, color, width, dashed } => {
                let style = to_rgb(*color).stroke_width(scaled(*width, scale).max(1) as u32);
                if *dashed {
                    let (dash, gap) = (scaled(DASH.0, scale), scaled(DASH.1, scale));
                    draw_on!(chart, axis, DashedLineSeries::new(points.clone(), dash, gap, style))
                        .context("Failed to draw dashed line")?;
                } else {
                    draw_on!(chart, axis, LineSeries::new(points.clone(), style))
                        .context("Failed to draw line")?;
                }
            }
            DrawCommand::DrawPoint { axis, points, color, radius } => {
                let style = to_rgb(*color).filled();
                let r = scaled(*radius, scale);
                draw_on!(chart, axis, points.iter().map(|&p| Circle::new(p, r, style)))
                    .context("Failed to draw markers")?;
            }
            DrawCommand::DrawText { axis, at, text, style, h_anchor, v_anchor } => {
                let style = text_style(style, *h_anchor, *v_anchor, scale);
                skip_text_failure(
                    draw_on!(chart, axis, std::iter::once(Text::new(text.clone(), *at, style.clone()))),
                    "label",
                );
            }
        }
    }

    // 3. Year labels under each bucket
    let tick_style = TextStyle {
        size: (scene.font_size + 1) as f64,
        bold: false,
        color: crate::color::BLACK,
    };
    let tick_style = text_style(&tick_style, HAnchor::Center, VAnchor::Top, scale);
    let tick_y = plot_top + plot_height as i32 + scaled(8.0, scale);
    for tick in &scene.x_labels {
        let px = plot_left + ((tick.x - x0) / (x1 - x0) * plot_width as f64).round() as i32;
        skip_text_failure(
            root.draw(&Text::new(tick.text.as_str(), (px, tick_y), tick_style.clone())),
            "year label",
        );
    }

    // 4. Title
    if let Some(title) = &scene.title {
        let style = TextStyle {
            size: TITLE_FONT_SIZE,
            bold: true,
            color: crate::color::BLACK,
        };
        let style = text_style(&style, HAnchor::Center, VAnchor::Center, scale);
        let at = (scaled(scene.width as f64 / 2.0, scale), scaled(TITLE_AREA / 2.0, scale));
        skip_text_failure(root.draw(&Text::new(title.as_str(), at, style)), "title");
    }

    // 5. Legend, upper left of the plot area, unframed
    draw_legend(root, scene, (plot_left, plot_top), scale)?;

    Ok(())
}

fn draw_legend<DB>(
    root: &DrawingArea<DB, Shift>,
    scene: &SceneGraph,
    origin: (i32, i32),
    scale: f64,
) -> anyhow::Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (sw, sh) = (scaled(LEGEND_SWATCH.0, scale), scaled(LEGEND_SWATCH.1, scale));
    let label_style = TextStyle {
        size: LEGEND_FONT_SIZE,
        bold: false,
        color: crate::color::BLACK,
    };
    let label_style = text_style(&label_style, HAnchor::Left, VAnchor::Center, scale);

    for (i, entry) in scene.legend.iter().enumerate() {
        let x = origin.0 + scaled(10.0, scale);
        let y = origin.1 + scaled(10.0 + i as f64 * LEGEND_ROW, scale);
        let mid = y + sh / 2;

        match &entry.swatch {
            LegendSwatch::Solid(color) => {
                root.draw(&Rectangle::new([(x, y), (x + sw, y + sh)], to_rgb(*color).filled()))
                    .context("Failed to draw legend swatch")?;
            }
            LegendSwatch::Hatched(color) => {
                let ink = to_rgb(*color);
                let fill = to_rgb(color.lighten(0.45));
                root.draw(&Rectangle::new([(x, y), (x + sw, y + sh)], fill.filled()))
                    .context("Failed to draw legend swatch")?;
                let mut offset = 0;
                while offset < sw + sh {
                    let (ax, ay) = (x + offset.min(sw), y + (offset - sw).max(0));
                    let (bx, by) = (x + (offset - sh).max(0), y + offset.min(sh));
                    root.draw(&PathElement::new(vec![(ax, ay), (bx, by)], ink.stroke_width(1)))
                        .context("Failed to draw legend hatch")?;
                    offset += scaled(4.0, scale).max(2);
                }
                root.draw(&Rectangle::new([(x, y), (x + sw, y + sh)], ink.stroke_width(1)))
                    .context("Failed to draw legend swatch")?;
            }
            LegendSwatch::Line { color, dashed } => {
                let style = to_rgb(*color).stroke_width(scaled(2.0, scale).max(1) as u32);
                let segments = if *dashed {
                    let third = sw / 3;
                    vec![(x, x + third), (x + 2 * third, x + sw)]
                } else {
                    vec![(x, x + sw)]
                };
                for (a, b) in segments {
                    root.draw(&PathElement::new(vec![(a, mid), (b, mid)], style))
                        .context("Failed to draw legend line")?;
                }
            }
        }

        let at = (x + sw + scaled(6.0, scale), mid);
        skip_text_failure(
            root.draw(&Text::new(entry.label.as_str(), at, label_style.clone())),
            "legend label",
        );
    }

    Ok(())
}
