// Library exports for dealchart

pub mod aggregate;
pub mod color;
pub mod compiler;
pub mod config;
pub mod data;
pub mod error;
pub mod filter;
pub mod format;
pub mod graph;
pub mod ir;
pub mod parser;
pub mod placement;
pub mod runtime;
pub mod schema;

pub use error::{ChartError, Result};

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Default)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    #[default]
    Png,
    #[serde(rename = "svg")]
    Svg,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    /// Pixel multiplier for raster output; vector output always uses 1
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default, rename = "type")]
    pub format: OutputFormat,
}

fn default_width() -> u32 { 1200 }
fn default_height() -> u32 { 600 }
fn default_scale() -> f64 { 2.0 }

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            scale: default_scale(),
            format: OutputFormat::Png,
        }
    }
}
