// Library exports for fragplot

pub mod color;
pub mod compiler;
pub mod config;
pub mod data;
pub mod error;
pub mod facet;
pub mod ir;
pub mod legend;
pub mod palette;
pub mod parser;
pub mod resolve;
pub mod runtime;
pub mod scale;
pub mod stat;

pub use error::{PlotError, Result};
pub use runtime::{compute_render_plan, compute_render_plan_with_options};

use serde::{Deserialize, Serialize};

/// Canvas the facet grid is laid out on, in pixels.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
    /// Gap between neighbouring facet cells.
    #[serde(default = "default_padding")]
    pub padding: f64,
}

fn default_width() -> f64 {
    800.0
}

fn default_height() -> f64 {
    600.0
}

fn default_padding() -> f64 {
    20.0
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            padding: default_padding(),
        }
    }
}
