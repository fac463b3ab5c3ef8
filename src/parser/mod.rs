// Pipeline DSL parser: `aes(...) | histogram(...) | facet_grid(...)` into a VisualizationConfig

pub mod aesthetics;
pub mod ast;
pub mod facet;
pub mod geom;
pub mod labels;
pub mod lexer;
pub mod pipeline;
pub mod scale;

// Public API re-exports
pub use pipeline::{parse_config, parse_plot_config};
