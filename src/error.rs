//! Error taxonomy for the chart engine.
//!
//! `Config` and `Ingest` errors are fatal and propagate to the caller. `Data` and
//! `Numeric` errors are produced by facet/group level stages and are normally
//! recovered by the assembler, which records them as [`crate::ir::Diagnostic`]s.

use thiserror::Error;

/// Result type alias using [`PlotError`].
pub type Result<T> = std::result::Result<T, PlotError>;

#[derive(Error, Debug)]
pub enum PlotError {
    /// Unsupported mode combination or out-of-range parameter.
    #[error("config error: {0}")]
    Config(String),

    /// Empty dataset, or no valid numeric extent for the requested variable.
    #[error("data error: {0}")]
    Data(String),

    /// Too few points for a fit, or a zero-width domain.
    #[error("numeric error: {0}")]
    Numeric(String),

    /// A record failed validation at the ingestion boundary.
    #[error("invalid record at row {row}: {message}")]
    Ingest { row: usize, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlotError {
    pub fn config(message: impl Into<String>) -> Self {
        PlotError::Config(message.into())
    }

    pub fn data(message: impl Into<String>) -> Self {
        PlotError::Data(message.into())
    }

    pub fn numeric(message: impl Into<String>) -> Self {
        PlotError::Numeric(message.into())
    }

    /// True for the error classes the assembler recovers from locally.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PlotError::Data(_) | PlotError::Numeric(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PlotError::config("Shared y-axis is not supported for histograms");
        assert!(err.to_string().starts_with("config error"));

        let err = PlotError::Ingest { row: 3, message: "start > end".to_string() };
        assert!(err.to_string().contains("row 3"));
    }

    #[test]
    fn test_recoverable_classes() {
        assert!(PlotError::data("empty").is_recoverable());
        assert!(PlotError::numeric("n < 3").is_recoverable());
        assert!(!PlotError::config("bad").is_recoverable());
    }
}
