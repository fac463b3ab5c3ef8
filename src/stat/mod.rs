//! Statistical transforms: histogram binning, kernel density estimates,
//! regression bands and per-group summaries.

pub mod bin;
pub mod contour;
pub mod kde;
pub mod regression;
pub mod student_t;
pub mod summary;
