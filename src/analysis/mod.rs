//! Analysis producers.
//!
//! Turns a processed image into an [`AnalysisResultSet`](crate::models::AnalysisResultSet)
//! and derives situational recommendations from it.

pub mod producers;

pub use producers::EnvironmentalAnalyzer;
