//! Confidence and environmental scoring.
//!
//! Pure, stateless aggregation over an [`AnalysisResultSet`](crate::models::AnalysisResultSet).

pub mod adjuster;
pub mod aggregator;
pub mod penalty;
pub mod profile;

pub use aggregator::{ConfidenceScorer, SCORER_VERSION};
pub use profile::ScoringProfile;
