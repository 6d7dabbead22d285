//! Uncertainty penalty.
//!
//! Large disagreement between independently scored categories, or several
//! categories reporting low confidence, make the aggregate less trustworthy
//! than a plain weighted average suggests. The penalty is subtracted from the
//! aggregate confidence, never from the environmental score.

use super::profile::ScoringProfile;
use crate::error::ScoringError;
use crate::models::AnalysisResultSet;
use tracing::{debug, warn};

/// Upper bound of the uncertainty penalty.
pub const MAX_UNCERTAINTY_PENALTY: f64 = 0.3;

/// Score variance above which categories are considered inconsistent.
const VARIANCE_THRESHOLD: f64 = 0.1;

/// Score spread above which categories are considered in extreme disagreement.
const RANGE_THRESHOLD: f64 = 0.6;

const RANGE_PENALTY_FACTOR: f64 = 0.5;
const LOW_CONFIDENCE_PENALTY_FACTOR: f64 = 0.3;
const MIN_LOW_CONFIDENCE_CATEGORIES: usize = 2;

/// Penalty in [0, 0.3]. Falls back to 0 if the result set cannot be read.
pub fn uncertainty_penalty(results: &AnalysisResultSet, profile: &ScoringProfile) -> f64 {
    match try_uncertainty_penalty(results, profile) {
        Ok(penalty) => penalty,
        Err(e) => {
            warn!("Error calculating uncertainty penalty: {}", e);
            0.0
        }
    }
}

pub(crate) fn try_uncertainty_penalty(
    results: &AnalysisResultSet,
    profile: &ScoringProfile,
) -> Result<f64, ScoringError> {
    let increment = profile.uncertainty_penalty;
    let mut penalty = 0.0;

    let scores = results
        .iter()
        .map(|(category, result)| result.score(category))
        .collect::<Result<Vec<_>, _>>()?;

    if scores.len() > 1 {
        let variance = population_variance(&scores);
        if variance > VARIANCE_THRESHOLD {
            debug!("Score variance {:.3} exceeds {}", variance, VARIANCE_THRESHOLD);
            penalty += increment;
        }

        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
        if max - min > RANGE_THRESHOLD {
            debug!("Score range {:.3} exceeds {}", max - min, RANGE_THRESHOLD);
            penalty += increment * RANGE_PENALTY_FACTOR;
        }
    }

    let mut low_confidence_count = 0;
    for (category, result) in results.iter() {
        if result.clamped_confidence(category)? < profile.thresholds.low {
            low_confidence_count += 1;
        }
    }

    if low_confidence_count >= MIN_LOW_CONFIDENCE_CATEGORIES {
        debug!("{} categories report low confidence", low_confidence_count);
        penalty += increment * LOW_CONFIDENCE_PENALTY_FACTOR;
    }

    Ok(penalty.clamp(0.0, MAX_UNCERTAINTY_PENALTY))
}

fn population_variance(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}
