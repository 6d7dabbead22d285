//! Category weight table and confidence thresholds.
//!
//! A [`ScoringProfile`] is built once from configuration and shared by
//! reference with every scorer.

use crate::config::{ScoringConfig, ThresholdsConfig, WeightsConfig};
use crate::error::ScoringError;
use crate::models::{Category, ConfidenceLevel};

/// Relative importance of each category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryWeights {
    pub water_quality: f64,
    pub air_quality: f64,
    pub visual_contamination: f64,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            water_quality: 0.35,
            air_quality: 0.35,
            visual_contamination: 0.30,
        }
    }
}

impl From<&WeightsConfig> for CategoryWeights {
    fn from(config: &WeightsConfig) -> Self {
        Self {
            water_quality: config.water_quality,
            air_quality: config.air_quality,
            visual_contamination: config.visual_contamination,
        }
    }
}

impl CategoryWeights {
    /// Static weight of a category.
    pub fn weight(&self, category: Category) -> f64 {
        match category {
            Category::WaterQuality => self.water_quality,
            Category::AirQuality => self.air_quality,
            Category::VisualContamination => self.visual_contamination,
        }
    }

    /// Weights of `categories` rescaled to sum to 1.
    pub fn normalized(&self, categories: &[Category]) -> Result<Vec<f64>, ScoringError> {
        let total: f64 = categories.iter().map(|c| self.weight(*c)).sum();

        if !(total.is_finite() && total > 0.0) {
            return Err(ScoringError::DegenerateWeights(total));
        }

        Ok(categories.iter().map(|c| self.weight(*c) / total).collect())
    }
}

/// Lower bounds of the confidence levels, highest first.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfidenceThresholds {
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            high: 0.8,
            medium: 0.6,
            low: 0.4,
        }
    }
}

impl From<&ThresholdsConfig> for ConfidenceThresholds {
    fn from(config: &ThresholdsConfig) -> Self {
        Self {
            high: config.high,
            medium: config.medium,
            low: config.low,
        }
    }
}

impl ConfidenceThresholds {
    /// Classify a confidence score.
    pub fn classify(&self, confidence: f64) -> ConfidenceLevel {
        if confidence >= self.high {
            ConfidenceLevel::High
        } else if confidence >= self.medium {
            ConfidenceLevel::Medium
        } else if confidence >= self.low {
            ConfidenceLevel::Low
        } else {
            ConfidenceLevel::VeryLow
        }
    }
}

/// Immutable scoring configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringProfile {
    pub weights: CategoryWeights,
    pub thresholds: ConfidenceThresholds,
    /// Base increment of the uncertainty penalty.
    pub uncertainty_penalty: f64,
}

impl Default for ScoringProfile {
    fn default() -> Self {
        Self {
            weights: CategoryWeights::default(),
            thresholds: ConfidenceThresholds::default(),
            uncertainty_penalty: 0.1,
        }
    }
}

impl From<&ScoringConfig> for ScoringProfile {
    fn from(config: &ScoringConfig) -> Self {
        Self {
            weights: CategoryWeights::from(&config.weights),
            thresholds: ConfidenceThresholds::from(&config.thresholds),
            uncertainty_penalty: config.uncertainty_penalty,
        }
    }
}
