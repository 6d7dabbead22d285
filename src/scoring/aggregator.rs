//! Confidence and environmental score aggregation.
//!
//! Every public operation returns a value, never an error: each one wraps a
//! fallible computation and maps any failure onto its own fallback constant.

use super::adjuster::{adjust_confidence, has_clear_reading};
use super::penalty::{uncertainty_penalty, MAX_UNCERTAINTY_PENALTY};
use super::profile::ScoringProfile;
use crate::error::ScoringError;
use crate::models::{
    AnalysisResultSet, Category, CategoryConfidence, ConfidenceLevel, QualityIndicators,
    ScoringOutcome, NEUTRAL_VALUE,
};
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};

/// Version of the scoring algorithms.
pub const SCORER_VERSION: &str = "1.0.0";

/// Overall confidence when nothing can be computed.
pub const FALLBACK_CONFIDENCE: f64 = 0.3;

/// Environmental score when nothing can be computed.
pub const FALLBACK_SCORE: f64 = 0.5;

/// Lowest overall confidence after the uncertainty penalty.
pub const CONFIDENCE_FLOOR: f64 = 0.1;

const DEFAULT_DETECTION_CLARITY: f64 = 0.5;

const LOW_CONFIDENCE_RECOMMENDATION: f64 = 0.4;
const HIGH_CONFIDENCE_RECOMMENDATION: f64 = 0.8;
const MIN_DATA_COMPLETENESS: f64 = 0.8;
const MIN_RESULT_CONSISTENCY: f64 = 0.6;
const MIN_DETECTION_CLARITY: f64 = 0.5;

/// Scores analysis result sets against a shared, immutable profile.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceScorer<'a> {
    profile: &'a ScoringProfile,
}

impl<'a> ConfidenceScorer<'a> {
    pub fn new(profile: &'a ScoringProfile) -> Self {
        Self { profile }
    }

    pub fn version(&self) -> &'static str {
        SCORER_VERSION
    }

    /// Weighted, uncertainty-penalized confidence across all present categories.
    ///
    /// Returns 0.3 for an empty result set or on any internal failure.
    pub fn overall_confidence(&self, results: &AnalysisResultSet) -> f64 {
        match self.try_overall_confidence(results) {
            Ok(confidence) => {
                info!("Overall confidence calculated: {:.3}", confidence);
                confidence
            }
            Err(ScoringError::EmptyInput) => {
                warn!("No analysis results found for confidence calculation");
                FALLBACK_CONFIDENCE
            }
            Err(e) => {
                error!("Error calculating overall confidence: {}", e);
                FALLBACK_CONFIDENCE
            }
        }
    }

    fn try_overall_confidence(&self, results: &AnalysisResultSet) -> Result<f64, ScoringError> {
        if results.is_empty() {
            return Err(ScoringError::EmptyInput);
        }

        let weights = self.profile.weights.normalized(&results.categories())?;

        let mut weighted = 0.0;
        for ((category, result), weight) in results.iter().zip(weights) {
            let base = result.clamped_confidence(category)?;
            let adjusted = adjust_confidence(base, result, category);
            debug!("{} confidence {:.3} adjusted to {:.3}", category, base, adjusted);
            weighted += adjusted * weight;
        }

        let penalty = uncertainty_penalty(results, self.profile);
        let confidence = (weighted - penalty).max(CONFIDENCE_FLOOR);

        Ok(confidence.clamp(0.0, 1.0))
    }

    /// Confidence-weighted environmental quality, 0 = poor, 1 = excellent.
    ///
    /// Each category's score is shrunk toward 0.5 in proportion to its own
    /// uncertainty before averaging. Returns 0.5 for an empty result set or
    /// on any internal failure.
    pub fn environmental_score(&self, results: &AnalysisResultSet) -> f64 {
        match self.try_environmental_score(results) {
            Ok(score) => {
                info!("Environmental score calculated: {:.3}", score);
                score
            }
            Err(ScoringError::EmptyInput) => {
                warn!("No analysis results found for environmental score calculation");
                FALLBACK_SCORE
            }
            Err(e) => {
                error!("Error calculating environmental score: {}", e);
                FALLBACK_SCORE
            }
        }
    }

    fn try_environmental_score(&self, results: &AnalysisResultSet) -> Result<f64, ScoringError> {
        if results.is_empty() {
            return Err(ScoringError::EmptyInput);
        }

        let weights = self.profile.weights.normalized(&results.categories())?;

        let mut weighted = 0.0;
        for ((category, result), weight) in results.iter().zip(weights) {
            let score = result.score(category)?;
            let confidence = result.clamped_confidence(category)?;
            let blended = score * confidence + NEUTRAL_VALUE * (1.0 - confidence);
            weighted += blended * weight;
        }

        Ok(weighted.clamp(0.0, 1.0))
    }

    /// Descriptive level of a confidence score.
    pub fn confidence_level(&self, confidence: f64) -> ConfidenceLevel {
        self.profile.thresholds.classify(confidence)
    }

    /// Uncertainty penalty of a result set, in [0, 0.3].
    pub fn uncertainty_penalty(&self, results: &AnalysisResultSet) -> f64 {
        uncertainty_penalty(results, self.profile)
    }

    /// Full confidence report. Degrades to fallback values instead of failing.
    pub fn generate_report(&self, results: &AnalysisResultSet) -> ScoringOutcome {
        match self.try_generate_report(results) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Error generating confidence report: {}", e);
                degraded_outcome()
            }
        }
    }

    fn try_generate_report(&self, results: &AnalysisResultSet) -> Result<ScoringOutcome, ScoringError> {
        let overall_confidence = self.overall_confidence(results);
        let environmental_score = self.environmental_score(results);
        let confidence_level = self.confidence_level(overall_confidence);

        let mut individual_confidences = BTreeMap::new();
        for (category, result) in results.iter() {
            let confidence = result.clamped_confidence(category)?;
            individual_confidences.insert(
                category,
                CategoryConfidence {
                    confidence,
                    level: self.confidence_level(confidence),
                },
            );
        }

        let penalty = self.uncertainty_penalty(results);
        let quality = assess_quality(results, penalty);
        let recommendations = recommendations(overall_confidence, &quality);

        Ok(ScoringOutcome {
            overall_confidence,
            confidence_level,
            environmental_score,
            individual_confidences,
            quality_indicators: Some(quality),
            uncertainty_penalty: penalty,
            recommendations,
            error: None,
        })
    }
}

fn assess_quality(results: &AnalysisResultSet, penalty: f64) -> QualityIndicators {
    let data_completeness = results.len() as f64 / Category::ALL.len() as f64;
    let result_consistency = 1.0 - penalty / MAX_UNCERTAINTY_PENALTY;

    let detection_clarity = if results.is_empty() {
        DEFAULT_DETECTION_CLARITY
    } else {
        let clear = results
            .iter()
            .filter(|(category, result)| match has_clear_reading(result, *category) {
                Ok(clear) => clear,
                Err(e) => {
                    warn!("Error assessing detection clarity: {}", e);
                    false
                }
            })
            .count();
        clear as f64 / results.len() as f64
    };

    QualityIndicators {
        data_completeness,
        result_consistency,
        detection_clarity,
    }
}

/// Advice derived from the overall confidence and quality indicators.
///
/// The checks are independent; several may apply at once.
pub fn recommendations(overall_confidence: f64, quality: &QualityIndicators) -> Vec<String> {
    let mut recommendations = Vec::new();

    if overall_confidence < LOW_CONFIDENCE_RECOMMENDATION {
        recommendations.push("Low confidence detected - consider additional data sources".to_string());
    }

    if quality.data_completeness < MIN_DATA_COMPLETENESS {
        recommendations
            .push("Incomplete analysis - some environmental factors not assessed".to_string());
    }

    if quality.result_consistency < MIN_RESULT_CONSISTENCY {
        recommendations
            .push("Inconsistent results detected - manual verification recommended".to_string());
    }

    if quality.detection_clarity < MIN_DETECTION_CLARITY {
        recommendations
            .push("Unclear detection results - image quality may be insufficient".to_string());
    }

    if overall_confidence > HIGH_CONFIDENCE_RECOMMENDATION {
        recommendations.push("High confidence analysis - results are reliable".to_string());
    }

    recommendations
}

fn degraded_outcome() -> ScoringOutcome {
    ScoringOutcome {
        overall_confidence: FALLBACK_CONFIDENCE,
        confidence_level: ConfidenceLevel::Low,
        environmental_score: FALLBACK_SCORE,
        individual_confidences: BTreeMap::new(),
        quality_indicators: None,
        uncertainty_penalty: 0.0,
        recommendations: Vec::new(),
        error: Some("Failed to generate confidence report".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CategoryResult;
    use serde_json::json;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    /// Readings that trigger none of the confidence adjustments.
    fn neutral_result(category: Category, score: f64, confidence: f64) -> CategoryResult {
        let result = CategoryResult::new(score, confidence);
        match category {
            Category::WaterQuality => result
                .with_field("turbidity", json!({ "value": 0.4, "level": "slightly_turbid" }))
                .with_field("color_index", json!({ "dominant_color": "blue" })),
            Category::AirQuality => result
                .with_field("visibility", json!({ "value": 0.7, "level": "good" }))
                .with_field("smog_density", json!({ "type": "gray_smog" })),
            Category::VisualContamination => result
                .with_field("detected", json!(false))
                .with_field("type", json!("none"))
                .with_field("texture_anomalies", json!({ "anomaly_score": 0.3 })),
        }
    }

    fn neutral_set(entries: &[(Category, f64, f64)]) -> AnalysisResultSet {
        entries
            .iter()
            .map(|(category, score, confidence)| {
                (*category, neutral_result(*category, *score, *confidence))
            })
            .collect()
    }

    #[test]
    fn test_empty_input_uses_fallbacks() {
        let profile = ScoringProfile::default();
        let scorer = ConfidenceScorer::new(&profile);
        let empty = AnalysisResultSet::new();

        assert_eq!(scorer.overall_confidence(&empty), 0.3);
        assert_eq!(scorer.environmental_score(&empty), 0.5);

        let outcome = scorer.generate_report(&empty);
        assert!(!outcome.is_degraded());
        assert_eq!(outcome.overall_confidence, 0.3);
        assert_eq!(outcome.environmental_score, 0.5);

        let quality = outcome.quality_indicators.unwrap();
        assert_eq!(quality.data_completeness, 0.0);
        assert_eq!(quality.result_consistency, 1.0);
        assert_eq!(quality.detection_clarity, 0.5);
    }

    #[test]
    fn test_scenario_three_categories_mid_range() {
        let profile = ScoringProfile::default();
        let scorer = ConfidenceScorer::new(&profile);
        let results = neutral_set(&[
            (Category::WaterQuality, 0.75, 0.8),
            (Category::AirQuality, 0.65, 0.65),
            (Category::VisualContamination, 0.40, 0.65),
        ]);

        let score = scorer.environmental_score(&results);
        let confidence = scorer.overall_confidence(&results);

        assert!(score > 0.4 && score < 0.8);
        assert!(confidence > 0.4 && confidence < 0.8);
        assert!(approx(score, 0.584625));
        assert!(approx(confidence, 0.7025));

        let level = scorer.confidence_level(confidence);
        assert_eq!(level, profile.thresholds.classify(confidence));
        assert!(matches!(level, ConfidenceLevel::Medium | ConfidenceLevel::Low));
    }

    #[test]
    fn test_scenario_single_contamination_category() {
        let profile = ScoringProfile::default();
        let scorer = ConfidenceScorer::new(&profile);
        let results: AnalysisResultSet = [(
            Category::VisualContamination,
            CategoryResult::new(0.8, 0.7)
                .with_field("detected", json!(false))
                .with_field("type", json!("none"))
                .with_field("texture_anomalies", json!({ "anomaly_score": 0.2 })),
        )]
        .into_iter()
        .collect();

        let outcome = scorer.generate_report(&results);
        let quality = outcome.quality_indicators.unwrap();

        assert!(approx(quality.data_completeness, 1.0 / 3.0));
        assert!(outcome
            .recommendations
            .iter()
            .any(|r| r.starts_with("Incomplete analysis")));
        assert!(approx(outcome.overall_confidence, 0.7));
        assert!(approx(outcome.environmental_score, 0.71));
    }

    #[test]
    fn test_scenario_low_confidence_category_is_pulled_to_midpoint() {
        let profile = ScoringProfile::default();
        let scorer = ConfidenceScorer::new(&profile);

        let results = neutral_set(&[
            (Category::WaterQuality, 0.5, 0.9),
            (Category::AirQuality, 0.5, 0.1),
        ]);
        assert!(approx(scorer.environmental_score(&results), 0.5));

        // With diverging scores the uncertain category barely moves the
        // aggregate away from the confident one.
        let results = neutral_set(&[
            (Category::WaterQuality, 0.9, 0.9),
            (Category::AirQuality, 0.1, 0.1),
        ]);
        let score = scorer.environmental_score(&results);
        let naive_average = (0.9 + 0.1) / 2.0;
        assert!(approx(score, 0.66));
        assert!((score - naive_average).abs() > 0.1);
    }

    #[test]
    fn test_scenario_low_confidence_majority_penalty() {
        let profile = ScoringProfile::default();
        let scorer = ConfidenceScorer::new(&profile);
        let results = neutral_set(&[
            (Category::WaterQuality, 0.6, 0.3),
            (Category::AirQuality, 0.6, 0.35),
            (Category::VisualContamination, 0.6, 0.5),
        ]);

        let outcome = scorer.generate_report(&results);
        assert!(approx(outcome.uncertainty_penalty, 0.03));
        assert!(approx(
            outcome.quality_indicators.unwrap().result_consistency,
            0.9
        ));
    }

    #[test]
    fn test_negative_increment_keeps_indicators_in_range() {
        let profile = ScoringProfile {
            uncertainty_penalty: -1.0,
            ..ScoringProfile::default()
        };
        let scorer = ConfidenceScorer::new(&profile);
        let results = neutral_set(&[
            (Category::WaterQuality, 0.0, 0.9),
            (Category::AirQuality, 1.0, 0.9),
        ]);

        let outcome = scorer.generate_report(&results);
        assert_eq!(outcome.uncertainty_penalty, 0.0);
        let consistency = outcome.quality_indicators.unwrap().result_consistency;
        assert!((0.0..=1.0).contains(&consistency));
        assert!((CONFIDENCE_FLOOR..=1.0).contains(&outcome.overall_confidence));
    }

    #[test]
    fn test_partial_results_are_renormalized() {
        let profile = ScoringProfile::default();
        let scorer = ConfidenceScorer::new(&profile);
        let results = neutral_set(&[
            (Category::AirQuality, 1.0, 1.0),
            (Category::VisualContamination, 0.0, 1.0),
        ]);

        // Blended scores are the raw scores at full confidence.
        assert!(approx(scorer.environmental_score(&results), 0.35 / 0.65));
    }

    #[test]
    fn test_confidence_floor() {
        let profile = ScoringProfile::default();
        let scorer = ConfidenceScorer::new(&profile);
        let results = neutral_set(&[
            (Category::WaterQuality, 0.0, 0.0),
            (Category::AirQuality, 1.0, 0.0),
            (Category::VisualContamination, 0.0, 0.0),
        ]);

        assert_eq!(scorer.overall_confidence(&results), CONFIDENCE_FLOOR);
    }

    #[test]
    fn test_scores_stay_in_range() {
        let profile = ScoringProfile::default();
        let scorer = ConfidenceScorer::new(&profile);
        let grid = [0.0, 0.35, 0.8, 1.0];

        for &w in &grid {
            for &a in &grid {
                for &v in &grid {
                    for &c in &grid {
                        let results = neutral_set(&[
                            (Category::WaterQuality, w, c),
                            (Category::AirQuality, a, 1.0 - c),
                            (Category::VisualContamination, v, c),
                        ]);

                        let confidence = scorer.overall_confidence(&results);
                        let score = scorer.environmental_score(&results);
                        let penalty = scorer.uncertainty_penalty(&results);

                        assert!((CONFIDENCE_FLOOR..=1.0).contains(&confidence));
                        assert!((0.0..=1.0).contains(&score));
                        assert!((0.0..=MAX_UNCERTAINTY_PENALTY).contains(&penalty));
                    }
                }
            }
        }
    }

    #[test]
    fn test_out_of_range_inputs_are_clamped() {
        let profile = ScoringProfile::default();
        let scorer = ConfidenceScorer::new(&profile);
        let results = neutral_set(&[
            (Category::WaterQuality, 1.8, 1.5),
            (Category::AirQuality, -0.4, 2.0),
        ]);

        let score = scorer.environmental_score(&results);
        let confidence = scorer.overall_confidence(&results);
        assert!((0.0..=1.0).contains(&score));
        assert!((0.0..=1.0).contains(&confidence));
    }

    #[test]
    fn test_score_is_monotonic_in_category_score() {
        let profile = ScoringProfile::default();
        let scorer = ConfidenceScorer::new(&profile);

        let mut previous = f64::NEG_INFINITY;
        for step in 0..=20 {
            let water_score = step as f64 / 20.0;
            let results = neutral_set(&[
                (Category::WaterQuality, water_score, 0.6),
                (Category::AirQuality, 0.3, 0.8),
                (Category::VisualContamination, 0.9, 0.4),
            ]);
            let score = scorer.environmental_score(&results);
            assert!(score >= previous);
            previous = score;
        }
    }

    #[test]
    fn test_operations_are_idempotent() {
        let profile = ScoringProfile::default();
        let scorer = ConfidenceScorer::new(&profile);
        let results = neutral_set(&[
            (Category::WaterQuality, 0.2, 0.9),
            (Category::AirQuality, 0.95, 0.3),
            (Category::VisualContamination, 0.5, 0.35),
        ]);

        assert_eq!(
            scorer.overall_confidence(&results).to_bits(),
            scorer.overall_confidence(&results).to_bits()
        );
        assert_eq!(
            scorer.environmental_score(&results).to_bits(),
            scorer.environmental_score(&results).to_bits()
        );
        assert_eq!(scorer.generate_report(&results), scorer.generate_report(&results));
    }

    #[test]
    fn test_report_breakdown_and_recommendations() {
        let profile = ScoringProfile::default();
        let scorer = ConfidenceScorer::new(&profile);
        let results: AnalysisResultSet = [
            (
                Category::WaterQuality,
                CategoryResult::new(0.9, 0.95)
                    .with_field("turbidity", json!({ "level": "clear" }))
                    .with_field("color_index", json!({ "dominant_color": "blue" })),
            ),
            (
                Category::AirQuality,
                CategoryResult::new(0.85, 0.9)
                    .with_field("visibility", json!({ "level": "excellent" }))
                    .with_field("smog_density", json!({ "type": "gray_smog" })),
            ),
            (
                Category::VisualContamination,
                CategoryResult::new(0.9, 0.85)
                    .with_field("detected", json!(true))
                    .with_field("type", json!("plastic"))
                    .with_field("texture_anomalies", json!({ "anomaly_score": 0.6 })),
            ),
        ]
        .into_iter()
        .collect();

        let outcome = scorer.generate_report(&results);

        assert!(!outcome.is_degraded());
        assert_eq!(outcome.confidence_level, ConfidenceLevel::High);
        assert_eq!(outcome.individual_confidences.len(), 3);
        assert_eq!(
            outcome.individual_confidences[&Category::AirQuality].level,
            ConfidenceLevel::High
        );
        assert_eq!(outcome.quality_indicators.unwrap().detection_clarity, 1.0);
        assert_eq!(
            outcome.recommendations,
            vec!["High confidence analysis - results are reliable".to_string()]
        );
    }

    #[test]
    fn test_recommendations_are_independent() {
        let quality = QualityIndicators {
            data_completeness: 1.0 / 3.0,
            result_consistency: 0.5,
            detection_clarity: 0.0,
        };
        let recs = recommendations(0.2, &quality);

        assert_eq!(recs.len(), 4);
        assert!(recs[0].starts_with("Low confidence"));
        assert!(recs[1].starts_with("Incomplete analysis"));
        assert!(recs[2].starts_with("Inconsistent results"));
        assert!(recs[3].starts_with("Unclear detection"));
    }

    #[test]
    fn test_non_finite_values_degrade_gracefully() {
        let profile = ScoringProfile::default();
        let scorer = ConfidenceScorer::new(&profile);
        let results: AnalysisResultSet = [
            (Category::WaterQuality, CategoryResult::new(0.7, f64::NAN)),
            (Category::AirQuality, CategoryResult::new(0.6, 0.7)),
        ]
        .into_iter()
        .collect();

        assert_eq!(scorer.overall_confidence(&results), FALLBACK_CONFIDENCE);
        assert_eq!(scorer.environmental_score(&results), FALLBACK_SCORE);

        let outcome = scorer.generate_report(&results);
        assert!(outcome.is_degraded());
        assert_eq!(outcome.overall_confidence, 0.3);
        assert_eq!(outcome.confidence_level, ConfidenceLevel::Low);
        assert_eq!(outcome.environmental_score, 0.5);
    }

    #[test]
    fn test_degenerate_weights_use_fallbacks() {
        let profile = ScoringProfile {
            weights: crate::scoring::profile::CategoryWeights {
                water_quality: 0.0,
                air_quality: 0.0,
                visual_contamination: 0.3,
            },
            ..ScoringProfile::default()
        };
        let scorer = ConfidenceScorer::new(&profile);
        let results = neutral_set(&[(Category::WaterQuality, 0.9, 0.9)]);

        assert_eq!(scorer.overall_confidence(&results), FALLBACK_CONFIDENCE);
        assert_eq!(scorer.environmental_score(&results), FALLBACK_SCORE);
    }

    #[test]
    fn test_malformed_readings_do_not_abort_scoring() {
        let profile = ScoringProfile::default();
        let scorer = ConfidenceScorer::new(&profile);
        let results: AnalysisResultSet = [
            (
                Category::WaterQuality,
                CategoryResult::new(0.7, 0.7).with_field("turbidity", json!("clear")),
            ),
            (
                Category::AirQuality,
                neutral_result(Category::AirQuality, 0.7, 0.7),
            ),
        ]
        .into_iter()
        .collect();

        let outcome = scorer.generate_report(&results);
        assert!(!outcome.is_degraded());
        assert!(approx(outcome.overall_confidence, 0.7));
        assert_eq!(outcome.quality_indicators.unwrap().detection_clarity, 0.0);
    }

    #[test]
    fn test_scorer_is_shareable_across_threads() {
        let profile = ScoringProfile::default();
        let scorer = ConfidenceScorer::new(&profile);
        let results = neutral_set(&[
            (Category::WaterQuality, 0.75, 0.8),
            (Category::AirQuality, 0.65, 0.65),
        ]);
        let expected = scorer.generate_report(&results);

        std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| scorer.generate_report(&results)))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }
}
