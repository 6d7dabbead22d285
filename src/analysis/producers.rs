//! Per-category analysis producers.
//!
//! The producers return fixed readings for any image. They define the shape
//! of each category's qualitative fields, which is what the scorer and the
//! report generator depend on.

use crate::imaging::ProcessedImage;
use crate::models::{
    AnalysisResultSet, Category, CategoryResult, Location, ModelDescriptor, ModelInfo,
    ScorerDescriptor,
};
use crate::scoring::SCORER_VERSION;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Version of the producer models.
pub const MODEL_VERSION: &str = "1.0.0";

const HIGH_TURBIDITY: f64 = 0.6;
const POOR_VISIBILITY: f64 = 0.4;

/// Runs the per-category producers over a processed image.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvironmentalAnalyzer;

impl EnvironmentalAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn model_version(&self) -> &'static str {
        MODEL_VERSION
    }

    /// Run the requested producers. Categories come back in aggregation order.
    pub fn analyze(&self, image: &ProcessedImage, analysis_types: &[Category]) -> AnalysisResultSet {
        debug!(
            "Analyzing {} image for {} categories",
            image.dimensions(),
            analysis_types.len()
        );

        let mut results = AnalysisResultSet::new();
        for category in analysis_types {
            results.insert(*category, self.analyze_category(image, *category));
        }

        info!("Produced results for {} categories", results.len());
        results
    }

    fn analyze_category(&self, image: &ProcessedImage, category: Category) -> CategoryResult {
        match category {
            Category::WaterQuality => self.analyze_water_quality(image),
            Category::AirQuality => self.analyze_air_quality(image),
            Category::VisualContamination => self.analyze_visual_contamination(image),
        }
    }

    /// Turbidity, colour and clarity of visible water.
    pub fn analyze_water_quality(&self, _image: &ProcessedImage) -> CategoryResult {
        CategoryResult::new(0.65, 0.7)
            .with_field(
                "turbidity",
                json!({ "value": 0.4, "level": "slightly_turbid", "confidence": 0.7 }),
            )
            .with_field(
                "color_index",
                json!({ "value": 0.3, "dominant_color": "blue", "confidence": 0.7 }),
            )
            .with_field("clarity", json!({ "value": 0.6, "confidence": 0.7 }))
    }

    /// Smog density, visibility and haze.
    pub fn analyze_air_quality(&self, _image: &ProcessedImage) -> CategoryResult {
        CategoryResult::new(0.7, 0.7)
            .with_field(
                "smog_density",
                json!({ "value": 0.3, "type": "gray_smog", "confidence": 0.7 }),
            )
            .with_field(
                "visibility",
                json!({ "value": 0.7, "level": "good", "confidence": 0.7 }),
            )
            .with_field("haze_intensity", json!({ "value": 0.2, "confidence": 0.7 }))
    }

    /// Waste, oil, foam and debris presence plus texture anomalies.
    pub fn analyze_visual_contamination(&self, _image: &ProcessedImage) -> CategoryResult {
        CategoryResult::new(0.8, 0.7)
            .with_field("detected", json!(false))
            .with_field("type", json!("none"))
            .with_field(
                "indicators",
                json!({
                    "plastic": { "presence": 0.1, "confidence": 0.7 },
                    "oil": { "presence": 0.05, "confidence": 0.7 },
                    "foam": { "presence": 0.08, "confidence": 0.7 },
                    "debris": { "presence": 0.12, "confidence": 0.7 }
                }),
            )
            .with_field(
                "texture_anomalies",
                json!({ "anomaly_score": 0.2, "confidence": 0.7 }),
            )
    }

    /// Situational recommendations from the qualitative readings.
    ///
    /// Readings are looked up leniently: a missing or oddly shaped value
    /// simply does not trigger its recommendation.
    pub fn generate_recommendations(
        &self,
        results: &AnalysisResultSet,
        location: Option<&Location>,
    ) -> Vec<String> {
        if let Some(location) = location {
            debug!(
                "Generating recommendations for ({}, {})",
                location.latitude, location.longitude
            );
        }

        let mut recommendations = Vec::new();

        if let Some(water) = results.get(Category::WaterQuality) {
            if reading(water, "turbidity", "value").unwrap_or(0.0) > HIGH_TURBIDITY {
                recommendations
                    .push("High turbidity detected - avoid direct contact with water".to_string());
            }
        }

        if let Some(air) = results.get(Category::AirQuality) {
            if reading(air, "visibility", "value").unwrap_or(1.0) < POOR_VISIBILITY {
                recommendations
                    .push("Poor visibility conditions - limit outdoor activities".to_string());
            }
        }

        if let Some(contamination) = results.get(Category::VisualContamination) {
            let detected = contamination
                .field("detected")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            if detected {
                let kind = contamination
                    .field("type")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown");
                recommendations.push(format!(
                    "Visual contamination detected ({}) - report to local authorities",
                    kind
                ));
            }
        }

        if recommendations.is_empty() {
            recommendations
                .push("Environmental conditions appear normal based on visual analysis".to_string());
        }

        recommendations
    }

    /// Versions and capabilities of the producers and the scorer.
    pub fn model_info(&self) -> ModelInfo {
        let descriptor = |capabilities: &[&str]| ModelDescriptor {
            version: MODEL_VERSION.to_string(),
            capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
        };

        let mut models = BTreeMap::new();
        models.insert(
            "water_quality".to_string(),
            descriptor(&["turbidity_detection", "color_analysis"]),
        );
        models.insert(
            "air_quality".to_string(),
            descriptor(&["visibility_assessment", "smog_detection"]),
        );
        models.insert(
            "contamination".to_string(),
            descriptor(&["waste_detection", "pollution_classification"]),
        );

        ModelInfo {
            models,
            confidence_scorer: ScorerDescriptor {
                version: SCORER_VERSION.to_string(),
                algorithms: vec![
                    "weighted_average".to_string(),
                    "uncertainty_quantification".to_string(),
                ],
            },
        }
    }
}

/// Numeric value nested one level below a result field.
fn reading(result: &CategoryResult, section: &str, key: &str) -> Option<f64> {
    result
        .field(section)
        .and_then(|value| value.get(key))
        .and_then(Value::as_f64)
}
