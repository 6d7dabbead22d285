//! Data models for the pollution assessment.
//!
//! This module contains the core data structures shared by the analysis
//! producers, the confidence scorer and the report generator.

use crate::error::ScoringError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Score and confidence assumed for a category that does not report one.
pub const NEUTRAL_VALUE: f64 = 0.5;

/// Pollution-indicator analysis category.
///
/// The declaration order is the aggregation order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Turbidity and colour of visible water
    #[value(name = "water_quality")]
    WaterQuality,
    /// Smog, haze and visibility
    #[value(name = "air_quality")]
    AirQuality,
    /// Waste, oil, foam and debris
    #[value(name = "visual_contamination")]
    VisualContamination,
}

impl Category {
    /// Every known category, in aggregation order.
    pub const ALL: [Category; 3] = [
        Category::WaterQuality,
        Category::AirQuality,
        Category::VisualContamination,
    ];

    /// Returns the wire name of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::WaterQuality => "water_quality",
            Category::AirQuality => "air_quality",
            Category::VisualContamination => "visual_contamination",
        }
    }

    /// Returns a human-readable title.
    pub fn title(&self) -> &'static str {
        match self {
            Category::WaterQuality => "Water Quality",
            Category::AirQuality => "Air Quality",
            Category::VisualContamination => "Visual Contamination",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "water_quality" => Ok(Category::WaterQuality),
            "air_quality" => Ok(Category::AirQuality),
            "visual_contamination" => Ok(Category::VisualContamination),
            other => Err(format!(
                "Invalid analysis type: {}. Valid types: water_quality, air_quality, visual_contamination",
                other
            )),
        }
    }
}

/// Descriptive confidence level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    /// Below the low threshold
    VeryLow,
    Low,
    Medium,
    High,
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceLevel::VeryLow => write!(f, "Very Low"),
            ConfidenceLevel::Low => write!(f, "Low"),
            ConfidenceLevel::Medium => write!(f, "Medium"),
            ConfidenceLevel::High => write!(f, "High"),
        }
    }
}

impl ConfidenceLevel {
    /// Returns an emoji representation of the level.
    pub fn emoji(&self) -> &'static str {
        match self {
            ConfidenceLevel::VeryLow => "🔴",
            ConfidenceLevel::Low => "🟠",
            ConfidenceLevel::Medium => "🟡",
            ConfidenceLevel::High => "🟢",
        }
    }
}

fn neutral() -> f64 {
    NEUTRAL_VALUE
}

/// Result of one analysis category.
///
/// `overall_score` runs from 0 (worst environmental condition) to 1 (best).
/// The category-specific qualitative readings (turbidity, visibility,
/// contamination type, ...) are kept as a JSON mapping next to the two
/// numeric fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryResult {
    /// Favourability of conditions, 0 = worst, 1 = best.
    #[serde(default = "neutral")]
    pub overall_score: f64,
    /// Producer's self-reported certainty.
    #[serde(default = "neutral")]
    pub confidence: f64,
    /// Category-specific qualitative readings.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl CategoryResult {
    /// Creates a result with no qualitative readings.
    pub fn new(overall_score: f64, confidence: f64) -> Self {
        Self {
            overall_score,
            confidence,
            fields: Map::new(),
        }
    }

    /// Adds a qualitative reading.
    pub fn with_field(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    /// Returns a qualitative reading by name.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Score clamped to [0, 1].
    pub fn score(&self, category: Category) -> Result<f64, ScoringError> {
        unit_interval(self.overall_score, category, "overall_score")
    }

    /// Confidence clamped to [0, 1].
    pub fn clamped_confidence(&self, category: Category) -> Result<f64, ScoringError> {
        unit_interval(self.confidence, category, "confidence")
    }
}

fn unit_interval(value: f64, category: Category, field: &'static str) -> Result<f64, ScoringError> {
    if value.is_finite() {
        Ok(value.clamp(0.0, 1.0))
    } else {
        Err(ScoringError::NonFinite { category, field })
    }
}

/// Per-category results of one request. Absent categories were either not
/// requested or not produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisResultSet(BTreeMap<Category, CategoryResult>);

impl AnalysisResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a result, replacing any previous one for the category.
    pub fn insert(&mut self, category: Category, result: CategoryResult) {
        self.0.insert(category, result);
    }

    pub fn get(&self, category: Category) -> Option<&CategoryResult> {
        self.0.get(&category)
    }

    /// Iterates present categories in aggregation order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &CategoryResult)> {
        self.0.iter().map(|(category, result)| (*category, result))
    }

    /// Present categories in aggregation order.
    pub fn categories(&self) -> Vec<Category> {
        self.0.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Category, CategoryResult)> for AnalysisResultSet {
    fn from_iter<I: IntoIterator<Item = (Category, CategoryResult)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Confidence reported by a single category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryConfidence {
    pub confidence: f64,
    pub level: ConfidenceLevel,
}

/// Indicators describing how trustworthy the aggregate is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityIndicators {
    /// Share of known categories that were analyzed.
    pub data_completeness: f64,
    /// 1 when categories agree, 0 at the maximum uncertainty penalty.
    pub result_consistency: f64,
    /// Share of categories with an unambiguous qualitative reading.
    pub detection_clarity: f64,
}

/// Aggregate scoring of one result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringOutcome {
    pub overall_confidence: f64,
    pub confidence_level: ConfidenceLevel,
    pub environmental_score: f64,
    #[serde(default)]
    pub individual_confidences: BTreeMap<Category, CategoryConfidence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_indicators: Option<QualityIndicators>,
    #[serde(default)]
    pub uncertainty_penalty: f64,
    #[serde(default)]
    pub recommendations: Vec<String>,
    /// Set only when the report could not be generated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScoringOutcome {
    /// Whether this is a degraded fallback outcome.
    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}

/// Geographic location of the photographed site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// Where the analyzed data comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Remote image downloaded over HTTP(S).
    Url(String),
    /// Image file on disk.
    Local(PathBuf),
    /// Pre-computed result set, no image involved.
    Results(PathBuf),
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Url(url) => write!(f, "{}", url),
            ImageSource::Local(path) => write!(f, "file://{}", path.display()),
            ImageSource::Results(path) => write!(f, "results://{}", path.display()),
        }
    }
}

/// A validated-to-be analysis request.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub source: ImageSource,
    pub location: Option<Location>,
    pub analysis_types: Vec<Category>,
}

/// Pixel dimensions of the analyzed image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for ImageDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Outcome status of an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Success,
    /// Scores are fallback values.
    Degraded,
}

/// Metadata about the processing run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingMetadata {
    /// Version of the analysis producers.
    pub model_version: String,
    /// Categories that were requested.
    pub analysis_types: Vec<Category>,
    /// Dimensions after preprocessing; absent when scoring stored results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_dimensions: Option<ImageDimensions>,
    /// Image URL or path that was analyzed.
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    pub analysis_date: DateTime<Utc>,
    pub duration_seconds: f64,
}

/// The complete pollution assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub status: AnalysisStatus,
    /// Raw per-category results.
    pub pollution_indicators: AnalysisResultSet,
    pub overall_score: f64,
    pub overall_confidence: f64,
    pub confidence_report: ScoringOutcome,
    /// Situational recommendations from the analysis producers.
    pub recommendations: Vec<String>,
    pub processing_metadata: ProcessingMetadata,
}

/// Version and capabilities of one analysis model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub version: String,
    pub capabilities: Vec<String>,
}

/// Version and algorithms of the confidence scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorerDescriptor {
    pub version: String,
    pub algorithms: Vec<String>,
}

/// Information about the loaded models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub models: BTreeMap<String, ModelDescriptor>,
    pub confidence_scorer: ScorerDescriptor,
}

/// Service health record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: String,
}

impl HealthStatus {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            service: "environmental-ai-analysis".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_confidence_level_ordering() {
        assert!(ConfidenceLevel::VeryLow < ConfidenceLevel::Low);
        assert!(ConfidenceLevel::Low < ConfidenceLevel::Medium);
        assert!(ConfidenceLevel::Medium < ConfidenceLevel::High);
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!(
            "water_quality".parse::<Category>(),
            Ok(Category::WaterQuality)
        );
        assert_eq!(
            " Air_Quality ".parse::<Category>(),
            Ok(Category::AirQuality)
        );
        assert!("soil_quality".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_order_matches_all() {
        let mut sorted = Category::ALL.to_vec();
        sorted.sort();
        assert_eq!(sorted, Category::ALL.to_vec());
    }

    #[test]
    fn test_missing_score_and_confidence_default_to_neutral() {
        let result: CategoryResult =
            serde_json::from_value(json!({ "detected": true, "type": "plastic" })).unwrap();
        assert_eq!(result.overall_score, 0.5);
        assert_eq!(result.confidence, 0.5);
        assert_eq!(result.field("type"), Some(&json!("plastic")));
    }

    #[test]
    fn test_score_accessors_clamp_and_reject_non_finite() {
        let result = CategoryResult::new(1.7, -0.2);
        assert_eq!(result.score(Category::AirQuality), Ok(1.0));
        assert_eq!(result.clamped_confidence(Category::AirQuality), Ok(0.0));

        let broken = CategoryResult::new(f64::NAN, 0.5);
        assert_eq!(
            broken.score(Category::WaterQuality),
            Err(ScoringError::NonFinite {
                category: Category::WaterQuality,
                field: "overall_score",
            })
        );
    }

    #[test]
    fn test_result_set_serializes_as_plain_map() {
        let set: AnalysisResultSet = [(
            Category::AirQuality,
            CategoryResult::new(0.7, 0.6).with_field("visibility", json!({ "level": "good" })),
        )]
        .into_iter()
        .collect();

        let value = serde_json::to_value(&set).unwrap();
        assert_eq!(value["air_quality"]["overall_score"], json!(0.7));
        assert_eq!(value["air_quality"]["visibility"]["level"], json!("good"));

        let parsed: AnalysisResultSet = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, set);
    }

    #[test]
    fn test_unknown_category_key_is_rejected() {
        let parsed: Result<AnalysisResultSet, _> =
            serde_json::from_value(json!({ "noise_level": { "overall_score": 0.3 } }));
        assert!(parsed.is_err());
    }
}
