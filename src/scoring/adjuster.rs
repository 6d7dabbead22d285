//! Per-category confidence adjustment and detection clarity.
//!
//! Both look at the qualitative readings of a category result. Extreme
//! readings (crystal clear or highly turbid water, excellent or poor
//! visibility, a named contamination type) are taken as stronger evidence
//! than middling ones. The two rule sets overlap but are not identical and
//! are kept apart.

use crate::error::HeuristicError;
use crate::models::{Category, CategoryResult};
use serde_json::{Map, Value};
use tracing::warn;

/// Lowest confidence a single category can be adjusted to.
pub const MIN_ADJUSTED_CONFIDENCE: f64 = 0.1;

/// Highest confidence a single category can be adjusted to.
pub const MAX_ADJUSTED_CONFIDENCE: f64 = 1.0;

const CLEAR_BOOST: f64 = 0.1;
const UNCLEAR_COLOR_PENALTY: f64 = 0.15;
const NO_SMOG_SIGNATURE_PENALTY: f64 = 0.05;
const LOW_TEXTURE_PENALTY: f64 = 0.1;
const LOW_TEXTURE_ANOMALY: f64 = 0.2;

const EXTREME_TURBIDITY: [&str; 2] = ["clear", "highly_turbid"];
const EXTREME_VISIBILITY: [&str; 2] = ["excellent", "poor"];
const UNKNOWN_CONTAMINATION: &str = "unknown";

/// Adjust a category's raw confidence by the clarity of its readings.
///
/// The result is always within [0.1, 1.0]. Malformed readings are logged and
/// leave the base confidence unadjusted.
pub fn adjust_confidence(base_confidence: f64, result: &CategoryResult, category: Category) -> f64 {
    let adjusted = match try_adjust(base_confidence, result, category) {
        Ok(adjusted) => adjusted,
        Err(e) => {
            warn!("Error adjusting confidence for {}: {}", category, e);
            base_confidence
        }
    };

    adjusted.clamp(MIN_ADJUSTED_CONFIDENCE, MAX_ADJUSTED_CONFIDENCE)
}

fn try_adjust(
    base_confidence: f64,
    result: &CategoryResult,
    category: Category,
) -> Result<f64, HeuristicError> {
    let mut adjusted = base_confidence;

    match category {
        Category::WaterQuality => {
            if let Some(turbidity) = section(result, category, "turbidity")? {
                if level_in(turbidity, "level", &EXTREME_TURBIDITY) {
                    adjusted += CLEAR_BOOST;
                }
            }

            if let Some(color) = section(result, category, "color_index")? {
                if text(color, "dominant_color") == Some("unclear") {
                    adjusted -= UNCLEAR_COLOR_PENALTY;
                }
            }
        }
        Category::AirQuality => {
            if let Some(visibility) = section(result, category, "visibility")? {
                if level_in(visibility, "level", &EXTREME_VISIBILITY) {
                    adjusted += CLEAR_BOOST;
                }
            }

            if let Some(smog) = section(result, category, "smog_density")? {
                if text(smog, "type") == Some("none") {
                    adjusted -= NO_SMOG_SIGNATURE_PENALTY;
                }
            }
        }
        Category::VisualContamination => {
            if detected(result, category)? && has_named_type(result) {
                adjusted += CLEAR_BOOST;
            }

            // A missing anomaly score counts as zero.
            let anomaly_score = match section(result, category, "texture_anomalies")? {
                Some(texture) => number(texture, category, "texture_anomalies", "anomaly_score")?,
                None => None,
            };
            if anomaly_score.unwrap_or(0.0) < LOW_TEXTURE_ANOMALY {
                adjusted -= LOW_TEXTURE_PENALTY;
            }
        }
    }

    Ok(adjusted)
}

/// Whether a category's primary reading is unambiguous.
///
/// Used for the detection clarity indicator. Unlike the confidence
/// adjustment, a named contamination type counts even when nothing was
/// flagged as detected.
pub fn has_clear_reading(result: &CategoryResult, category: Category) -> Result<bool, HeuristicError> {
    let clear = match category {
        Category::WaterQuality => section(result, category, "turbidity")?
            .is_some_and(|turbidity| level_in(turbidity, "level", &EXTREME_TURBIDITY)),
        Category::AirQuality => section(result, category, "visibility")?
            .is_some_and(|visibility| level_in(visibility, "level", &EXTREME_VISIBILITY)),
        Category::VisualContamination => has_named_type(result),
    };

    Ok(clear)
}

/// Looks up a nested reading. Absent is fine, anything but an object is not.
fn section<'a>(
    result: &'a CategoryResult,
    category: Category,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, HeuristicError> {
    match result.field(key) {
        None => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(HeuristicError {
            category,
            field: key.to_string(),
            expected: "an object",
        }),
    }
}

fn text<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

fn level_in(map: &Map<String, Value>, key: &str, levels: &[&str]) -> bool {
    text(map, key).is_some_and(|level| levels.contains(&level))
}

fn number(
    map: &Map<String, Value>,
    category: Category,
    section: &str,
    key: &str,
) -> Result<Option<f64>, HeuristicError> {
    match map.get(key) {
        None => Ok(None),
        Some(value) => value.as_f64().map(Some).ok_or_else(|| HeuristicError {
            category,
            field: format!("{}.{}", section, key),
            expected: "a number",
        }),
    }
}

fn detected(result: &CategoryResult, category: Category) -> Result<bool, HeuristicError> {
    match result.field("detected") {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(flag)) => Ok(*flag),
        Some(_) => Err(HeuristicError {
            category,
            field: "detected".to_string(),
            expected: "a boolean",
        }),
    }
}

/// A missing contamination type reads as "unknown".
fn has_named_type(result: &CategoryResult) -> bool {
    result
        .field("type")
        .is_some_and(|kind| kind.as_str() != Some(UNKNOWN_CONTAMINATION))
}
