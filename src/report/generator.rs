//! Markdown report generation.
//!
//! This module generates Markdown pollution assessments from an
//! [`AnalysisReport`]. JSON output is the serialized report itself.

use crate::config::ReportConfig;
use crate::models::{
    AnalysisReport, AnalysisResultSet, AnalysisStatus, Category, ProcessingMetadata,
    QualityIndicators, ScoringOutcome,
};
use anyhow::Result;
use serde_json::Value;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &AnalysisReport, config: &ReportConfig) -> String {
    let precision = config.precision;
    let mut output = String::new();

    // Title
    output.push_str("# EcoLens Pollution Assessment\n\n");

    if report.status == AnalysisStatus::Degraded {
        output.push_str(
            "> ⚠️ **Degraded result:** the confidence report could not be generated. \
             Scores below are fallback values.\n\n",
        );
    }

    // Metadata section
    output.push_str(&generate_metadata_section(&report.processing_metadata));

    // Summary section
    output.push_str(&generate_summary_section(report, precision));

    // Per-category scores
    output.push_str(&generate_category_section(
        &report.pollution_indicators,
        &report.confidence_report,
        precision,
    ));

    // Quality indicators
    if config.include_quality_breakdown {
        if let Some(ref quality) = report.confidence_report.quality_indicators {
            output.push_str(&generate_quality_section(quality, precision));
        }
    }

    // Raw readings
    if config.include_indicators {
        output.push_str(&generate_indicators_section(&report.pollution_indicators));
    }

    // Recommendations
    output.push_str(&generate_recommendations_section(
        &report.recommendations,
        &report.confidence_report.recommendations,
    ));

    // Footer
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ProcessingMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** {}\n", metadata.source));
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        metadata.analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Model Version:** `{}`\n",
        metadata.model_version
    ));

    let types: Vec<&str> = metadata.analysis_types.iter().map(Category::as_str).collect();
    section.push_str(&format!("- **Analysis Types:** {}\n", types.join(", ")));

    if let Some(dimensions) = metadata.image_dimensions {
        section.push_str(&format!("- **Image Dimensions:** {}\n", dimensions));
    }
    if let Some(location) = metadata.location {
        section.push_str(&format!(
            "- **Location:** {:.4}, {:.4}\n",
            location.latitude, location.longitude
        ));
    }
    section.push_str(&format!(
        "- **Analysis Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the summary section.
fn generate_summary_section(report: &AnalysisReport, precision: usize) -> String {
    let outcome = &report.confidence_report;
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str("| Metric | Value |\n");
    section.push_str("|:---|:---:|\n");
    section.push_str(&format!(
        "| Environmental Score | **{:.*}** |\n",
        precision, report.overall_score
    ));
    section.push_str(&format!(
        "| Overall Confidence | {:.*} |\n",
        precision, report.overall_confidence
    ));
    section.push_str(&format!(
        "| Confidence Level | {} {} |\n",
        outcome.confidence_level.emoji(),
        outcome.confidence_level
    ));
    section.push_str(&format!(
        "| Uncertainty Penalty | {:.*} |\n\n",
        precision, outcome.uncertainty_penalty
    ));

    section
}

/// Generate the per-category score table.
fn generate_category_section(
    results: &AnalysisResultSet,
    outcome: &ScoringOutcome,
    precision: usize,
) -> String {
    if results.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Category Breakdown\n\n");
    section.push_str("| Category | Score | Confidence | Level |\n");
    section.push_str("|:---|:---:|:---:|:---:|\n");

    for (category, result) in results.iter() {
        let (confidence, level) = match outcome.individual_confidences.get(&category) {
            Some(c) => (
                format!("{:.*}", precision, c.confidence),
                format!("{} {}", c.level.emoji(), c.level),
            ),
            None => ("-".to_string(), "-".to_string()),
        };

        let score = match result.score(category) {
            Ok(score) => format!("{:.*}", precision, score),
            Err(_) => "-".to_string(),
        };

        section.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            category.title(),
            score,
            confidence,
            level
        ));
    }
    section.push('\n');

    section
}

/// Generate the quality indicator table.
fn generate_quality_section(quality: &QualityIndicators, precision: usize) -> String {
    let mut section = String::new();

    section.push_str("## Quality Indicators\n\n");
    section.push_str("| Indicator | Value |\n");
    section.push_str("|:---|:---:|\n");
    section.push_str(&format!(
        "| Data Completeness | {:.*} |\n",
        precision, quality.data_completeness
    ));
    section.push_str(&format!(
        "| Result Consistency | {:.*} |\n",
        precision, quality.result_consistency
    ));
    section.push_str(&format!(
        "| Detection Clarity | {:.*} |\n\n",
        precision, quality.detection_clarity
    ));

    section
}

/// Generate the raw qualitative readings of every category.
fn generate_indicators_section(results: &AnalysisResultSet) -> String {
    if results.iter().all(|(_, result)| result.fields.is_empty()) {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Pollution Indicators\n\n");

    for (category, result) in results.iter() {
        if result.fields.is_empty() {
            continue;
        }

        section.push_str(&format!("### {}\n\n", category.title()));
        for (key, value) in &result.fields {
            section.push_str(&format!("- **{}:** {}\n", key, format_value(value)));
        }
        section.push('\n');
    }

    section
}

/// Render a reading inline. Objects become `key=value` lists.
fn format_value(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let parts: Vec<String> = map
                .iter()
                .map(|(key, inner)| match inner {
                    Value::Object(_) => format!("{} ({})", key, format_value(inner)),
                    _ => format!("{}={}", key, format_value(inner)),
                })
                .collect();
            parts.join(", ")
        }
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Generate the recommendations section.
fn generate_recommendations_section(situational: &[String], confidence: &[String]) -> String {
    if situational.is_empty() && confidence.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Recommendations\n\n");

    if !situational.is_empty() {
        section.push_str("### Environmental\n\n");
        for (i, rec) in situational.iter().enumerate() {
            section.push_str(&format!("{}. {}\n", i + 1, rec));
        }
        section.push('\n');
    }

    if !confidence.is_empty() {
        section.push_str("### Analysis Quality\n\n");
        for rec in confidence {
            section.push_str(&format!("- {}\n", rec));
        }
        section.push('\n');
    }

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by EcoLens v{}. Scores derive from visual indicators only.*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &AnalysisReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryResult, ImageDimensions, Location};
    use crate::scoring::{ConfidenceScorer, ScoringProfile};
    use chrono::Utc;
    use serde_json::json;

    fn create_test_report() -> AnalysisReport {
        let results: AnalysisResultSet = [
            (
                Category::WaterQuality,
                CategoryResult::new(0.65, 0.7).with_field(
                    "turbidity",
                    json!({ "value": 0.4, "level": "slightly_turbid" }),
                ),
            ),
            (
                Category::VisualContamination,
                CategoryResult::new(0.8, 0.7)
                    .with_field("detected", json!(false))
                    .with_field("indicators", json!({ "oil": { "presence": 0.05 } })),
            ),
        ]
        .into_iter()
        .collect();

        let profile = ScoringProfile::default();
        let outcome = ConfidenceScorer::new(&profile).generate_report(&results);

        AnalysisReport {
            status: AnalysisStatus::Success,
            overall_score: outcome.environmental_score,
            overall_confidence: outcome.overall_confidence,
            confidence_report: outcome,
            pollution_indicators: results,
            recommendations: vec![
                "Environmental conditions appear normal based on visual analysis".to_string(),
            ],
            processing_metadata: ProcessingMetadata {
                model_version: "1.0.0".to_string(),
                analysis_types: vec![Category::WaterQuality, Category::VisualContamination],
                image_dimensions: Some(ImageDimensions {
                    width: 800,
                    height: 600,
                }),
                source: "https://example.com/river.jpg".to_string(),
                location: Some(Location {
                    latitude: 40.7128,
                    longitude: -74.006,
                }),
                analysis_date: Utc::now(),
                duration_seconds: 1.5,
            },
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report, &ReportConfig::default());

        assert!(markdown.contains("# EcoLens Pollution Assessment"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Summary"));
        assert!(markdown.contains("## Category Breakdown"));
        assert!(markdown.contains("| Category | Score | Confidence | Level |"));
        assert!(!markdown.contains("Adjusted Confidence"));
        assert!(markdown.contains("## Quality Indicators"));
        assert!(markdown.contains("## Pollution Indicators"));
        assert!(markdown.contains("### Water Quality"));
        assert!(markdown.contains("level=slightly_turbid"));
        assert!(markdown.contains("oil (presence=0.05)"));
        assert!(markdown.contains("Environmental conditions appear normal"));
        assert!(!markdown.contains("Degraded result"));
    }

    #[test]
    fn test_generate_metadata_section() {
        let report = create_test_report();
        let section = generate_metadata_section(&report.processing_metadata);

        assert!(section.contains("https://example.com/river.jpg"));
        assert!(section.contains("800x600"));
        assert!(section.contains("water_quality, visual_contamination"));
        assert!(section.contains("40.7128, -74.0060"));
        assert!(section.contains("1.5s"));
    }

    #[test]
    fn test_sections_follow_report_config() {
        let report = create_test_report();
        let config = ReportConfig {
            include_indicators: false,
            include_quality_breakdown: false,
            precision: 1,
        };
        let markdown = generate_markdown_report(&report, &config);

        assert!(!markdown.contains("## Pollution Indicators"));
        assert!(!markdown.contains("## Quality Indicators"));
        assert!(markdown.contains("| Water Quality | 0.7 |"));
    }

    #[test]
    fn test_category_scores_are_clamped() {
        let results: AnalysisResultSet = [
            (Category::WaterQuality, CategoryResult::new(1.8, 0.7)),
            (Category::AirQuality, CategoryResult::new(f64::NAN, 0.7)),
        ]
        .into_iter()
        .collect();
        let profile = ScoringProfile::default();
        let outcome = ConfidenceScorer::new(&profile).generate_report(&results);

        let section = generate_category_section(&results, &outcome, 3);
        assert!(section.contains("| Water Quality | 1.000 |"));
        assert!(section.contains("| Air Quality | - |"));
        assert!(!section.contains("1.800"));
    }

    #[test]
    fn test_degraded_report_is_flagged() {
        let mut report = create_test_report();
        report.status = AnalysisStatus::Degraded;

        let markdown = generate_markdown_report(&report, &ReportConfig::default());
        assert!(markdown.contains("Degraded result"));
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&json!("gray_smog")), "gray_smog");
        assert_eq!(format_value(&json!(false)), "false");
        assert_eq!(
            format_value(&json!({ "level": "good", "value": 0.7 })),
            "level=good, value=0.7"
        );
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();

        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["status"], json!("success"));
        assert_eq!(
            value["pollution_indicators"]["water_quality"]["turbidity"]["level"],
            json!("slightly_turbid")
        );
        assert!(value["confidence_report"]["individual_confidences"]["water_quality"].is_object());
        assert_eq!(value["processing_metadata"]["model_version"], json!("1.0.0"));
    }
}
