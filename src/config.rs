//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.ecolens.toml` files.

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".ecolens.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Confidence scoring settings.
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Image acquisition and preprocessing settings.
    #[serde(default)]
    pub image: ImageConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "ecolens_report.md".to_string()
}

/// Weights, thresholds and penalty settings of the confidence scorer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Base increment of the uncertainty penalty.
    #[serde(default = "default_uncertainty_penalty")]
    pub uncertainty_penalty: f64,

    /// Relative importance of each category.
    #[serde(default)]
    pub weights: WeightsConfig,

    /// Confidence level thresholds.
    #[serde(default)]
    pub thresholds: ThresholdsConfig,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            uncertainty_penalty: default_uncertainty_penalty(),
            weights: WeightsConfig::default(),
            thresholds: ThresholdsConfig::default(),
        }
    }
}

fn default_uncertainty_penalty() -> f64 {
    0.1
}

impl ScoringConfig {
    /// Check ranges the scorer relies on. Errors name the offending field.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.uncertainty_penalty.is_finite() && self.uncertainty_penalty >= 0.0,
            "scoring.uncertainty_penalty must be a non-negative number, got {}",
            self.uncertainty_penalty
        );

        let weights = [
            ("water_quality", self.weights.water_quality),
            ("air_quality", self.weights.air_quality),
            ("visual_contamination", self.weights.visual_contamination),
        ];
        for (name, weight) in weights {
            ensure!(
                weight.is_finite() && weight >= 0.0,
                "scoring.weights.{} must be a non-negative number, got {}",
                name,
                weight
            );
        }

        let thresholds = &self.thresholds;
        for (name, value) in [
            ("high", thresholds.high),
            ("medium", thresholds.medium),
            ("low", thresholds.low),
        ] {
            ensure!(
                (0.0..=1.0).contains(&value),
                "scoring.thresholds.{} must be between 0 and 1, got {}",
                name,
                value
            );
        }
        ensure!(
            thresholds.high >= thresholds.medium && thresholds.medium >= thresholds.low,
            "scoring.thresholds must satisfy high >= medium >= low, got {} / {} / {}",
            thresholds.high,
            thresholds.medium,
            thresholds.low
        );

        Ok(())
    }
}

/// Category weights. They are renormalized over the categories present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_water_weight")]
    pub water_quality: f64,

    #[serde(default = "default_air_weight")]
    pub air_quality: f64,

    #[serde(default = "default_contamination_weight")]
    pub visual_contamination: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            water_quality: default_water_weight(),
            air_quality: default_air_weight(),
            visual_contamination: default_contamination_weight(),
        }
    }
}

fn default_water_weight() -> f64 {
    0.35
}

fn default_air_weight() -> f64 {
    0.35
}

fn default_contamination_weight() -> f64 {
    0.30
}

/// Lower bounds of the high, medium and low confidence levels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdsConfig {
    #[serde(default = "default_high_threshold")]
    pub high: f64,

    #[serde(default = "default_medium_threshold")]
    pub medium: f64,

    #[serde(default = "default_low_threshold")]
    pub low: f64,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            high: default_high_threshold(),
            medium: default_medium_threshold(),
            low: default_low_threshold(),
        }
    }
}

fn default_high_threshold() -> f64 {
    0.8
}

fn default_medium_threshold() -> f64 {
    0.6
}

fn default_low_threshold() -> f64 {
    0.4
}

/// Image acquisition and preprocessing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Images larger than this are downscaled (aspect ratio preserved).
    #[serde(default = "default_max_dimension")]
    pub max_width: u32,

    #[serde(default = "default_max_dimension")]
    pub max_height: u32,

    /// Images smaller than this are rejected.
    #[serde(default = "default_min_dimension")]
    pub min_width: u32,

    #[serde(default = "default_min_dimension")]
    pub min_height: u32,

    /// Maximum file size in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,

    /// Download timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Gaussian sigma of the noise reduction pass (0 disables it).
    #[serde(default = "default_denoise_sigma")]
    pub denoise_sigma: f32,

    /// Contrast gain.
    #[serde(default = "default_contrast_alpha")]
    pub contrast_alpha: f32,

    /// Brightness offset added after the contrast gain.
    #[serde(default = "default_contrast_beta")]
    pub contrast_beta: f32,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_width: default_max_dimension(),
            max_height: default_max_dimension(),
            min_width: default_min_dimension(),
            min_height: default_min_dimension(),
            max_file_size: default_max_file_size(),
            timeout_seconds: default_timeout(),
            denoise_sigma: default_denoise_sigma(),
            contrast_alpha: default_contrast_alpha(),
            contrast_beta: default_contrast_beta(),
        }
    }
}

fn default_max_dimension() -> u32 {
    1024
}

fn default_min_dimension() -> u32 {
    100
}

fn default_max_file_size() -> usize {
    10 * 1024 * 1024 // 10MB
}

fn default_timeout() -> u64 {
    30
}

fn default_denoise_sigma() -> f32 {
    0.8
}

fn default_contrast_alpha() -> f32 {
    1.1
}

fn default_contrast_beta() -> f32 {
    10.0
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Include the raw per-category readings in Markdown reports.
    #[serde(default = "default_true")]
    pub include_indicators: bool,

    /// Include the quality indicator table in Markdown reports.
    #[serde(default = "default_true")]
    pub include_quality_breakdown: bool,

    /// Decimal places used for scores in Markdown reports.
    #[serde(default = "default_precision")]
    pub precision: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            include_indicators: true,
            include_quality_breakdown: true,
            precision: default_precision(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_precision() -> usize {
    3
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .scoring
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(timeout) = args.timeout {
            self.image.timeout_seconds = timeout;
        }

        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
