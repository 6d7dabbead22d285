//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::error::ValidationError;
use crate::models::{AnalysisRequest, Category, ImageSource, Location};
use crate::validation::{validate_confidence_threshold, validate_request};
use clap::error::ErrorKind;
use clap::Parser;
use std::path::PathBuf;

/// EcoLens - pollution assessment from environmental photos
///
/// Scores water quality, air quality and visual contamination indicators
/// of an image and reports an overall environmental score with a
/// confidence measure. Markdown/JSON reports.
///
/// Examples:
///   ecolens --image-url https://example.com/river.jpg
///   ecolens --image-url https://example.com/river.jpg --latitude 40.71 --longitude -74.0
///   ecolens --local ./site.png --analysis-types water_quality,visual_contamination
///   ecolens --results ./results.json --format json --min-confidence 0.6
///   ecolens --model-info
///   ecolens --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// URL of the image to analyze
    ///
    /// Must use http or https. Not required with --local, --results,
    /// --model-info, --health or --init-config.
    #[arg(
        short = 'u',
        long,
        value_name = "URL",
        required_unless_present_any = ["local", "results", "model_info", "health", "init_config"],
        conflicts_with_all = ["local", "results"]
    )]
    pub image_url: Option<String>,

    /// Local image file to analyze instead of downloading
    #[arg(long, value_name = "FILE", conflicts_with = "results")]
    pub local: Option<PathBuf>,

    /// Score a pre-computed result set (JSON) instead of an image
    ///
    /// The file maps category names to results, e.g.
    /// {"water_quality": {"overall_score": 0.6, "confidence": 0.8}}
    #[arg(long, value_name = "FILE")]
    pub results: Option<PathBuf>,

    /// Latitude of the photographed site
    #[arg(long, allow_negative_numbers = true)]
    pub latitude: Option<f64>,

    /// Longitude of the photographed site
    #[arg(long, allow_negative_numbers = true)]
    pub longitude: Option<f64>,

    /// Categories to analyze (comma-separated)
    ///
    /// Defaults to all: water_quality, air_quality, visual_contamination
    #[arg(short, long, value_name = "TYPES", value_delimiter = ',')]
    pub analysis_types: Option<Vec<Category>>,

    /// Output file path for the report
    ///
    /// Default: from config or ecolens_report.md
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .ecolens.toml in the current directory
    #[arg(short, long, value_name = "FILE", env = "ECOLENS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Download timeout in seconds
    ///
    /// Default: from config or 30s.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Fail if the overall confidence is below this value
    ///
    /// Useful for pipelines. Exit code 2 when the analysis is less
    /// confident than required. Range 0.0 - 1.0.
    #[arg(long, value_name = "CONFIDENCE")]
    pub min_confidence: Option<f64>,

    /// Print model versions and capabilities as JSON and exit
    #[arg(long, conflicts_with = "health")]
    pub model_info: bool,

    /// Print the service health record as JSON and exit
    #[arg(long)]
    pub health: bool,

    /// Generate a default .ecolens.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    ///
    /// Help and version output exit 0. Any other parse error exits 1, the
    /// same code as a validation failure, so 2 stays reserved for
    /// --min-confidence.
    pub fn parse_args() -> Self {
        match Self::try_parse() {
            Ok(args) => args,
            Err(e) if is_display_request(e.kind()) => e.exit(),
            Err(e) => {
                let _ = e.print();
                std::process::exit(1);
            }
        }
    }

    /// Whether the run only prints information and exits.
    pub fn is_info_mode(&self) -> bool {
        self.init_config || self.model_info || self.health
    }

    /// Requested categories, all of them when none were given.
    pub fn analysis_types(&self) -> Vec<Category> {
        self.analysis_types
            .clone()
            .unwrap_or_else(|| Category::ALL.to_vec())
    }

    /// Build the analysis request described by the arguments.
    pub fn to_request(&self) -> Result<AnalysisRequest, ValidationError> {
        let source = if let Some(ref path) = self.results {
            ImageSource::Results(path.clone())
        } else if let Some(ref path) = self.local {
            ImageSource::Local(path.clone())
        } else {
            let url = self
                .image_url
                .as_deref()
                .ok_or(ValidationError::MissingImageUrl)?;
            ImageSource::Url(url.to_string())
        };

        let location = match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Location {
                latitude,
                longitude,
            }),
            (None, None) => None,
            _ => return Err(ValidationError::IncompleteLocation),
        };

        Ok(AnalysisRequest {
            source,
            location,
            analysis_types: self.analysis_types(),
        })
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        // Skip request validation for informational modes
        if self.is_info_mode() {
            return Ok(());
        }

        let request = self.to_request().map_err(|e| e.to_string())?;
        validate_request(&request).map_err(|e| e.to_string())?;

        if let Some(threshold) = self.min_confidence {
            validate_confidence_threshold(threshold).map_err(|e| e.to_string())?;
        }

        // Validate timeout if provided
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        // Validate input files if provided
        for path in [&self.local, &self.results].into_iter().flatten() {
            if !path.exists() {
                return Err(format!("Input file does not exist: {}", path.display()));
            }
            if !path.is_file() {
                return Err(format!("Input path is not a file: {}", path.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

/// Whether clap stopped to show help or version text rather than on an error.
fn is_display_request(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
    )
}
