//! Error types.
//!
//! Scoring errors never leave the scoring module: every public scoring
//! operation maps them onto its own fallback value. Validation and image
//! errors are surfaced to the caller.

use crate::models::Category;
use std::path::PathBuf;
use thiserror::Error;

/// Internal failure while aggregating a result set.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScoringError {
    /// The result set has no categories.
    #[error("no analysis results found")]
    EmptyInput,

    /// A score or confidence is NaN or infinite.
    #[error("{field} of {category} is not a finite number")]
    NonFinite {
        category: Category,
        field: &'static str,
    },

    /// The weights of the present categories do not sum to a positive value.
    #[error("category weights sum to {0}, expected a positive total")]
    DegenerateWeights(f64),
}

/// A qualitative sub-field has an unexpected shape.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{category}: field `{field}` is malformed, expected {expected}")]
pub struct HeuristicError {
    pub category: Category,
    pub field: String,
    pub expected: &'static str,
}

/// Request validation failures.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("image_url is required")]
    MissingImageUrl,

    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),

    #[error("URL must use http or https protocol")]
    UnsupportedScheme,

    #[error("Location must include both latitude and longitude")]
    IncompleteLocation,

    #[error("Latitude must be between -90 and 90")]
    LatitudeOutOfRange,

    #[error("Longitude must be between -180 and 180")]
    LongitudeOutOfRange,

    #[error("At least one analysis type must be specified")]
    NoAnalysisTypes,

    #[error("Duplicate analysis types are not allowed")]
    DuplicateAnalysisTypes,

    #[error("Confidence threshold must be between 0 and 1")]
    ThresholdOutOfRange,

    #[error("Image too small. Minimum size: {min_width}x{min_height}")]
    ImageTooSmall { min_width: u32, min_height: u32 },

    #[error("File size must be greater than 0")]
    EmptyFile,

    #[error("File too large. Maximum size: {max_mb:.1}MB")]
    FileTooLarge { max_mb: f64 },
}

/// Image acquisition and preprocessing failures.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("failed to download image: {0}")]
    Download(#[from] reqwest::Error),

    #[error("failed to read image {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("image rejected: {0}")]
    Rejected(#[from] ValidationError),

    #[error("image is corrupted or in an unsupported format: {0}")]
    Decode(#[from] image::ImageError),

    #[error("image processing task failed: {0}")]
    Task(String),
}
