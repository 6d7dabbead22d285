//! Request validation.
//!
//! Shape and range checks run before any image is fetched.

use crate::error::ValidationError;
use crate::models::{AnalysisRequest, Category, ImageSource, Location};
use reqwest::Url;
use std::collections::HashSet;
use tracing::warn;

/// Extensions recognised as images. Others are allowed but logged.
const IMAGE_EXTENSIONS: [&str; 6] = [".jpg", ".jpeg", ".png", ".webp", ".bmp", ".tiff"];

/// Validate a complete analysis request.
pub fn validate_request(request: &AnalysisRequest) -> Result<(), ValidationError> {
    if let ImageSource::Url(ref url) = request.source {
        validate_image_url(url)?;
    }

    if let Some(ref location) = request.location {
        validate_location(location)?;
    }

    validate_analysis_types(&request.analysis_types)
}

/// Validate an image URL: http(s) scheme and a host are required.
pub fn validate_image_url(url: &str) -> Result<(), ValidationError> {
    if url.trim().is_empty() {
        return Err(ValidationError::MissingImageUrl);
    }

    let parsed = Url::parse(url).map_err(|e| ValidationError::InvalidUrl(e.to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ValidationError::UnsupportedScheme);
    }

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(ValidationError::InvalidUrl("missing host".to_string()));
    }

    let path = parsed.path().to_lowercase();
    if !IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        warn!("URL does not have a clear image extension: {}", url);
    }

    Ok(())
}

/// Validate latitude and longitude ranges.
pub fn validate_location(location: &Location) -> Result<(), ValidationError> {
    if !(-90.0..=90.0).contains(&location.latitude) {
        return Err(ValidationError::LatitudeOutOfRange);
    }

    if !(-180.0..=180.0).contains(&location.longitude) {
        return Err(ValidationError::LongitudeOutOfRange);
    }

    Ok(())
}

/// At least one analysis type, no duplicates.
pub fn validate_analysis_types(analysis_types: &[Category]) -> Result<(), ValidationError> {
    if analysis_types.is_empty() {
        return Err(ValidationError::NoAnalysisTypes);
    }

    let unique: HashSet<_> = analysis_types.iter().collect();
    if unique.len() != analysis_types.len() {
        return Err(ValidationError::DuplicateAnalysisTypes);
    }

    Ok(())
}

/// A confidence threshold must lie in [0, 1].
pub fn validate_confidence_threshold(threshold: f64) -> Result<(), ValidationError> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(())
    } else {
        Err(ValidationError::ThresholdOutOfRange)
    }
}

/// Reject images smaller than `min_size` (width, height).
pub fn validate_image_dimensions(
    width: u32,
    height: u32,
    min_size: (u32, u32),
) -> Result<(), ValidationError> {
    if width < min_size.0 || height < min_size.1 {
        warn!("Image too small: {}x{}", width, height);
        return Err(ValidationError::ImageTooSmall {
            min_width: min_size.0,
            min_height: min_size.1,
        });
    }

    Ok(())
}

/// Reject empty files and files above `max_size` bytes.
pub fn validate_file_size(file_size: usize, max_size: usize) -> Result<(), ValidationError> {
    if file_size == 0 {
        return Err(ValidationError::EmptyFile);
    }

    if file_size > max_size {
        warn!("Image file too large: {} bytes", file_size);
        return Err(ValidationError::FileTooLarge {
            max_mb: max_size as f64 / (1024.0 * 1024.0),
        });
    }

    Ok(())
}
