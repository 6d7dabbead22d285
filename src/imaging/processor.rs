//! Image decoding and preprocessing.
//!
//! Decoding rejects corrupted data and images below the minimum size.
//! Preprocessing downsizes oversized images (aspect ratio preserved),
//! applies a light Gaussian denoise and a linear contrast stretch.

use crate::config::ImageConfig;
use crate::error::ImageError;
use crate::models::ImageDimensions;
use crate::validation::{validate_file_size, validate_image_dimensions};
use image::imageops::{self, FilterType};
use image::RgbImage;
use tracing::{debug, info};

/// A decoded, preprocessed RGB image ready for analysis.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub pixels: RgbImage,
    /// Dimensions before preprocessing.
    pub original: ImageDimensions,
}

impl ProcessedImage {
    /// Dimensions after preprocessing.
    pub fn dimensions(&self) -> ImageDimensions {
        ImageDimensions {
            width: self.pixels.width(),
            height: self.pixels.height(),
        }
    }
}

/// Turns raw image bytes into a [`ProcessedImage`].
#[derive(Debug, Clone)]
pub struct ImageProcessor {
    config: ImageConfig,
}

impl ImageProcessor {
    pub fn new(config: &ImageConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Decode, validate and preprocess an encoded image.
    pub fn process(&self, bytes: &[u8]) -> Result<ProcessedImage, ImageError> {
        validate_file_size(bytes.len(), self.config.max_file_size)?;

        let decoded = image::load_from_memory(bytes)?;
        let original = ImageDimensions {
            width: decoded.width(),
            height: decoded.height(),
        };
        debug!("Decoded image: {}", original);

        validate_image_dimensions(
            original.width,
            original.height,
            (self.config.min_width, self.config.min_height),
        )?;

        let pixels = self.preprocess(decoded.to_rgb8());
        let processed = ProcessedImage { pixels, original };

        info!("Image successfully processed: {}", processed.dimensions());
        Ok(processed)
    }

    fn preprocess(&self, image: RgbImage) -> RgbImage {
        let resized = self.downscale(image);

        let denoised = if self.config.denoise_sigma > 0.0 {
            imageops::blur(&resized, self.config.denoise_sigma)
        } else {
            resized
        };

        enhance_contrast(denoised, self.config.contrast_alpha, self.config.contrast_beta)
    }

    fn downscale(&self, image: RgbImage) -> RgbImage {
        let (width, height) = image.dimensions();
        let (max_width, max_height) = (self.config.max_width, self.config.max_height);

        if width <= max_width && height <= max_height {
            return image;
        }

        let scale = f64::min(
            max_width as f64 / width as f64,
            max_height as f64 / height as f64,
        );
        let new_width = ((width as f64 * scale) as u32).max(1);
        let new_height = ((height as f64 * scale) as u32).max(1);

        info!("Image resized to: {}x{}", new_width, new_height);
        imageops::resize(&image, new_width, new_height, FilterType::Triangle)
    }
}

/// Linear contrast stretch `alpha * v + beta`, saturating at 0 and 255.
pub fn enhance_contrast(mut image: RgbImage, alpha: f32, beta: f32) -> RgbImage {
    for pixel in image.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            *channel = (*channel as f32 * alpha + beta).round().clamp(0.0, 255.0) as u8;
        }
    }
    image
}
