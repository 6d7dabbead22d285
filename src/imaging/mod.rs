//! Image acquisition and preprocessing.

pub mod fetcher;
pub mod processor;

pub use fetcher::{read_local_image, ImageFetcher};
pub use processor::{ImageProcessor, ProcessedImage};
