//! Image acquisition.
//!
//! Downloads remote images over HTTP(S) or reads them from disk, enforcing
//! the configured file size limit before any decoding happens.

use crate::config::ImageConfig;
use crate::error::ImageError;
use crate::validation::validate_file_size;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Downloads images with a timeout and a size cap.
pub struct ImageFetcher {
    client: reqwest::Client,
    max_file_size: usize,
    show_progress: bool,
}

impl ImageFetcher {
    /// Create a fetcher from the image settings.
    pub fn new(config: &ImageConfig, show_progress: bool) -> Result<Self, ImageError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("ecolens/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            max_file_size: config.max_file_size,
            show_progress,
        })
    }

    /// Download the raw bytes of an image.
    ///
    /// The body is streamed so an oversized image is rejected as soon as it
    /// crosses the limit, even when the server sends no content length.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>, ImageError> {
        info!("Downloading image from: {}", url);

        let response = self.client.get(url).send().await?.error_for_status()?;

        if let Some(length) = response.content_length() {
            debug!("Reported content length: {} bytes", length);
            validate_file_size(length as usize, self.max_file_size)?;
        }

        let progress = self.progress_bar();
        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            bytes.extend_from_slice(&chunk);

            if bytes.len() > self.max_file_size {
                progress.finish_and_clear();
                validate_file_size(bytes.len(), self.max_file_size)?;
            }

            progress.set_message(format!("Downloading image... {} KB", bytes.len() / 1024));
        }

        progress.finish_and_clear();
        validate_file_size(bytes.len(), self.max_file_size)?;

        info!("Downloaded {} bytes", bytes.len());
        Ok(bytes)
    }

    fn progress_bar(&self) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    }
}

/// Read the raw bytes of a local image file.
pub fn read_local_image(path: &Path, max_file_size: usize) -> Result<Vec<u8>, ImageError> {
    info!("Loading local image: {}", path.display());

    let io_error = |source| ImageError::Io {
        path: path.to_path_buf(),
        source,
    };

    let metadata = std::fs::metadata(path).map_err(io_error)?;
    validate_file_size(metadata.len() as usize, max_file_size)?;

    std::fs::read(path).map_err(io_error)
}
