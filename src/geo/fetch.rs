//! Background map retrieval.
//!
//! The map image is fetched once per run, with a timeout and no retry.
//! Sources starting with `http://` or `https://` go over the network;
//! anything else is read as a local file path.

use image::RgbImage;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Default background: map of Brazil matching [`super::BoundingBox::BRAZIL`].
pub const DEFAULT_BACKGROUND_URL: &str =
    "https://i.pinimg.com/originals/3a/0c/e1/3a0ce18b3c842748c255bc0aa445ad41.jpg";

/// Errors raised while retrieving the background image.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not decode background image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Fetch and decode the background image from `source`.
pub async fn fetch_background(source: &str, timeout: Duration) -> Result<RgbImage, RetrievalError> {
    let bytes = if source.starts_with("http://") || source.starts_with("https://") {
        fetch_remote(source, timeout).await?
    } else {
        let path = PathBuf::from(source);
        debug!("Reading background from {}", path.display());
        tokio::fs::read(path.clone())
            .await
            .map_err(|source| RetrievalError::Io { path, source })?
    };

    let image = image::load_from_memory(&bytes)?.to_rgb8();
    info!(
        "Background image loaded ({}x{})",
        image.width(),
        image.height()
    );
    Ok(image)
}

async fn fetch_remote(url: &str, timeout: Duration) -> Result<Vec<u8>, RetrievalError> {
    info!("Fetching background image: {} (timeout {}s)", url, timeout.as_secs());

    let http_err = |source| RetrievalError::Http {
        url: url.to_string(),
        source,
    };

    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(http_err)?;

    let response = client.get(url).send().await.map_err(http_err)?;

    let status = response.status();
    if !status.is_success() {
        return Err(RetrievalError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let bytes = response.bytes().await.map_err(http_err)?;
    debug!("Downloaded {} bytes", bytes.len());
    Ok(bytes.to_vec())
}
