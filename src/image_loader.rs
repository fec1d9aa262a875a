//! 画像の取得（ファイル / URL）

use crate::error::{InspectError, Result};
use image::RgbImage;
use std::path::Path;
use std::time::Duration;

/// SOURCE が http(s) URL かどうか
pub fn is_url(source: &str) -> bool {
    let lower = source.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

pub fn load_file(path: &Path) -> Result<RgbImage> {
    if !path.exists() {
        return Err(InspectError::FileNotFound(path.display().to_string()));
    }

    let image = image::open(path)
        .map_err(|e| InspectError::ImageLoad(format!("{}: {}", path.display(), e)))?;
    Ok(image.to_rgb8())
}

pub fn load_bytes(bytes: &[u8]) -> Result<RgbImage> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| InspectError::ImageLoad(e.to_string()))?;
    Ok(image.to_rgb8())
}

pub async fn download(url: &str, timeout_seconds: u64) -> Result<RgbImage> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds.max(1)))
        .build()
        .map_err(|e| InspectError::Download(e.to_string()))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| InspectError::Download(format!("{}: {}", url, e)))?;

    if !response.status().is_success() {
        return Err(InspectError::Download(format!("{}: HTTP {}", url, response.status())));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| InspectError::Download(format!("{}: {}", url, e)))?;

    load_bytes(&bytes)
}

/// ファイルパスまたはURLから読み込む
pub async fn load_source(source: &str, timeout_seconds: u64) -> Result<RgbImage> {
    if is_url(source) {
        download(source, timeout_seconds).await
    } else {
        load_file(Path::new(source))
    }
}
