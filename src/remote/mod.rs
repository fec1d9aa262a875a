//! AI判定（リモート分類器）

pub mod gemini;

pub use gemini::GeminiClient;

use crate::error::{InspectError, Result};
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ExtendedColorType, RgbImage};
use std::borrow::Cow;

/// 長辺を max_side 以下に縮小（アスペクト比維持、拡大はしない）
pub fn fit_within(image: &RgbImage, max_side: u32) -> Cow<'_, RgbImage> {
    let (width, height) = image.dimensions();
    let longest = width.max(height);
    if max_side == 0 || longest <= max_side {
        return Cow::Borrowed(image);
    }

    let scale = max_side as f64 / longest as f64;
    let new_width = ((width as f64 * scale).round() as u32).max(1);
    let new_height = ((height as f64 * scale).round() as u32).max(1);
    Cow::Owned(image::imageops::resize(
        image,
        new_width,
        new_height,
        FilterType::Triangle,
    ))
}

/// JPEGに圧縮してBase64文字列にする
pub fn encode_jpeg_base64(image: &RgbImage, quality: u8, max_side: u32) -> Result<String> {
    let image = fit_within(image, max_side);
    let mut buffer = Vec::new();

    JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
        .encode(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| InspectError::ImageLoad(format!("JPEGエンコードエラー: {}", e)))?;

    Ok(base64::engine::general_purpose::STANDARD.encode(&buffer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_fit_within_keeps_small_image() {
        let img = RgbImage::new(100, 50);
        assert!(matches!(fit_within(&img, 200), Cow::Borrowed(_)));
    }

    #[test]
    fn test_fit_within_scales_longest_side() {
        let img = RgbImage::new(400, 200);
        let fitted = fit_within(&img, 100);
        assert_eq!(fitted.dimensions(), (100, 50));
    }

    #[test]
    fn test_encode_produces_jpeg() {
        let img = RgbImage::from_pixel(16, 16, Rgb([200, 100, 50]));
        let encoded = encode_jpeg_base64(&img, 90, 1024).unwrap();

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .unwrap();
        // JPEG SOI マーカー
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }
}
