pub mod json;

pub use json::{read_export, write_batch, write_export, BatchEntry, ExportDocument, ExportMetadata};

use crate::error::{InspectError, Result};
use image::RgbImage;
use std::path::Path;

const OVERLAY_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// 注釈画像を保存（形式は拡張子で決める）
pub fn save_overlay(image: &RgbImage, path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if !OVERLAY_EXTENSIONS.contains(&ext.as_str()) {
        return Err(InspectError::Export(format!(
            "未対応の画像形式です（png/jpg/jpeg）: {}",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    image
        .save(path)
        .map_err(|e| InspectError::Export(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_save_overlay_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("overlay.png");
        let img = RgbImage::from_pixel(8, 8, Rgb([1, 2, 3]));

        save_overlay(&img, &path).unwrap();

        let loaded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(loaded, img);
    }

    #[test]
    fn test_save_overlay_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let img = RgbImage::new(4, 4);

        let err = save_overlay(&img, &dir.path().join("overlay.bmpx")).unwrap_err();
        assert!(matches!(err, InspectError::Export(_)));
    }
}
