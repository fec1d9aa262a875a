use crate::error::{InspectError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub path: PathBuf,
    pub file_name: String,
}

/// 解析対象の拡張子（小文字で比較）
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// フォルダ直下の画像をファイル名順に列挙（サブフォルダは見ない）
pub fn scan_folder(folder: &Path) -> Result<Vec<ImageInfo>> {
    if !folder.is_dir() {
        return Err(InspectError::FolderNotFound(folder.display().to_string()));
    }

    let mut images: Vec<ImageInfo> = WalkDir::new(folder)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .is_some_and(|ext| is_image_extension(&ext.to_string_lossy()))
        })
        .map(|e| ImageInfo {
            file_name: e.file_name().to_string_lossy().to_string(),
            path: e.into_path(),
        })
        .collect();

    images.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    tracing::debug!("{} の画像: {}枚", folder.display(), images.len());

    Ok(images)
}

fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
}
