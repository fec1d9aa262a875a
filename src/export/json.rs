//! JSONスナップショット出力

use crate::error::{InspectError, Result};
use chrono::{DateTime, Utc};
use fruit_inspect_common::{AnalysisResult, ResultSource};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    pub analyzer_version: String,
    pub primary_source: String,
}

/// 出力ドキュメント（画像データは含めない）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub exported_at: DateTime<Utc>,
    pub analysis_result: AnalysisResult,
    pub metadata: ExportMetadata,
}

impl ExportDocument {
    pub fn new(result: &AnalysisResult) -> Self {
        let primary_source = match result.source {
            ResultSource::Remote => "AI Expert Analysis",
            ResultSource::Local => "Computer Vision Analysis",
        };

        Self {
            exported_at: Utc::now(),
            analysis_result: result.clone(),
            metadata: ExportMetadata {
                analyzer_version: env!("CARGO_PKG_VERSION").to_string(),
                primary_source: primary_source.to_string(),
            },
        }
    }
}

pub fn write_export(result: &AnalysisResult, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_string_pretty(&ExportDocument::new(result))?;
    std::fs::write(path, json)?;
    Ok(())
}

/// 一括解析の1件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchEntry {
    pub file_name: String,
    pub result: AnalysisResult,
}

pub fn write_batch(entries: &[BatchEntry], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(entries)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// 出力済みJSONから判定結果を復元
pub fn read_export(path: &Path) -> Result<AnalysisResult> {
    if !path.exists() {
        return Err(InspectError::FileNotFound(path.display().to_string()));
    }

    let content = std::fs::read_to_string(path)?;
    let document: ExportDocument = serde_json::from_str(&content)
        .map_err(|e| InspectError::Export(format!("{}: {}", path.display(), e)))?;
    Ok(document.analysis_result)
}
