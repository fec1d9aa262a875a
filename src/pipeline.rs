//! 解析パイプライン
//!
//! ローカル解析（CPU、spawn_blocking）とAI判定（I/O）を同時に走らせ、
//! 両方そろってから統合する。新しい画像が投入されたら古い解析結果は捨てる。

use crate::config::Config;
use crate::error::{InspectError, Result};
use crate::remote::GeminiClient;
use crate::vision::LocalAnalyzer;
use fruit_inspect_common::{AnalysisResult, FusionEngine};
use image::RgbImage;
use std::sync::Arc;
use tokio::sync::watch;

/// 1枚の画像を検査する
#[derive(Debug, Clone)]
pub struct Inspector {
    analyzer: LocalAnalyzer,
    remote: Option<GeminiClient>,
    fusion: FusionEngine,
}

impl Inspector {
    pub fn new(analyzer: LocalAnalyzer, remote: Option<GeminiClient>, fusion: FusionEngine) -> Self {
        Self {
            analyzer,
            remote,
            fusion,
        }
    }

    /// 設定から生成
    ///
    /// offline またはAPIキー未設定の場合はローカル解析のみ
    pub fn from_config(config: &Config, offline: bool) -> Result<Self> {
        let remote = if offline {
            None
        } else {
            match GeminiClient::from_config(config) {
                Ok(client) => Some(client),
                Err(InspectError::MissingApiKey) => {
                    tracing::warn!("APIキーが未設定のためローカル解析のみで判定します");
                    None
                }
                Err(e) => return Err(e),
            }
        };

        Ok(Self::new(
            LocalAnalyzer::new(config.detector.clone()),
            remote,
            FusionEngine::new(config.fusion.clone()),
        ))
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub fn analyzer(&self) -> &LocalAnalyzer {
        &self.analyzer
    }

    /// 検査を実行
    ///
    /// 返すエラーは InvalidImage と Task（ワーカー異常終了）のみ。
    /// AI判定の失敗はローカル解析のみの判定に切り替わる。
    pub async fn inspect(&self, image: Arc<RgbImage>) -> Result<AnalysisResult> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(InspectError::InvalidImage(format!(
                "画像サイズが0です ({}x{})",
                width, height
            )));
        }

        let analyzer = self.analyzer.clone();
        let local_image = Arc::clone(&image);
        let local_task = tokio::task::spawn_blocking(move || analyzer.analyze(&local_image));

        let remote_task = async {
            match &self.remote {
                Some(client) => client.analyze(Arc::clone(&image)).await,
                None => None,
            }
        };

        let (local, remote) = tokio::join!(local_task, remote_task);
        let local = local.map_err(|e| InspectError::Task(e.to_string()))??;

        Ok(self.fusion.fuse(&local, remote.as_ref()))
    }
}

/// 画像セッション
///
/// 同時に有効な解析は1つだけ。submit するたびに世代が進み、
/// 古い世代の解析は結果を返さずに終わる。
#[derive(Debug)]
pub struct AnalysisSession {
    inspector: Arc<Inspector>,
    generation: watch::Sender<u64>,
}

impl AnalysisSession {
    pub fn new(inspector: Arc<Inspector>) -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            inspector,
            generation,
        }
    }

    pub fn generation(&self) -> u64 {
        *self.generation.borrow()
    }

    /// 実行中の解析を無効にする
    pub fn cancel(&self) {
        self.generation.send_modify(|g| *g += 1);
    }

    /// 新しい画像を解析する
    ///
    /// 完了前に次の submit/cancel があった場合は Ok(None)
    pub async fn submit(&self, image: Arc<RgbImage>) -> Result<Option<AnalysisResult>> {
        let mut ticket = 0;
        self.generation.send_modify(|g| {
            *g += 1;
            ticket = *g;
        });
        let mut rx = self.generation.subscribe();

        tokio::select! {
            result = self.inspector.inspect(image) => {
                if *self.generation.borrow() != ticket {
                    tracing::debug!("世代 {} の解析結果は破棄されました", ticket);
                    return Ok(None);
                }
                result.map(Some)
            }
            _ = rx.wait_for(|g| *g != ticket) => {
                tracing::debug!("世代 {} の解析を中断しました", ticket);
                Ok(None)
            }
        }
    }
}
