//! ローカル画像解析
//!
//! 色空間ビューを1回だけ作り、各検出器を rayon で並列に走らせて LocalMetrics にまとめる。
//! 検出器はすべて純粋関数で、同じ画像からは常に同じ値を返す。

pub mod color_space;
pub mod defects;
pub mod freshness;
pub mod texture;

use crate::error::Result;
use color_space::ColorViews;
use fruit_inspect_common::LocalMetrics;
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// 検出器のしきい値
///
/// 色相は度、彩度・明度・グレーは 0-255、Lab は CIE 単位
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DetectorParams {
    pub brown_hue_min: f32,
    pub brown_hue_max: f32,
    pub brown_saturation_min: f32,
    pub brown_value_min: f32,
    pub brown_value_max: f32,
    pub brown_lightness_max: f32,
    pub brown_a_min: f32,
    pub brown_a_max: f32,
    pub brown_b_min: f32,
    pub brown_b_max: f32,
    /// 褐変マスクのオープニング/クロージング半径（2 で 5x5）
    pub brown_morph_radius: u8,

    pub black_value_max: f32,
    /// グレー値がこれ未満を暗部とする
    pub black_gray_max: u8,
    pub black_morph_radius: u8,
    /// これ以下の面積（px）の黒斑はノイズとして捨てる
    pub black_min_area: u32,

    pub shape_blur_sigma: f32,
    /// 適応閾値の局所平均に使うガウシアンのσ（11px ブロック相当）
    pub shape_block_sigma: f32,
    pub shape_threshold_offset: f32,
    /// 輪郭が見つからない場合の形状スコア
    pub shape_fallback: f64,

    pub canny_low: f32,
    pub canny_high: f32,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            brown_hue_min: 16.0,
            brown_hue_max: 40.0,
            brown_saturation_min: 50.0,
            brown_value_min: 20.0,
            brown_value_max: 200.0,
            brown_lightness_max: 58.8,
            brown_a_min: 5.0,
            brown_a_max: 30.0,
            brown_b_min: 10.0,
            brown_b_max: 40.0,
            brown_morph_radius: 2,
            black_value_max: 50.0,
            black_gray_max: 30,
            black_morph_radius: 1,
            black_min_area: 20,
            shape_blur_sigma: 1.1,
            shape_block_sigma: 2.0,
            shape_threshold_offset: 2.0,
            shape_fallback: 50.0,
            canny_low: 50.0,
            canny_high: 150.0,
        }
    }
}

/// ローカル解析器
#[derive(Debug, Clone, Default)]
pub struct LocalAnalyzer {
    params: DetectorParams,
}

impl LocalAnalyzer {
    pub fn new(params: DetectorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &DetectorParams {
        &self.params
    }

    /// 画像を解析して LocalMetrics を返す
    ///
    /// 失敗するのは面積ゼロの画像（InvalidImage）のみ
    pub fn analyze(&self, image: &RgbImage) -> Result<LocalMetrics> {
        let views = ColorViews::new(image)?;
        let params = &self.params;

        let ((brown, black), ((variance, texture), (shape, freshness))) = rayon::join(
            || {
                rayon::join(
                    || defects::brown_rot_percentage(&views, params),
                    || defects::black_spots_percentage(&views, params),
                )
            },
            || {
                rayon::join(
                    || {
                        rayon::join(
                            || texture::color_variance(&views),
                            || texture::texture_score(&views),
                        )
                    },
                    || {
                        rayon::join(
                            || texture::shape_integrity(&views, params),
                            || freshness::freshness_score(&views, params),
                        )
                    },
                )
            },
        );

        let metrics = LocalMetrics {
            brown_rot_percentage: brown,
            black_spots_percentage: black,
            color_variance: variance,
            texture_score: texture,
            shape_integrity: shape,
            freshness_score: freshness,
        }
        .clamped();

        tracing::debug!(
            "ローカル解析 {}x{}: 褐変 {:.2}%, 黒斑 {:.2}%, 色むら {:.2}, テクスチャ {:.2}, 形状 {:.2}, 鮮度 {:.2}",
            image.width(),
            image.height(),
            metrics.brown_rot_percentage,
            metrics.black_spots_percentage,
            metrics.color_variance,
            metrics.texture_score,
            metrics.shape_integrity,
            metrics.freshness_score
        );

        Ok(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InspectError;
    use image::Rgb;

    #[test]
    fn test_analyze_zero_area() {
        let analyzer = LocalAnalyzer::default();
        let result = analyzer.analyze(&RgbImage::new(0, 0));
        assert!(matches!(result, Err(InspectError::InvalidImage(_))));
    }

    #[test]
    fn test_analyze_tiny_flat_image() {
        let analyzer = LocalAnalyzer::default();
        let metrics = analyzer.analyze(&RgbImage::from_pixel(4, 4, Rgb([10, 200, 10]))).unwrap();
        assert_eq!(metrics.brown_rot_percentage, 0.0);
        assert_eq!(metrics.shape_integrity, 50.0);
    }

    #[test]
    fn test_params_deserialize_partial() {
        let params: DetectorParams = serde_json::from_str(r#"{"blackMinArea": 40}"#).unwrap();
        assert_eq!(params.black_min_area, 40);
        assert_eq!(params.brown_morph_radius, 2);
    }
}
