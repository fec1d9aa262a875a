//! 鮮度スコア
//!
//! 明るさ・彩度・色の鮮やかさ・エッジ密度を 0-100 の1つのスコアにまとめる。
//! 彩度の重みが最も大きい。

use super::color_space::{mean_std, ColorViews};
use super::DetectorParams;
use fruit_inspect_common::types::round2;
use imageproc::edges::canny;

/// 各指標の内訳
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FreshnessBreakdown {
    pub brightness: f64,
    pub saturation: f64,
    pub vibrancy: f64,
    pub sharpness: f64,
}

impl FreshnessBreakdown {
    pub fn compute(views: &ColorViews<'_>, params: &DetectorParams) -> Self {
        let (lightness, _) = mean_std(views.lab.iter().map(|p| p.l as f64 * 2.55));
        let (saturation, _) = mean_std(views.hsv.iter().map(|p| p.s as f64));

        let channel_std = |c: usize| {
            mean_std(views.rgb.pixels().map(|p| p[c] as f64)).1
        };
        let vibrancy = channel_std(0) + channel_std(1) + channel_std(2);

        let edges = canny(&views.gray, params.canny_low, params.canny_high);
        let edge_pixels = edges.as_raw().iter().filter(|&&v| v > 0).count();
        let edge_density = edge_pixels as f64 / views.pixel_count() as f64 * 100.0;

        Self {
            brightness: (lightness / 255.0 * 120.0).min(100.0),
            saturation: (saturation / 255.0 * 110.0).min(100.0),
            vibrancy: (vibrancy * 0.7).min(100.0),
            sharpness: (edge_density * 10.0).min(100.0),
        }
    }

    pub fn score(&self) -> f64 {
        round2(
            self.brightness * 0.25
                + self.saturation * 0.35
                + self.vibrancy * 0.25
                + self.sharpness * 0.15,
        )
    }
}

pub fn freshness_score(views: &ColorViews<'_>, params: &DetectorParams) -> f64 {
    let breakdown = FreshnessBreakdown::compute(views, params);
    tracing::debug!("鮮度内訳: {:?}", breakdown);
    breakdown.score()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_black_image_scores_zero() {
        let img = RgbImage::from_pixel(20, 20, Rgb([0, 0, 0]));
        let views = ColorViews::new(&img).unwrap();

        assert_eq!(freshness_score(&views, &DetectorParams::default()), 0.0);
    }

    #[test]
    fn test_vivid_beats_dull() {
        let vivid = RgbImage::from_pixel(20, 20, Rgb([230, 40, 30]));
        let dull = RgbImage::from_pixel(20, 20, Rgb([110, 100, 95]));
        let params = DetectorParams::default();

        let vivid_score = freshness_score(&ColorViews::new(&vivid).unwrap(), &params);
        let dull_score = freshness_score(&ColorViews::new(&dull).unwrap(), &params);
        assert!(vivid_score > dull_score);
    }

    #[test]
    fn test_flat_image_has_no_vibrancy_or_edges() {
        let img = RgbImage::from_pixel(20, 20, Rgb([200, 150, 50]));
        let views = ColorViews::new(&img).unwrap();

        let breakdown = FreshnessBreakdown::compute(&views, &DetectorParams::default());
        assert!(breakdown.vibrancy < 1e-6);
        assert_eq!(breakdown.sharpness, 0.0);
        assert!(breakdown.saturation > 50.0);
    }
}
