//! 色空間変換
//!
//! 入力RGB画像から検出器が共有する読み取り専用のビューを作る:
//! - HSV（色相は度、彩度・明度は 0-255）
//! - CIE Lab（L* 0-100、a*/b* は符号付き）
//! - グレースケール

use crate::error::{InspectError, Result};
use image::{GrayImage, ImageBuffer, Luma, RgbImage};
use palette::{FromColor, Hsv, Lab, Srgb};
use rayon::prelude::*;

/// 検出器用のf32グレースケール
pub type GrayF32 = ImageBuffer<Luma<f32>, Vec<f32>>;

/// HSV画素（h: 0-360度, s/v: 0-255）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HsvPixel {
    pub h: f32,
    pub s: f32,
    pub v: f32,
}

/// CIE Lab画素
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabPixel {
    pub l: f32,
    pub a: f32,
    pub b: f32,
}

/// 1枚の画像から作った色空間ビュー一式
pub struct ColorViews<'a> {
    pub rgb: &'a RgbImage,
    pub hsv: Vec<HsvPixel>,
    pub lab: Vec<LabPixel>,
    pub gray: GrayImage,
}

impl<'a> ColorViews<'a> {
    /// 面積ゼロの画像は InvalidImage
    pub fn new(rgb: &'a RgbImage) -> Result<Self> {
        let (width, height) = rgb.dimensions();
        if width == 0 || height == 0 {
            return Err(InspectError::InvalidImage(format!(
                "画像サイズが0です ({}x{})",
                width, height
            )));
        }

        let (hsv, lab): (Vec<HsvPixel>, Vec<LabPixel>) = rgb
            .as_raw()
            .par_chunks_exact(3)
            .map(|px| convert_pixel(px[0], px[1], px[2]))
            .unzip();

        let gray = image::imageops::grayscale(rgb);

        Ok(Self { rgb, hsv, lab, gray })
    }

    pub fn width(&self) -> u32 {
        self.rgb.width()
    }

    pub fn height(&self) -> u32 {
        self.rgb.height()
    }

    pub fn pixel_count(&self) -> usize {
        self.hsv.len()
    }

    /// グレースケールのf32版（フィルタ計算用）
    pub fn gray_f32(&self) -> GrayF32 {
        to_f32(&self.gray)
    }
}

pub fn to_f32(gray: &GrayImage) -> GrayF32 {
    let data = gray.as_raw().iter().map(|&v| v as f32).collect();
    // サイズは元画像と同じなので失敗しない
    GrayF32::from_raw(gray.width(), gray.height(), data)
        .unwrap_or_else(|| GrayF32::new(gray.width(), gray.height()))
}

fn convert_pixel(r: u8, g: u8, b: u8) -> (HsvPixel, LabPixel) {
    let srgb = Srgb::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);

    let hsv: Hsv = Hsv::from_color(srgb);
    let lab: Lab = Lab::from_color(srgb);

    (
        HsvPixel {
            h: hsv.hue.into_positive_degrees(),
            s: hsv.saturation * 255.0,
            v: hsv.value * 255.0,
        },
        LabPixel {
            l: lab.l,
            a: lab.a,
            b: lab.b,
        },
    )
}

/// 平均と標準偏差（母集団）
pub fn mean_std<I>(values: I) -> (f64, f64)
where
    I: IntoIterator<Item = f64>,
{
    let mut count = 0usize;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for v in values {
        count += 1;
        sum += v;
        sum_sq += v * v;
    }
    if count == 0 {
        return (0.0, 0.0);
    }
    let mean = sum / count as f64;
    let variance = (sum_sq / count as f64 - mean * mean).max(0.0);
    (mean, variance.sqrt())
}
