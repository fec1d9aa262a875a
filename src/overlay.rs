//! 欠陥オーバーレイ描画
//!
//! 褐変（オレンジ）と黒斑（赤）のマスクを元画像に 6:4 で重ね、
//! 任意で判定色の帯（判定ラベル + 鮮度バー）を上部に付ける。入力画像は変更しない。

use crate::error::Result;
use crate::vision::color_space::ColorViews;
use crate::vision::{defects, DetectorParams};
use fruit_inspect_common::{AnalysisResult, Condition};
use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

pub const ROT_COLOR: Rgb<u8> = Rgb([255, 165, 0]);
pub const SPOT_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// 帯の高さ（px）
pub const BANNER_HEIGHT: u32 = 60;

#[derive(Debug, Clone)]
pub struct OverlayOptions {
    pub banner: bool,
    /// 重ねる色の割合（0.4 で 元画像60% / 色40%）
    pub overlay_ratio: f32,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            banner: true,
            overlay_ratio: 0.4,
        }
    }
}

/// 判定ごとの帯の色
pub fn condition_color(condition: Condition) -> Rgb<u8> {
    match condition {
        Condition::Bad => Rgb([255, 0, 0]),
        Condition::Poor => Rgb([255, 100, 0]),
        Condition::Fair => Rgb([255, 165, 0]),
        Condition::Good => Rgb([0, 255, 0]),
        Condition::Excellent => Rgb([127, 255, 0]),
        Condition::InsectDamaged => Rgb([139, 0, 0]),
        Condition::ConflictingResults => Rgb([255, 99, 71]),
    }
}

/// 注釈付き画像を生成
pub fn render_overlay(
    image: &RgbImage,
    result: &AnalysisResult,
    params: &DetectorParams,
    options: &OverlayOptions,
) -> Result<RgbImage> {
    let views = ColorViews::new(image)?;
    let mut annotated = image.clone();

    if result.local.brown_rot_percentage > 0.0 {
        let mask = defects::brown_rot_mask(&views, params);
        blend_mask(&mut annotated, &mask, ROT_COLOR, options.overlay_ratio);
    }
    if result.local.black_spots_percentage > 0.0 {
        let mask = defects::black_spot_mask(&views, params);
        blend_mask(&mut annotated, &mask, SPOT_COLOR, options.overlay_ratio);
    }

    if options.banner {
        Ok(with_banner(&annotated, result))
    } else {
        Ok(annotated)
    }
}

fn blend_mask(target: &mut RgbImage, mask: &GrayImage, color: Rgb<u8>, ratio: f32) {
    let ratio = ratio.clamp(0.0, 1.0);
    for (x, y, m) in mask.enumerate_pixels() {
        if m[0] == 0 {
            continue;
        }
        let px = target.get_pixel_mut(x, y);
        for c in 0..3 {
            let blended = px[c] as f32 * (1.0 - ratio) + color[c] as f32 * ratio;
            px[c] = blended.round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// 上部に判定色の帯と鮮度バーを付けた新しい画像
fn with_banner(image: &RgbImage, result: &AnalysisResult) -> RgbImage {
    let width = image.width();
    let mut canvas = RgbImage::from_pixel(width, image.height() + BANNER_HEIGHT, Rgb([0, 0, 0]));

    draw_filled_rect_mut(
        &mut canvas,
        Rect::at(0, 0).of_size(width, BANNER_HEIGHT),
        condition_color(result.condition),
    );

    draw_label(&mut canvas, result.condition);

    image::imageops::replace(&mut canvas, image, 0, BANNER_HEIGHT as i64);

    // 鮮度バー
    let margin = 10u32;
    if width > margin * 2 {
        let track = width - margin * 2;
        let bar_y = (BANNER_HEIGHT - 18) as i32;
        draw_filled_rect_mut(
            &mut canvas,
            Rect::at(margin as i32, bar_y).of_size(track, 10),
            Rgb([60, 60, 60]),
        );

        let filled = (track as f64 * result.freshness_score.clamp(0.0, 100.0) / 100.0).round() as u32;
        if filled > 0 {
            let bar_color = if result.freshness_score > 75.0 {
                Rgb([0, 200, 0])
            } else {
                Rgb([255, 165, 0])
            };
            draw_filled_rect_mut(
                &mut canvas,
                Rect::at(margin as i32, bar_y).of_size(filled, 10),
                bar_color,
            );
        }
    }

    canvas
}

/// 帯の文字の上端（px）
const LABEL_TOP: u32 = 8;
const LABEL_MARGIN: u32 = 10;
const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;

/// 5x7 ドットの英大文字（各行の下位5ビット、左端が bit4）
const GLYPHS: [[u8; 7]; 26] = [
    [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11], // A
    [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E], // B
    [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E], // C
    [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E], // D
    [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F], // E
    [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10], // F
    [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F], // G
    [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11], // H
    [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E], // I
    [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C], // J
    [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11], // K
    [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F], // L
    [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11], // M
    [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11], // N
    [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E], // O
    [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10], // P
    [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D], // Q
    [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11], // R
    [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E], // S
    [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04], // T
    [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E], // U
    [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04], // V
    [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A], // W
    [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11], // X
    [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04], // Y
    [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F], // Z
];

/// 帯の色に対して読める文字色
fn label_color(background: Rgb<u8>) -> Rgb<u8> {
    let luma = 0.299 * background[0] as f32 + 0.587 * background[1] as f32 + 0.114 * background[2] as f32;
    if luma > 128.0 {
        Rgb([0, 0, 0])
    } else {
        Rgb([255, 255, 255])
    }
}

/// 判定ラベルを帯に描く（幅に収まる最大の倍率、最小1倍で右端は切れる）
fn draw_label(canvas: &mut RgbImage, condition: Condition) {
    let text = condition.label().replace('_', " ");
    let advance = GLYPH_WIDTH + 1;
    let available = canvas.width().saturating_sub(LABEL_MARGIN * 2);
    let text_width = text.chars().count() as u32 * advance;
    let scale = (1..=3u32)
        .rev()
        .find(|s| text_width * s <= available)
        .unwrap_or(1);
    let color = label_color(condition_color(condition));

    for (i, ch) in text.chars().enumerate() {
        if !ch.is_ascii_uppercase() {
            continue;
        }
        let glyph = GLYPHS[(ch as u8 - b'A') as usize];
        let left = LABEL_MARGIN + i as u32 * advance * scale;

        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (0x10 >> col) == 0 {
                    continue;
                }
                draw_filled_rect_mut(
                    canvas,
                    Rect::at((left + col * scale) as i32, (LABEL_TOP + row as u32 * scale) as i32)
                        .of_size(scale, scale),
                    color,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fruit_inspect_common::{FusionEngine, LocalMetrics};

    fn result_with(brown: f64, black: f64, freshness: f64) -> AnalysisResult {
        let metrics = LocalMetrics {
            brown_rot_percentage: brown,
            black_spots_percentage: black,
            freshness_score: freshness,
            ..Default::default()
        };
        FusionEngine::default().fuse(&metrics, None)
    }

    #[test]
    fn test_banner_adds_height() {
        let img = RgbImage::from_pixel(40, 30, Rgb([90, 200, 70]));
        let result = result_with(0.0, 0.0, 90.0);

        let out = render_overlay(&img, &result, &DetectorParams::default(), &OverlayOptions::default())
            .unwrap();

        assert_eq!(out.dimensions(), (40, 30 + BANNER_HEIGHT));
        assert_eq!(*out.get_pixel(0, 0), condition_color(result.condition));
        assert_eq!(*out.get_pixel(5, BANNER_HEIGHT + 5), Rgb([90, 200, 70]));
    }

    #[test]
    fn test_no_banner_keeps_size_and_clean_pixels() {
        let img = RgbImage::from_pixel(40, 30, Rgb([90, 200, 70]));
        let options = OverlayOptions {
            banner: false,
            ..Default::default()
        };

        let out = render_overlay(&img, &result_with(0.0, 0.0, 90.0), &DetectorParams::default(), &options)
            .unwrap();

        assert_eq!(out, img);
    }

    #[test]
    fn test_black_spot_blended_red() {
        let mut img = RgbImage::from_pixel(40, 40, Rgb([220, 60, 50]));
        for y in 10..20 {
            for x in 10..20 {
                img.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
        let options = OverlayOptions {
            banner: false,
            ..Default::default()
        };

        let out = render_overlay(&img, &result_with(0.0, 6.25, 50.0), &DetectorParams::default(), &options)
            .unwrap();

        // 0.6 * 0 + 0.4 * 255 = 102
        assert_eq!(*out.get_pixel(15, 15), Rgb([102, 0, 0]));
        assert_eq!(*out.get_pixel(30, 30), Rgb([220, 60, 50]));
    }

    #[test]
    fn test_brown_rot_blended_orange() {
        let mut img = RgbImage::from_pixel(40, 40, Rgb([90, 200, 70]));
        for y in 10..30 {
            for x in 10..30 {
                img.put_pixel(x, y, Rgb([130, 70, 20]));
            }
        }
        let options = OverlayOptions {
            banner: false,
            ..Default::default()
        };

        let out = render_overlay(&img, &result_with(25.0, 0.0, 50.0), &DetectorParams::default(), &options)
            .unwrap();

        // (130,70,20) * 0.6 + (255,165,0) * 0.4
        assert_eq!(*out.get_pixel(20, 20), Rgb([180, 108, 12]));
        assert_eq!(*out.get_pixel(2, 2), Rgb([90, 200, 70]));
    }

    #[test]
    fn test_banner_draws_condition_label() {
        let img = RgbImage::from_pixel(200, 30, Rgb([90, 200, 70]));
        let result = result_with(30.0, 0.0, 50.0);
        assert_eq!(result.condition, Condition::Bad);

        let out = render_overlay(&img, &result, &DetectorParams::default(), &OverlayOptions::default())
            .unwrap();

        // "B" の1行目は左端の列が空き、2列目から点灯（3倍）
        assert_eq!(*out.get_pixel(LABEL_MARGIN + 3, LABEL_TOP), Rgb([255, 255, 255]));
        assert_eq!(*out.get_pixel(LABEL_MARGIN, LABEL_TOP), condition_color(Condition::Bad));
        assert_eq!(*out.get_pixel(0, 0), condition_color(Condition::Bad));
    }

    #[test]
    fn test_label_color_contrast() {
        assert_eq!(label_color(Rgb([0, 255, 0])), Rgb([0, 0, 0]));
        assert_eq!(label_color(Rgb([139, 0, 0])), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_zero_area_is_error() {
        let result = result_with(0.0, 0.0, 90.0);
        assert!(render_overlay(
            &RgbImage::new(0, 0),
            &result,
            &DetectorParams::default(),
            &OverlayOptions::default()
        )
        .is_err());
    }

    #[test]
    fn test_condition_colors_distinct() {
        assert_eq!(condition_color(Condition::ConflictingResults), Rgb([255, 99, 71]));
        assert_ne!(condition_color(Condition::Good), condition_color(Condition::Excellent));
    }
}
