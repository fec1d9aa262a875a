//! 色むら・表面テクスチャ・形状の指標

use super::color_space::{mean_std, to_f32, ColorViews, GrayF32};
use super::DetectorParams;
use fruit_inspect_common::types::round2;
use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};
use imageproc::filter::{filter3x3, gaussian_blur_f32};
use imageproc::geometry::{arc_length, convex_hull};
use imageproc::point::Point;

const K_LAPLACIAN: [f32; 9] = [0.0, 1.0, 0.0, 1.0, -4.0, 1.0, 0.0, 1.0, 0.0];
const K_SOBEL_X: [f32; 9] = [-1.0, 0.0, 1.0, -2.0, 0.0, 2.0, -1.0, 0.0, 1.0];
const K_SOBEL_Y: [f32; 9] = [-1.0, -2.0, -1.0, 0.0, 0.0, 0.0, 1.0, 2.0, 1.0];
const K_SHARPEN: [f32; 9] = [-1.0, -1.0, -1.0, -1.0, 8.0, -1.0, -1.0, -1.0, -1.0];

/// Lab各チャンネルの標準偏差の重み付き平均（明度を重視）
///
/// 明度は 8bit 換算（L*×2.55）で評価する
pub fn color_variance(views: &ColorViews<'_>) -> f64 {
    let (_, l_std) = mean_std(views.lab.iter().map(|p| p.l as f64 * 2.55));
    let (_, a_std) = mean_std(views.lab.iter().map(|p| p.a as f64));
    let (_, b_std) = mean_std(views.lab.iter().map(|p| p.b as f64));

    round2(l_std * 0.5 + a_std * 0.25 + b_std * 0.25)
}

/// 表面の粗さ: ラプラシアン分散・勾配強度・鮮鋭化応答の合成（上限100）
pub fn texture_score(views: &ColorViews<'_>) -> f64 {
    let gray = views.gray_f32();

    let laplacian: Vec<f32> = filter3x3(&gray, &K_LAPLACIAN).into_raw();
    let (_, lap_std) = mean_std(laplacian.iter().map(|&v| v as f64));
    let lap_variance = lap_std * lap_std;

    let gx: Vec<f32> = filter3x3(&gray, &K_SOBEL_X).into_raw();
    let gy: Vec<f32> = filter3x3(&gray, &K_SOBEL_Y).into_raw();
    let (gradient, _) = mean_std(
        gx.iter()
            .zip(gy.iter())
            .map(|(x, y)| ((x * x + y * y) as f64).sqrt()),
    );

    let sharpen: Vec<f32> = filter3x3(&gray, &K_SHARPEN).into_raw();
    let (response, _) = mean_std(sharpen.iter().map(|&v| v.abs() as f64));

    let score = lap_variance * 0.3 + gradient * 0.3 + response * 0.4;
    round2(score.min(100.0))
}

/// 形状の整い具合: 最大外輪郭の円形度と凸性（輪郭が無ければ既定値）
pub fn shape_integrity(views: &ColorViews<'_>, params: &DetectorParams) -> f64 {
    let binary = adaptive_edge_map(&views.gray, params);
    let contours = find_contours::<i32>(&binary);

    let largest = contours
        .iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| (polygon_area(&c.points), c))
        .max_by(|a, b| a.0.total_cmp(&b.0));

    let Some((area, contour)) = largest else {
        return params.shape_fallback;
    };

    let perimeter = arc_length(&contour.points, true);
    if perimeter <= 0.0 || area <= 0.0 {
        return params.shape_fallback;
    }

    let circularity = 4.0 * std::f64::consts::PI * area / (perimeter * perimeter);
    let hull = convex_hull(contour.points.as_slice());
    let hull_area = polygon_area(&hull);
    let convexity = if hull_area > 0.0 { area / hull_area } else { 0.0 };

    let score = (circularity * 0.6 + convexity * 0.4) * 100.0;
    round2(score.min(100.0))
}

/// 平滑化 → ガウシアン適応閾値（反転）
///
/// 局所加重平均から offset を引いた値以下の画素を前景とする
fn adaptive_edge_map(gray: &GrayImage, params: &DetectorParams) -> GrayImage {
    let smoothed = gaussian_blur_f32(gray, params.shape_blur_sigma.max(0.1));
    let local: GrayF32 = gaussian_blur_f32(&to_f32(&smoothed), params.shape_block_sigma.max(0.1));

    let mut binary = GrayImage::new(gray.width(), gray.height());
    for (x, y, px) in smoothed.enumerate_pixels() {
        let threshold = local.get_pixel(x, y)[0] - params.shape_threshold_offset;
        if (px[0] as f32) <= threshold {
            binary.put_pixel(x, y, Luma([255]));
        }
    }
    binary
}

/// 多角形の面積（靴紐公式）
fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(p, q)| p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64)
        .sum();
    (twice as f64 / 2.0).abs()
}
