//! 褐変・黒斑の検出
//!
//! マスクは 0/255 の GrayImage。オーバーレイ描画でも同じマスクを使う。

use super::color_space::ColorViews;
use super::DetectorParams;
use fruit_inspect_common::types::round2;
use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology;
use imageproc::region_labelling::{connected_components, Connectivity};

const ON: Luma<u8> = Luma([255]);

/// 褐変マスク: HSV帯 OR Lab帯 → オープニング → クロージング
pub fn brown_rot_mask(views: &ColorViews<'_>, params: &DetectorParams) -> GrayImage {
    let mut mask = GrayImage::new(views.width(), views.height());

    for (i, (hsv, lab)) in views.hsv.iter().zip(views.lab.iter()).enumerate() {
        let in_hsv = hsv.h >= params.brown_hue_min
            && hsv.h <= params.brown_hue_max
            && hsv.s >= params.brown_saturation_min
            && hsv.v >= params.brown_value_min
            && hsv.v <= params.brown_value_max;

        let in_lab = lab.l < params.brown_lightness_max
            && lab.a > params.brown_a_min
            && lab.a < params.brown_a_max
            && lab.b > params.brown_b_min
            && lab.b < params.brown_b_max;

        if in_hsv || in_lab {
            put(&mut mask, i, views.width());
        }
    }

    let radius = params.brown_morph_radius;
    let opened = morphology::open(&mask, Norm::LInf, radius);
    morphology::close(&opened, Norm::LInf, radius)
}

/// 黒斑マスク: HSV暗部 AND グレー閾値 → オープニング → 小領域除去
pub fn black_spot_mask(views: &ColorViews<'_>, params: &DetectorParams) -> GrayImage {
    let mut mask = GrayImage::new(views.width(), views.height());

    for (i, (hsv, gray)) in views.hsv.iter().zip(views.gray.as_raw().iter()).enumerate() {
        if hsv.v <= params.black_value_max && *gray < params.black_gray_max {
            put(&mut mask, i, views.width());
        }
    }

    let opened = morphology::open(&mask, Norm::LInf, params.black_morph_radius);
    remove_small_components(&opened, params.black_min_area)
}

/// 面積が min_area 以下の連結成分を取り除く
pub fn remove_small_components(mask: &GrayImage, min_area: u32) -> GrayImage {
    let labels = connected_components(mask, Connectivity::Eight, Luma([0u8]));

    let max_label = labels.pixels().map(|p| p[0]).max().unwrap_or(0) as usize;
    let mut areas = vec![0u32; max_label + 1];
    for p in labels.pixels() {
        areas[p[0] as usize] += 1;
    }

    let mut kept = GrayImage::new(mask.width(), mask.height());
    for (x, y, label) in labels.enumerate_pixels() {
        let label = label[0] as usize;
        if label != 0 && areas[label] > min_area {
            kept.put_pixel(x, y, ON);
        }
    }
    kept
}

/// マスクの点灯画素が全画素に占める割合（%、小数2桁）
pub fn mask_percentage(mask: &GrayImage) -> f64 {
    let total = mask.as_raw().len();
    if total == 0 {
        return 0.0;
    }
    let on = mask.as_raw().iter().filter(|&&v| v > 0).count();
    round2(on as f64 / total as f64 * 100.0)
}

pub fn brown_rot_percentage(views: &ColorViews<'_>, params: &DetectorParams) -> f64 {
    mask_percentage(&brown_rot_mask(views, params))
}

pub fn black_spots_percentage(views: &ColorViews<'_>, params: &DetectorParams) -> f64 {
    mask_percentage(&black_spot_mask(views, params))
}

fn put(mask: &mut GrayImage, index: usize, width: u32) {
    let x = (index % width as usize) as u32;
    let y = (index / width as usize) as u32;
    mask.put_pixel(x, y, ON);
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn fill_square(img: &mut RgbImage, x0: u32, y0: u32, size: u32, color: Rgb<u8>) {
        for y in y0..y0 + size {
            for x in x0..x0 + size {
                img.put_pixel(x, y, color);
            }
        }
    }

    #[test]
    fn test_green_fruit_has_no_defects() {
        let img = RgbImage::from_pixel(40, 40, Rgb([90, 200, 70]));
        let views = ColorViews::new(&img).unwrap();
        let params = DetectorParams::default();

        assert_eq!(brown_rot_percentage(&views, &params), 0.0);
        assert_eq!(black_spots_percentage(&views, &params), 0.0);
    }

    #[test]
    fn test_brown_patch_detected() {
        let mut img = RgbImage::from_pixel(40, 40, Rgb([90, 200, 70]));
        fill_square(&mut img, 10, 10, 20, Rgb([130, 70, 20]));
        let views = ColorViews::new(&img).unwrap();

        let pct = brown_rot_percentage(&views, &DetectorParams::default());
        assert_eq!(pct, 25.0);
    }

    #[test]
    fn test_isolated_brown_pixel_removed_by_opening() {
        let mut img = RgbImage::from_pixel(30, 30, Rgb([90, 200, 70]));
        img.put_pixel(15, 15, Rgb([130, 70, 20]));
        let views = ColorViews::new(&img).unwrap();

        assert_eq!(brown_rot_percentage(&views, &DetectorParams::default()), 0.0);
    }

    #[test]
    fn test_black_spot_detected() {
        let mut img = RgbImage::from_pixel(50, 50, Rgb([220, 60, 50]));
        fill_square(&mut img, 5, 5, 10, Rgb([5, 5, 5]));
        let views = ColorViews::new(&img).unwrap();

        assert_eq!(black_spots_percentage(&views, &DetectorParams::default()), 4.0);
    }

    #[test]
    fn test_small_black_speck_filtered() {
        let mut img = RgbImage::from_pixel(50, 50, Rgb([220, 60, 50]));
        // 4x4 = 16px はオープニングを通過するが面積しきい値で除去される
        fill_square(&mut img, 20, 20, 4, Rgb([5, 5, 5]));
        let views = ColorViews::new(&img).unwrap();

        assert_eq!(black_spots_percentage(&views, &DetectorParams::default()), 0.0);
    }

    #[test]
    fn test_remove_small_components_keeps_large() {
        let mut mask = GrayImage::new(20, 20);
        for y in 0..5 {
            for x in 0..5 {
                mask.put_pixel(x, y, ON);
            }
        }
        mask.put_pixel(15, 15, ON);

        let kept = remove_small_components(&mask, 20);
        assert_eq!(kept.get_pixel(2, 2)[0], 255);
        assert_eq!(kept.get_pixel(15, 15)[0], 0);
        assert_eq!(mask_percentage(&kept), 6.25);
    }
}
