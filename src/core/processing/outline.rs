use image::{GrayImage, Luma, RgbaImage};
use tracing::debug;

use crate::core::params::OutlineParams;

/// Square max filter of side `2 * radius + 1`, applied as two separable passes.
pub fn dilate(mask: &GrayImage, radius: u32) -> GrayImage {
    if radius == 0 {
        return mask.clone();
    }
    let (width, height) = mask.dimensions();
    let r = radius as i64;

    let mut horizontal = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let lo = (x as i64 - r).max(0) as u32;
            let hi = (x as i64 + r).min(width as i64 - 1) as u32;
            let m = (lo..=hi).map(|xx| mask.get_pixel(xx, y)[0]).max().unwrap_or(0);
            horizontal.put_pixel(x, y, Luma([m]));
        }
    }

    let mut out = GrayImage::new(width, height);
    for y in 0..height {
        let lo = (y as i64 - r).max(0) as u32;
        let hi = (y as i64 + r).min(height as i64 - 1) as u32;
        for x in 0..width {
            let m = (lo..=hi)
                .map(|yy| horizontal.get_pixel(x, yy)[0])
                .max()
                .unwrap_or(0);
            out.put_pixel(x, y, Luma([m]));
        }
    }
    out
}

#[inline]
fn blend(over: u8, under: u8, weight: u8) -> u8 {
    let w = u32::from(weight);
    ((u32::from(over) * w + u32::from(under) * (255 - w) + 127) / 255) as u8
}

/// Draw a border around the non-transparent silhouette.
///
/// The alpha channel is grown by `width` pixels; wherever the grown mask exceeds
/// the original alpha the outline colour is blended in, weighted by the difference.
pub fn add_outline(image: &RgbaImage, params: &OutlineParams) -> RgbaImage {
    if params.width == 0 {
        return image.clone();
    }

    let (width, height) = image.dimensions();
    let alpha = GrayImage::from_fn(width, height, |x, y| Luma([image.get_pixel(x, y)[3]]));
    let expanded = dilate(&alpha, params.width);

    let mut out = image.clone();
    let mut touched = 0usize;
    for (x, y, px) in out.enumerate_pixels_mut() {
        let weight = expanded.get_pixel(x, y)[0].saturating_sub(alpha.get_pixel(x, y)[0]);
        if weight == 0 {
            continue;
        }
        touched += 1;
        for c in 0..4 {
            px[c] = blend(params.color[c], px[c], weight);
        }
    }
    debug!("Outline width {} touched {} pixels", params.width, touched);
    out
}
