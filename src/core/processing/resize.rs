use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer, images::Image};
use image::RgbaImage;
use image::imageops;
use tracing::{info, warn};

use crate::error::{Error, Result};

/// Largest dimensions that fit inside a `target_size` square while keeping
/// the aspect ratio. Images smaller than the square are scaled up.
pub fn calculate_fit_dimensions(
    original_cols: u32,
    original_rows: u32,
    target_size: u32,
) -> (u32, u32) {
    let cols = u64::from(original_cols.max(1));
    let rows = u64::from(original_rows.max(1));
    let size = u64::from(target_size);

    let (new_cols, new_rows) = if cols >= rows {
        (size, rows * size / cols)
    } else {
        (cols * size / rows, size)
    };

    // Bounded by target_size, so the narrowing is lossless
    (new_cols.max(1) as u32, new_rows.max(1) as u32)
}

/// Lanczos3 resize of an RGBA buffer; alpha is premultiplied during filtering.
pub fn resize_rgba_image(
    image: &RgbaImage,
    target_cols: u32,
    target_rows: u32,
) -> Result<RgbaImage> {
    let resize_options =
        ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3));
    let mut resizer = Resizer::new();

    let src_image = Image::from_vec_u8(
        image.width(),
        image.height(),
        image.as_raw().clone(),
        PixelType::U8x4,
    )
    .map_err(Error::external)?;
    let mut dst_image = Image::new(target_cols, target_rows, PixelType::U8x4);
    resizer
        .resize(&src_image, &mut dst_image, &resize_options)
        .map_err(Error::external)?;

    RgbaImage::from_raw(target_cols, target_rows, dst_image.into_vec()).ok_or_else(|| {
        Error::Processing(format!(
            "resized buffer does not match {}x{}",
            target_cols, target_rows
        ))
    })
}

/// Scale `image` to fit the square canvas. A failing fast path degrades to
/// the `image` crate's own Lanczos3 filter.
pub fn fit_to_square(image: &RgbaImage, target_size: u32) -> RgbaImage {
    let (cols, rows) = image.dimensions();
    let (new_cols, new_rows) = calculate_fit_dimensions(cols, rows, target_size);

    if (new_cols, new_rows) == (cols, rows) {
        return image.clone();
    }

    info!(
        "Original size: {}x{}, New size: {}x{}",
        cols, rows, new_cols, new_rows
    );

    match resize_rgba_image(image, new_cols, new_rows) {
        Ok(resized) => resized,
        Err(e) => {
            warn!("Fast resize failed ({}), using fallback filter", e);
            imageops::resize(image, new_cols, new_rows, imageops::FilterType::Lanczos3)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn landscape_fits_by_width() {
        assert_eq!(calculate_fit_dimensions(1000, 500, 512), (512, 256));
        assert_eq!(calculate_fit_dimensions(1000, 333, 512), (512, 170));
    }

    #[test]
    fn portrait_fits_by_height() {
        assert_eq!(calculate_fit_dimensions(300, 600, 512), (256, 512));
    }

    #[test]
    fn small_images_are_scaled_up() {
        assert_eq!(calculate_fit_dimensions(64, 32, 512), (512, 256));
    }

    #[test]
    fn extreme_aspect_keeps_one_pixel() {
        assert_eq!(calculate_fit_dimensions(10_000, 1, 512), (512, 1));
    }

    #[test]
    fn resize_produces_requested_dimensions() {
        let img = RgbaImage::from_pixel(40, 20, Rgba([10, 20, 30, 255]));
        let out = fit_to_square(&img, 16);
        assert_eq!(out.dimensions(), (16, 8));
        // Uniform input stays (nearly) uniform under Lanczos
        let px = out.get_pixel(8, 4);
        for (got, want) in px.0.iter().zip([10u8, 20, 30, 255]) {
            assert!(got.abs_diff(want) <= 1, "{:?}", px);
        }
    }
}
