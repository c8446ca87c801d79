use image::RgbaImage;
use image::imageops;
use tracing::debug;

/// Axis-aligned box in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentBounds {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Bounding box of every pixel whose alpha is above `threshold`.
/// Returns None when nothing is visible.
pub fn find_content_bounds(image: &RgbaImage, threshold: u8) -> Option<ContentBounds> {
    let (width, height) = image.dimensions();
    let mut min_x = width;
    let mut min_y = height;
    let mut max_x = 0u32;
    let mut max_y = 0u32;
    let mut found = false;

    for (x, y, px) in image.enumerate_pixels() {
        if px[3] > threshold {
            found = true;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }

    found.then(|| ContentBounds {
        x: min_x,
        y: min_y,
        width: max_x - min_x + 1,
        height: max_y - min_y + 1,
    })
}

/// Crop to the visible content. Fully transparent images are returned as they are.
pub fn crop_to_content(image: RgbaImage) -> RgbaImage {
    match find_content_bounds(&image, 0) {
        Some(b) if b.width == image.width() && b.height == image.height() => image,
        Some(b) => {
            debug!(
                "Cropping to content: {}x{} at ({}, {}) from {}x{}",
                b.width,
                b.height,
                b.x,
                b.y,
                image.width(),
                image.height()
            );
            imageops::crop_imm(&image, b.x, b.y, b.width, b.height).to_image()
        }
        None => {
            debug!("No visible content, skipping crop");
            image
        }
    }
}
