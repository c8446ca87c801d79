use image::RgbaImage;
use tracing::debug;

use crate::error::{Error, Result};

/// Paste `image` centered onto a transparent `size`x`size` canvas.
pub fn center_on_canvas(image: &RgbaImage, size: u32) -> Result<RgbaImage> {
    let (cols, rows) = image.dimensions();
    if cols > size || rows > size {
        return Err(Error::Processing(format!(
            "image {}x{} does not fit on a {}x{} canvas",
            cols, rows, size, size
        )));
    }

    let pad_cols = ((size - cols) / 2) as usize;
    let pad_rows = ((size - rows) / 2) as usize;

    debug!(
        "Adding padding: cols={}, rows={}, pad_cols={}, pad_rows={}",
        cols, rows, pad_cols, pad_rows
    );

    let (cols, rows, size) = (cols as usize, rows as usize, size as usize);
    let src = image.as_raw();
    let mut padded = vec![0u8; size * size * 4];
    // Copy per row using slice copies to minimize per-pixel indexing
    for row in 0..rows {
        let src_offset = row * cols * 4;
        let dst_offset = ((row + pad_rows) * size + pad_cols) * 4;
        padded[dst_offset..dst_offset + cols * 4]
            .copy_from_slice(&src[src_offset..src_offset + cols * 4]);
    }

    RgbaImage::from_raw(size as u32, size as u32, padded)
        .ok_or_else(|| Error::Processing("padded buffer has wrong length".to_string()))
}
