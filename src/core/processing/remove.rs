//! Background removers. The pipeline only sees the [`BackgroundRemover`] trait;
//! the model-backed implementation lives in `onnx` behind the `onnx` feature.
use std::collections::VecDeque;
use std::path::Path;

use image::{DynamicImage, Rgba, RgbaImage};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::RemoverKind;

/// Produces a cutout of the foreground subject with the rest made transparent.
pub trait BackgroundRemover: Send + Sync {
    fn name(&self) -> &str;

    /// The returned image must have the same dimensions as the input.
    fn remove(&self, image: &DynamicImage) -> Result<RgbaImage>;
}

/// Returns the source as RGBA without touching any pixel.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughRemover;

impl BackgroundRemover for PassthroughRemover {
    fn name(&self) -> &str {
        "passthrough"
    }

    fn remove(&self, image: &DynamicImage) -> Result<RgbaImage> {
        Ok(image.to_rgba8())
    }
}

/// Model-free remover for studio shots on a plain backdrop.
///
/// The backdrop colour is the mean of the four corner pixels. Every pixel
/// connected to the image border whose colour lies within `tolerance`
/// (Euclidean RGB distance) of the backdrop is cleared.
#[derive(Debug, Clone, Copy)]
pub struct CornerKeyRemover {
    pub tolerance: f32,
}

impl Default for CornerKeyRemover {
    fn default() -> Self {
        Self { tolerance: 40.0 }
    }
}

impl CornerKeyRemover {
    fn backdrop(image: &RgbaImage) -> [f32; 3] {
        let (w, h) = image.dimensions();
        let corners = [(0, 0), (w - 1, 0), (0, h - 1), (w - 1, h - 1)];
        let mut sum = [0f32; 3];
        for (x, y) in corners {
            let px = image.get_pixel(x, y);
            for c in 0..3 {
                sum[c] += f32::from(px[c]);
            }
        }
        sum.map(|s| s / 4.0)
    }

    fn matches(&self, px: &Rgba<u8>, backdrop: &[f32; 3]) -> bool {
        if px[3] == 0 {
            return true;
        }
        let dist2: f32 = (0..3)
            .map(|c| {
                let d = f32::from(px[c]) - backdrop[c];
                d * d
            })
            .sum();
        dist2 <= self.tolerance * self.tolerance
    }
}

impl BackgroundRemover for CornerKeyRemover {
    fn name(&self) -> &str {
        "corner-key"
    }

    fn remove(&self, image: &DynamicImage) -> Result<RgbaImage> {
        let mut out = image.to_rgba8();
        let (w, h) = out.dimensions();
        if w == 0 || h == 0 {
            return Err(Error::Processing("empty image".to_string()));
        }

        let backdrop = Self::backdrop(&out);
        let mut visited = vec![false; (w as usize) * (h as usize)];
        let mut queue = VecDeque::new();
        let idx = |x: u32, y: u32| (y as usize) * (w as usize) + x as usize;

        let border = (0..w)
            .flat_map(|x| [(x, 0), (x, h - 1)])
            .chain((0..h).flat_map(|y| [(0, y), (w - 1, y)]));
        for (x, y) in border {
            if !visited[idx(x, y)] && self.matches(out.get_pixel(x, y), &backdrop) {
                visited[idx(x, y)] = true;
                queue.push_back((x, y));
            }
        }

        let mut cleared = 0usize;
        while let Some((x, y)) = queue.pop_front() {
            out.get_pixel_mut(x, y)[3] = 0;
            cleared += 1;
            let neighbours = [
                (x.wrapping_sub(1), y),
                (x + 1, y),
                (x, y.wrapping_sub(1)),
                (x, y + 1),
            ];
            for (nx, ny) in neighbours {
                if nx >= w || ny >= h || visited[idx(nx, ny)] {
                    continue;
                }
                if self.matches(out.get_pixel(nx, ny), &backdrop) {
                    visited[idx(nx, ny)] = true;
                    queue.push_back((nx, ny));
                }
            }
        }

        debug!(
            "Corner key cleared {} of {} pixels (backdrop {:?})",
            cleared,
            visited.len(),
            backdrop
        );
        Ok(out)
    }
}

/// Build the remover selected on the command line or in the environment.
pub fn build_remover(
    kind: RemoverKind,
    model_path: Option<&Path>,
) -> Result<Box<dyn BackgroundRemover>> {
    info!("Using background remover: {}", kind);
    match kind {
        RemoverKind::CornerKey => Ok(Box::new(CornerKeyRemover::default())),
        RemoverKind::Passthrough => Ok(Box::new(PassthroughRemover)),
        RemoverKind::Onnx => {
            let path = model_path.ok_or(Error::MissingArgument {
                arg: "--model".to_string(),
            })?;
            open_onnx(path)
        }
    }
}

#[cfg(feature = "onnx")]
fn open_onnx(path: &Path) -> Result<Box<dyn BackgroundRemover>> {
    Ok(Box::new(super::onnx::OnnxRemover::from_file(path)?))
}

#[cfg(not(feature = "onnx"))]
fn open_onnx(path: &Path) -> Result<Box<dyn BackgroundRemover>> {
    Err(Error::InvalidArgument {
        arg: "remover",
        value: format!(
            "onnx (model {}): rebuild with --features onnx",
            path.display()
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject_on_backdrop() -> DynamicImage {
        let mut img = RgbaImage::from_pixel(12, 12, Rgba([250, 250, 250, 255]));
        for y in 4..8 {
            for x in 3..9 {
                img.put_pixel(x, y, Rgba([200, 30, 30, 255]));
            }
        }
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn corner_key_clears_backdrop_and_keeps_subject() {
        let out = CornerKeyRemover::default()
            .remove(&subject_on_backdrop())
            .unwrap();
        assert_eq!(out.dimensions(), (12, 12));
        assert_eq!(out.get_pixel(0, 0)[3], 0);
        assert_eq!(out.get_pixel(11, 6)[3], 0);
        assert_eq!(out.get_pixel(5, 5), &Rgba([200, 30, 30, 255]));
    }

    #[test]
    fn enclosed_backdrop_colour_is_kept() {
        let mut img = RgbaImage::from_pixel(9, 9, Rgba([255, 255, 255, 255]));
        for y in 2..7 {
            for x in 2..7 {
                if x == 2 || x == 6 || y == 2 || y == 6 {
                    img.put_pixel(x, y, Rgba([0, 0, 0, 255]));
                }
            }
        }
        let out = CornerKeyRemover::default()
            .remove(&DynamicImage::ImageRgba8(img))
            .unwrap();
        // White hole inside the black ring is not connected to the border
        assert_eq!(out.get_pixel(4, 4)[3], 255);
        assert_eq!(out.get_pixel(0, 4)[3], 0);
    }

    #[test]
    fn passthrough_keeps_pixels() {
        let img = subject_on_backdrop();
        assert_eq!(PassthroughRemover.remove(&img).unwrap(), img.to_rgba8());
    }

    #[test]
    fn onnx_requires_a_model_path() {
        assert!(matches!(
            build_remover(RemoverKind::Onnx, None),
            Err(Error::MissingArgument { .. })
        ));
    }
}
