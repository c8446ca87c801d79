//! The sticker pipeline: background removal, crop to content, fit onto the
//! square canvas, optional outline. Every stage after decoding degrades
//! instead of failing, so a decodable input always yields a canvas-sized image.
use std::path::Path;
use std::time::Instant;

use image::{DynamicImage, ImageReader, RgbaImage};
use tracing::{info, instrument, warn};

use crate::core::params::ProcessingParams;
use crate::core::processing::bounds::crop_to_content;
use crate::core::processing::outline::add_outline;
use crate::core::processing::padding::center_on_canvas;
use crate::core::processing::remove::BackgroundRemover;
use crate::core::processing::resize::fit_to_square;
use crate::core::processing::save::save_png;
use crate::error::Result;

pub struct Pipeline {
    remover: Box<dyn BackgroundRemover>,
    params: ProcessingParams,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("remover", &self.remover.name())
            .field("params", &self.params)
            .finish()
    }
}

impl Pipeline {
    pub fn new(remover: Box<dyn BackgroundRemover>, params: ProcessingParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { remover, params })
    }

    pub fn params(&self) -> &ProcessingParams {
        &self.params
    }

    pub fn remover_name(&self) -> &str {
        self.remover.name()
    }

    /// Run the remover; any failure falls back to the source image unmodified.
    pub fn cutout(&self, image: &DynamicImage) -> RgbaImage {
        match self.remover.remove(image) {
            Ok(cut) if cut.dimensions() == (image.width(), image.height()) => {
                info!("Background removal completed with {}", self.remover.name());
                cut
            }
            Ok(cut) => {
                warn!(
                    "Background removal returned {}x{} for a {}x{} input, using fallback",
                    cut.width(),
                    cut.height(),
                    image.width(),
                    image.height()
                );
                image.to_rgba8()
            }
            Err(e) => {
                warn!(error = %e, "Background removal failed, using fallback");
                image.to_rgba8()
            }
        }
    }

    /// Fit an already cut-out image onto the canvas and draw the outline.
    pub fn compose(&self, cutout: RgbaImage) -> RgbaImage {
        let size = self.params.canvas_size;
        let content = if self.params.crop_to_content {
            crop_to_content(cutout)
        } else {
            cutout
        };

        let fitted = fit_to_square(&content, size);
        let square = match center_on_canvas(&fitted, size) {
            Ok(square) => square,
            Err(e) => {
                warn!(error = %e, "Padding failed, stretching onto canvas");
                image::imageops::resize(&fitted, size, size, image::imageops::FilterType::Lanczos3)
            }
        };

        match &self.params.outline {
            Some(outline) => add_outline(&square, outline),
            None => square,
        }
    }

    pub fn process(&self, image: &DynamicImage) -> RgbaImage {
        self.compose(self.cutout(image))
    }

    pub fn process_bytes(&self, bytes: &[u8]) -> Result<RgbaImage> {
        let image = image::load_from_memory(bytes)?;
        Ok(self.process(&image))
    }

    /// Decode `input`, run the pipeline and write a PNG to `output`.
    #[instrument(level = "info", skip(self), fields(remover = self.remover.name()))]
    pub fn process_file(&self, input: &Path, output: &Path) -> Result<()> {
        let start = Instant::now();
        info!("Starting image processing");

        let image = ImageReader::open(input)?.with_guessed_format()?.decode()?;
        let result = self.process(&image);
        save_png(&result, output)?;

        info!(
            duration_ms = start.elapsed().as_millis() as u64,
            "Image processing completed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::processing::remove::{CornerKeyRemover, PassthroughRemover};
    use crate::error::Error;
    use image::Rgba;

    struct FailingRemover;

    impl BackgroundRemover for FailingRemover {
        fn name(&self) -> &str {
            "failing"
        }

        fn remove(&self, _image: &DynamicImage) -> Result<RgbaImage> {
            Err(Error::Model("simulated".to_string()))
        }
    }

    struct WrongSizeRemover;

    impl BackgroundRemover for WrongSizeRemover {
        fn name(&self) -> &str {
            "wrong-size"
        }

        fn remove(&self, _image: &DynamicImage) -> Result<RgbaImage> {
            Ok(RgbaImage::new(1, 1))
        }
    }

    fn photo() -> DynamicImage {
        let mut img = RgbaImage::from_pixel(60, 30, Rgba([255, 255, 255, 255]));
        for y in 10..20 {
            for x in 20..40 {
                img.put_pixel(x, y, Rgba([0, 90, 200, 255]));
            }
        }
        DynamicImage::ImageRgba8(img)
    }

    fn params(size: u32) -> ProcessingParams {
        ProcessingParams {
            canvas_size: size,
            ..ProcessingParams::default()
        }
    }

    #[test]
    fn output_is_always_the_canvas_size() {
        for remover in [
            Box::new(CornerKeyRemover::default()) as Box<dyn BackgroundRemover>,
            Box::new(PassthroughRemover),
            Box::new(FailingRemover),
            Box::new(WrongSizeRemover),
        ] {
            let pipeline = Pipeline::new(remover, params(64)).unwrap();
            assert_eq!(pipeline.process(&photo()).dimensions(), (64, 64));
        }
    }

    #[test]
    fn failing_remover_falls_back_to_source() {
        let pipeline = Pipeline::new(Box::new(FailingRemover), params(64)).unwrap();
        let cut = pipeline.cutout(&photo());
        assert_eq!(cut, photo().to_rgba8());
    }

    #[test]
    fn matching_cutout_is_kept_and_mismatched_one_is_replaced() {
        let keyed = Pipeline::new(Box::new(CornerKeyRemover::default()), params(64)).unwrap();
        assert_eq!(keyed.remover_name(), "corner-key");
        let cut = keyed.cutout(&photo());
        assert_eq!(cut.dimensions(), (60, 30));
        assert_eq!(cut.get_pixel(0, 0)[3], 0);

        let wrong = Pipeline::new(Box::new(WrongSizeRemover), params(64)).unwrap();
        assert_eq!(wrong.cutout(&photo()), photo().to_rgba8());
        assert_eq!(wrong.params().canvas_size, 64);
    }

    #[test]
    fn cutout_is_cropped_and_centered() {
        let p = ProcessingParams {
            outline: None,
            ..params(40)
        };
        let pipeline = Pipeline::new(Box::new(CornerKeyRemover::default()), p).unwrap();
        let out = pipeline.process(&photo());

        // 20x10 subject scales to 40x20, centered vertically
        assert_eq!(out.get_pixel(20, 0)[3], 0);
        assert_eq!(out.get_pixel(20, 9)[3], 0);
        assert!(out.get_pixel(20, 20)[3] > 200);
        assert_eq!(out.get_pixel(20, 30)[3], 0);
    }

    #[test]
    fn zero_canvas_is_rejected() {
        assert!(Pipeline::new(Box::new(PassthroughRemover), params(0)).is_err());
    }

    #[test]
    fn garbage_bytes_are_an_image_error() {
        let pipeline = Pipeline::new(Box::new(PassthroughRemover), params(16)).unwrap();
        assert!(matches!(
            pipeline.process_bytes(b"definitely not an image"),
            Err(Error::Image(_))
        ));
    }
}
