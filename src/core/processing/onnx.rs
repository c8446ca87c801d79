//! U2-Net family segmentation models (the `rembg` model zoo) run through ONNX Runtime.
use std::path::Path;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Luma, RgbaImage};
use ndarray::Array4;
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use tracing::{debug, info};

use super::remove::BackgroundRemover;
use crate::error::{Error, Result};

const MODEL_INPUT_SIZE: u32 = 320;
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];

pub struct OnnxRemover {
    session: Session,
    input_name: String,
    output_name: String,
}

impl OnnxRemover {
    pub fn from_file(model_path: &Path) -> Result<Self> {
        info!("Loading segmentation model from {:?}", model_path);
        let session = Session::builder()
            .map_err(Error::model)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(Error::model)?
            .commit_from_file(model_path)
            .map_err(Error::model)?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .ok_or_else(|| Error::Model("model declares no inputs".to_string()))?;
        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| Error::Model("model declares no outputs".to_string()))?;

        Ok(Self {
            session,
            input_name,
            output_name,
        })
    }

    fn to_tensor(image: &DynamicImage) -> Array4<f32> {
        let side = MODEL_INPUT_SIZE as usize;
        let rgb = imageops::resize(
            &image.to_rgb8(),
            MODEL_INPUT_SIZE,
            MODEL_INPUT_SIZE,
            FilterType::Lanczos3,
        );
        let max = rgb.as_raw().iter().copied().max().unwrap_or(0);
        let scale = f32::from(max).max(1e-6);

        let mut tensor = Array4::<f32>::zeros((1, 3, side, side));
        for (x, y, px) in rgb.enumerate_pixels() {
            for c in 0..3 {
                let v = f32::from(px[c]) / scale;
                tensor[[0, c, y as usize, x as usize]] = (v - MEAN[c]) / STD[c];
            }
        }
        tensor
    }
}

impl BackgroundRemover for OnnxRemover {
    fn name(&self) -> &str {
        "onnx"
    }

    fn remove(&self, image: &DynamicImage) -> Result<RgbaImage> {
        let tensor = Self::to_tensor(image);
        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => tensor.view()].map_err(Error::model)?)
            .map_err(Error::model)?;
        let pred = outputs[self.output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(Error::model)?;

        let shape = pred.shape().to_vec();
        if shape.len() != 4 || shape[2] == 0 || shape[3] == 0 {
            return Err(Error::Model(format!("unexpected mask shape {:?}", shape)));
        }
        let (rows, cols) = (shape[2], shape[3]);

        let (mut lo, mut hi) = (f32::MAX, f32::MIN);
        for &v in pred.iter() {
            lo = lo.min(v);
            hi = hi.max(v);
        }
        let range = (hi - lo).max(1e-6);
        debug!("Mask range: {} .. {}", lo, hi);

        let mask = GrayImage::from_fn(cols as u32, rows as u32, |x, y| {
            let v = (pred[[0, 0, y as usize, x as usize]] - lo) / range;
            Luma([(v * 255.0).round().clamp(0.0, 255.0) as u8])
        });
        let mask = imageops::resize(&mask, image.width(), image.height(), FilterType::Lanczos3);

        let mut out = image.to_rgba8();
        for (px, m) in out.pixels_mut().zip(mask.pixels()) {
            px[3] = m[0];
        }
        Ok(out)
    }
}
