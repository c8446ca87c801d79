use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_CANVAS_SIZE: u32 = 512;
pub const DEFAULT_OUTLINE_WIDTH: u32 = 6;
pub const DEFAULT_OUTLINE_COLOR: [u8; 4] = [235, 225, 215, 255];
/// Largest accepted canvas side; bounds the canvas allocation to 256 MiB
pub const MAX_CANVAS_SIZE: u32 = 8192;

/// Decorative border drawn around the subject's silhouette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineParams {
    /// Border thickness in pixels (6 px is about 0.5 mm at 300 DPI)
    pub width: u32,
    /// RGBA colour blended into the border
    pub color: [u8; 4],
}

impl Default for OutlineParams {
    fn default() -> Self {
        Self {
            width: DEFAULT_OUTLINE_WIDTH,
            color: DEFAULT_OUTLINE_COLOR,
        }
    }
}

/// Processing parameters suitable for config files and presets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingParams {
    /// Side length of the square output canvas
    pub canvas_size: u32,
    /// Crop to the bounding box of visible pixels before fitting
    pub crop_to_content: bool,
    /// None disables the outline
    pub outline: Option<OutlineParams>,
}

impl Default for ProcessingParams {
    fn default() -> Self {
        Self {
            canvas_size: DEFAULT_CANVAS_SIZE,
            crop_to_content: true,
            outline: Some(OutlineParams::default()),
        }
    }
}

impl ProcessingParams {
    pub fn validate(&self) -> Result<()> {
        if self.canvas_size == 0 {
            return Err(Error::ZeroSize {
                size: self.canvas_size,
            });
        }
        if self.canvas_size > MAX_CANVAS_SIZE {
            return Err(Error::InvalidArgument {
                arg: "canvas_size",
                value: format!("{} (max {})", self.canvas_size, MAX_CANVAS_SIZE),
            });
        }
        Ok(())
    }

    /// Width 0 turns the outline off, any other width keeps the configured colour.
    pub fn with_outline_width(mut self, width: u32) -> Self {
        self.outline = match width {
            0 => None,
            w => Some(OutlineParams {
                width: w,
                ..self.outline.unwrap_or_default()
            }),
        };
        self
    }

    pub fn from_json_file(path: &std::path::Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let params: ProcessingParams = serde_json::from_str(&raw).map_err(|e| {
            Error::InvalidArgument {
                arg: "params",
                value: format!("{}: {e}", path.display()),
            }
        })?;
        params.validate()?;
        Ok(params)
    }
}
