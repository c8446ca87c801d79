//! Shared types and enums used across STICKERPRO.
//! Includes `InputFormat` (the supported-extension allow-list), `RemoverKind`
//! and `LogFormat`.
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Image formats accepted by the watcher and the upload form.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum InputFormat {
    Jpg,
    Jpeg,
    Png,
    Bmp,
    Tiff,
    Tif,
    Webp,
}

impl InputFormat {
    pub const ALL: [InputFormat; 7] = [
        InputFormat::Jpg,
        InputFormat::Jpeg,
        InputFormat::Png,
        InputFormat::Bmp,
        InputFormat::Tiff,
        InputFormat::Tif,
        InputFormat::Webp,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            InputFormat::Jpg => "jpg",
            InputFormat::Jpeg => "jpeg",
            InputFormat::Png => "png",
            InputFormat::Bmp => "bmp",
            InputFormat::Tiff => "tiff",
            InputFormat::Tif => "tif",
            InputFormat::Webp => "webp",
        }
    }

    /// Case-insensitive lookup of an extension without the leading dot.
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.extension().eq_ignore_ascii_case(ext))
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Same check on a bare file name as sent by a browser.
    pub fn from_file_name(name: &str) -> Option<Self> {
        name.rsplit_once('.')
            .and_then(|(_, ext)| Self::from_extension(ext))
    }
}

impl std::fmt::Display for InputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

pub fn is_supported_image(path: &Path) -> bool {
    InputFormat::from_path(path).is_some()
}

/// Which background remover backs the pipeline.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize)]
pub enum RemoverKind {
    /// ONNX segmentation model (requires the `onnx` feature and a model path)
    Onnx,
    /// Clear the border-connected region matching the corner colour
    CornerKey,
    /// Keep the source pixels as they are
    Passthrough,
}

impl std::fmt::Display for RemoverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoverKind::Onnx => write!(f, "Onnx"),
            RemoverKind::CornerKey => write!(f, "CornerKey"),
            RemoverKind::Passthrough => write!(f, "Passthrough"),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default, Serialize, Deserialize)]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "human" | "text" | "pretty" => Ok(LogFormat::Human),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_are_matched_case_insensitively() {
        assert_eq!(InputFormat::from_path(Path::new("a/b/Photo.JPG")), Some(InputFormat::Jpg));
        assert_eq!(InputFormat::from_file_name("scan.tif"), Some(InputFormat::Tif));
        assert_eq!(InputFormat::from_file_name("x.WebP"), Some(InputFormat::Webp));
    }

    #[test]
    fn unsupported_names_are_rejected() {
        assert!(!is_supported_image(Path::new("notes.txt")));
        assert!(!is_supported_image(Path::new("no_extension")));
        assert_eq!(InputFormat::from_file_name("archive.png.zip"), None);
        assert_eq!(InputFormat::from_file_name("gif.gif"), None);
    }

    #[test]
    fn log_format_parses_env_values() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("human".parse::<LogFormat>(), Ok(LogFormat::Human));
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
