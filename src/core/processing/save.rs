use std::io::Write;
use std::path::Path;

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use tracing::info;

use crate::error::{Error, Result};

/// Encode as PNG with maximum compression; output is deterministic for a given image.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let encoder =
        PngEncoder::new_with_quality(&mut buf, CompressionType::Best, FilterType::Adaptive);
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(buf)
}

/// Write `bytes` next to `output` and rename into place so readers never see a partial file.
pub fn write_atomically(output: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(output).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

pub fn save_png(image: &RgbaImage, output: &Path) -> Result<()> {
    let bytes = encode_png(image)?;
    write_atomically(output, &bytes)?;
    info!("save_png: {} bytes written to {:?}", bytes.len(), output);
    Ok(())
}
