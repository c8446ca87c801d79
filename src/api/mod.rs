//! High-level, ergonomic library API: process one file, an in-memory buffer,
//! or a whole directory. Prefer these entrypoints over the low-level
//! processing modules when integrating STICKERPRO.
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::core::params::ProcessingParams;
use crate::core::processing::pipeline::Pipeline;
use crate::core::processing::remove::build_remover;
use crate::core::processing::save::encode_png;
use crate::error::{Error, Result};
use crate::io::organize::output_file_name;
use crate::types::{RemoverKind, is_supported_image};

/// Build a pipeline from a remover choice and parameters.
pub fn build_pipeline(
    remover: RemoverKind,
    model_path: Option<&Path>,
    params: ProcessingParams,
) -> Result<Pipeline> {
    Pipeline::new(build_remover(remover, model_path)?, params)
}

/// Process encoded image bytes to encoded PNG bytes (no disk I/O)
pub fn process_bytes_to_png(pipeline: &Pipeline, bytes: &[u8]) -> Result<Vec<u8>> {
    encode_png(&pipeline.process_bytes(bytes)?)
}

/// Process one image file into a PNG at `output`
pub fn process_file_to_path(pipeline: &Pipeline, input: &Path, output: &Path) -> Result<()> {
    if !is_supported_image(input) {
        return Err(Error::UnsupportedFormat(input.display().to_string()));
    }
    pipeline.process_file(input, output)
}

/// Batch processing report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: usize,
    pub skipped: usize,
    pub errors: usize,
}

/// Sorted list of supported images directly inside `input_dir`
pub fn iterate_images(input_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(input_dir)? {
        let path = entry?.path();
        if path.is_file() && is_supported_image(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Process every supported image in `input_dir` into `output_dir` as `<stem>_processed.png`.
/// If `continue_on_error` is true, errors are counted in the report and processing continues;
/// otherwise, the first error is returned.
pub fn process_directory_to_path(
    pipeline: &Pipeline,
    input_dir: &Path,
    output_dir: &Path,
    continue_on_error: bool,
) -> Result<BatchReport> {
    std::fs::create_dir_all(output_dir)?;

    let mut report = BatchReport::default();
    for entry in std::fs::read_dir(input_dir)? {
        let path = entry?.path();
        if !path.is_file() || !is_supported_image(&path) {
            info!("Skipping: {:?}", path);
            report.skipped += 1;
        }
    }

    for path in iterate_images(input_dir)? {
        let output_path = output_dir.join(output_file_name(&path));
        info!("Processing: {:?} -> {:?}", path, output_path);
        match pipeline.process_file(&path, &output_path) {
            Ok(()) => report.processed += 1,
            Err(e) => {
                warn!("Error processing {:?}: {}", path, e);
                report.errors += 1;
                if !continue_on_error {
                    return Err(e);
                }
            }
        }
    }

    Ok(report)
}
