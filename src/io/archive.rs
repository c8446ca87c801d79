use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use crate::error::{Error, Result};

/// Write `files` into a deflated ZIP at `output`, each stored under its file name.
pub fn write_zip(output: &Path, files: &[PathBuf]) -> Result<()> {
    let file = File::create(output)?;
    let mut zip = zip::ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::Processing(format!("no file name in {:?}", path)))?;
        zip.start_file(name, options)?;
        zip.write_all(&std::fs::read(path)?)?;
    }

    let mut writer = zip.finish()?;
    writer.flush()?;
    info!("Archive written: {:?} ({} entries)", output, files.len());
    Ok(())
}
