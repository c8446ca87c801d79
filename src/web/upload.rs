//! Synchronous side of an upload: batch validation and sequential processing.
use std::fs;
use std::path::PathBuf;

use tracing::{error, info};

use super::session::{Session, sanitize_file_name, unique_name};
use crate::config::AppConfig;
use crate::core::processing::pipeline::Pipeline;
use crate::error::{Error, Result};
use crate::io::archive::write_zip;
use crate::io::organize::output_file_name;
use crate::types::InputFormat;

#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Name as sent by the browser
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub outputs: Vec<PathBuf>,
    /// (original name, reason)
    pub failures: Vec<(String, String)>,
    /// Archive file name inside the session output directory
    pub archive: Option<String>,
}

/// Reject the whole batch before anything is written.
pub fn validate_batch(files: &[UploadedFile], config: &AppConfig) -> Result<()> {
    if files.is_empty() {
        return Err(Error::MissingArgument {
            arg: "files".to_string(),
        });
    }
    if files.len() > config.max_files {
        return Err(Error::TooManyFiles {
            count: files.len(),
            max: config.max_files,
        });
    }
    for file in files {
        let supported = sanitize_file_name(&file.name)
            .and_then(|n| InputFormat::from_file_name(&n))
            .is_some();
        if !supported {
            return Err(Error::UnsupportedFormat(file.name.clone()));
        }
        let size = file.bytes.len() as u64;
        if size > config.max_file_bytes {
            return Err(Error::FileTooLarge {
                name: file.name.clone(),
                size,
                limit: config.max_file_bytes,
            });
        }
    }
    Ok(())
}

/// Save, process and archive each file in order. One file failing does not
/// stop the others; the batch fails only when nothing could be processed.
pub fn process_batch(
    pipeline: &Pipeline,
    session: &Session,
    files: Vec<UploadedFile>,
) -> Result<BatchOutcome> {
    let mut outcome = BatchOutcome::default();
    let mut taken: Vec<String> = Vec::with_capacity(files.len());

    for file in files {
        let Some(clean) = sanitize_file_name(&file.name) else {
            outcome
                .failures
                .push((file.name, "invalid file name".to_string()));
            continue;
        };
        let name = unique_name(&clean, &taken);
        taken.push(name.clone());

        let upload_path = session.upload_dir.join(&name);
        let output_path = session.output_dir.join(output_file_name(&upload_path));

        let result = fs::write(&upload_path, &file.bytes)
            .map_err(Error::from)
            .and_then(|()| pipeline.process_file(&upload_path, &output_path));
        match result {
            Ok(()) => {
                info!("Processed: {}", name);
                outcome.outputs.push(output_path);
            }
            Err(e) => {
                error!(error = %e, "Error processing {}", file.name);
                outcome.failures.push((file.name, e.to_string()));
            }
        }
    }

    if outcome.outputs.is_empty() {
        return Ok(outcome);
    }

    write_zip(&session.archive_path(), &outcome.outputs)?;
    outcome.archive = Some(session.archive_name());
    Ok(outcome)
}
