//! Folder layout for the watcher: `new/` is watched, results land in
//! `processed/`, originals are moved to `old/`.
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, info};

use crate::error::Result;

pub const OUTPUT_SUFFIX: &str = "_processed";

/// `<stem>_processed.png`; outputs are always PNG so transparency survives.
pub fn output_file_name(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    format!("{stem}{OUTPUT_SUFFIX}.png")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderLayout {
    pub new: PathBuf,
    pub processed: PathBuf,
    pub old: PathBuf,
}

impl FolderLayout {
    pub fn under(base: &Path) -> Self {
        Self {
            new: base.join("new"),
            processed: base.join("processed"),
            old: base.join("old"),
        }
    }

    pub fn ensure(&self) -> Result<()> {
        for dir in [&self.new, &self.processed, &self.old] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    pub fn output_path_for(&self, input: &Path) -> PathBuf {
        self.processed.join(output_file_name(input))
    }

    /// Move `input` into `old/`, adding a timestamp when the name is taken.
    pub fn archive_original(&self, input: &Path) -> Result<PathBuf> {
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let mut target = self.old.join(&name);
        if target.exists() {
            let stamp = Local::now().format("%Y%m%d%H%M%S%3f");
            let renamed = match name.rsplit_once('.') {
                Some((stem, ext)) => format!("{stem}_{stamp}.{ext}"),
                None => format!("{name}_{stamp}"),
            };
            debug!("{:?} already archived, using {}", target, renamed);
            target = self.old.join(renamed);
        }

        move_file(input, &target)?;
        info!("Original moved: {:?} -> {:?}", input, target);
        Ok(target)
    }
}

/// Rename, or copy and delete when source and target sit on different filesystems.
pub fn move_file(from: &Path, to: &Path) -> Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to)?;
    fs::remove_file(from)?;
    Ok(())
}
