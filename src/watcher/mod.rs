//! Folder watcher: reacts to images appearing in `new/`, waits until they are
//! fully written, runs the pipeline and files the results.
//!
//! Files are handled one at a time in the order events arrive. A failed file
//! is logged and left in `new/` for manual inspection; it is not retried.
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{RecvTimeoutError, channel};
use std::thread;
use std::time::{Duration, Instant};

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use tracing::{debug, error, info, warn};

use crate::core::processing::pipeline::Pipeline;
use crate::error::{Error, Result};
use crate::io::organize::FolderLayout;
use crate::types::is_supported_image;

#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Delay between two size probes of a new file
    pub poll_interval: Duration,
    /// Give up on a file that keeps growing for this long
    pub stable_timeout: Duration,
    /// Process images already sitting in `new/` at startup
    pub scan_existing: bool,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            stable_timeout: Duration::from_secs(30),
            scan_existing: false,
        }
    }
}

/// Block until the size of `path` is non-zero and unchanged across two probes.
pub fn wait_for_stable_size(path: &Path, interval: Duration, timeout: Duration) -> Result<u64> {
    let deadline = Instant::now() + timeout;
    let mut last = fs::metadata(path)?.len();
    loop {
        thread::sleep(interval);
        let current = fs::metadata(path)?.len();
        if current == last && current > 0 {
            return Ok(current);
        }
        if Instant::now() >= deadline {
            return Err(Error::Processing(format!(
                "{} did not finish writing within {:?}",
                path.display(),
                timeout
            )));
        }
        last = current;
    }
}

/// Paths that just appeared in the watched folder, by creation or by rename.
pub fn created_paths(event: &Event) -> Vec<PathBuf> {
    match event.kind {
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            event.paths.clone()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            event.paths.last().cloned().into_iter().collect()
        }
        _ => Vec::new(),
    }
}

pub struct FolderWatcher {
    layout: FolderLayout,
    pipeline: Pipeline,
    options: WatchOptions,
}

impl FolderWatcher {
    pub fn new(layout: FolderLayout, pipeline: Pipeline, options: WatchOptions) -> Result<Self> {
        layout.ensure()?;
        Ok(Self {
            layout,
            pipeline,
            options,
        })
    }

    pub fn layout(&self) -> &FolderLayout {
        &self.layout
    }

    /// Process one candidate file. Returns the output path, or None when the
    /// path is not a supported image.
    pub fn handle_path(&self, path: &Path) -> Result<Option<PathBuf>> {
        if !is_supported_image(path) || path.is_dir() {
            debug!("Ignoring {:?}", path);
            return Ok(None);
        }

        info!("New image detected: {:?}", path.file_name().unwrap_or_default());
        let size = wait_for_stable_size(
            path,
            self.options.poll_interval,
            self.options.stable_timeout,
        )?;
        debug!("{:?} is stable at {} bytes", path, size);

        let output = self.layout.output_path_for(path);
        self.pipeline.process_file(path, &output)?;
        self.layout.archive_original(path)?;
        Ok(Some(output))
    }

    fn dispatch(&self, path: &Path) {
        match self.handle_path(path) {
            Ok(Some(output)) => info!("Processed {:?} -> {:?}", path, output),
            Ok(None) => {}
            Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("{:?} vanished before processing", path);
            }
            Err(e) => error!(error = %e, "Image processing failed for {:?}, left in place", path),
        }
    }

    /// Process every supported image currently in `new/`, in name order.
    pub fn scan_existing(&self) -> Result<usize> {
        let mut paths: Vec<PathBuf> = fs::read_dir(&self.layout.new)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_supported_image(p))
            .collect();
        paths.sort();
        info!("Initial scan found {} image(s)", paths.len());
        for path in &paths {
            self.dispatch(path);
        }
        Ok(paths.len())
    }

    /// Watch `new/` until `stop` is set.
    pub fn run(&self, stop: &AtomicBool) -> Result<()> {
        let (tx, rx) = channel();
        let mut watcher = notify::recommended_watcher(tx)?;
        watcher.watch(&self.layout.new, RecursiveMode::NonRecursive)?;
        info!(
            "Monitoring {:?} for new images ({} remover)...",
            self.layout.new,
            self.pipeline.remover_name()
        );

        if self.options.scan_existing {
            self.scan_existing()?;
        }

        while !stop.load(Ordering::Relaxed) {
            match rx.recv_timeout(Duration::from_millis(200)) {
                Ok(Ok(event)) => {
                    for path in created_paths(&event) {
                        self.dispatch(&path);
                    }
                }
                Ok(Err(e)) => warn!(error = %e, "Watch error"),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        info!("Monitoring stopped");
        Ok(())
    }
}
