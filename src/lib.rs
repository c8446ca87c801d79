#![doc = r#"
STICKERPRO: turn photos into stickers.

Each image goes through a short, linear pipeline: the background is removed by a
pluggable [`BackgroundRemover`] (an ONNX segmentation model, or a model-free
corner-key remover), the cutout is cropped to its visible content, fitted onto a
fixed transparent square canvas (512×512 by default) and optionally given a soft
outline. Results are written as PNG.

The crate powers two front ends: a CLI that processes single files, whole
directories, or watches a `new/` folder, and (with the `web` feature) a small
upload server that returns a ZIP of processed images.

Add dependency
--------------
```toml
[dependencies]
stickerpro = { version = "0.1", features = ["full"] }
```

Quick start: process a file
---------------------------
```rust,no_run
use std::path::Path;
use stickerpro::{api, ProcessingParams, RemoverKind};

fn main() -> stickerpro::Result<()> {
    let pipeline = api::build_pipeline(RemoverKind::CornerKey, None, ProcessingParams::default())?;
    api::process_file_to_path(&pipeline, Path::new("cat.jpg"), Path::new("cat_processed.png"))
}
```

Process in-memory
-----------------
```rust,no_run
use stickerpro::{api, ProcessingParams, RemoverKind};

fn main() -> stickerpro::Result<()> {
    let params = ProcessingParams { canvas_size: 256, ..ProcessingParams::default() };
    let pipeline = api::build_pipeline(RemoverKind::Passthrough, None, params)?;
    let png = api::process_bytes_to_png(&pipeline, &std::fs::read("cat.jpg")?)?;
    std::fs::write("cat.png", png)?;
    Ok(())
}
```

Watch a folder
--------------
```rust,no_run
use std::path::Path;
use std::sync::atomic::AtomicBool;
use stickerpro::io::FolderLayout;
use stickerpro::watcher::{FolderWatcher, WatchOptions};
use stickerpro::{api, ProcessingParams, RemoverKind};

fn main() -> stickerpro::Result<()> {
    let pipeline = api::build_pipeline(RemoverKind::CornerKey, None, ProcessingParams::default())?;
    let watcher = FolderWatcher::new(FolderLayout::under(Path::new(".")), pipeline, WatchOptions::default())?;
    watcher.run(&AtomicBool::new(false))
}
```

Error handling
--------------
All public functions return `stickerpro::Result<T>`. A failing background
remover never surfaces as an error: the pipeline falls back to the source
image. Errors are reserved for undecodable input, rejected uploads and I/O.

Feature flags
-------------
- `web` (default): the axum upload server and the `stickerpro-web` binary.
- `onnx`: ONNX Runtime background removal (`--model path/to/u2net.onnx`).
- `full`: both.
"#]

// Core modules (public)
pub mod api;
pub mod config;
pub mod core;
pub mod error;
pub mod io;
pub mod logging;
pub mod types;
pub mod watcher;

// Web module (only available with web feature)
#[cfg(feature = "web")]
pub mod web;

// Curated public API surface
pub use crate::core::params::{OutlineParams, ProcessingParams};
pub use crate::core::processing::pipeline::Pipeline;
pub use crate::core::processing::remove::{
    BackgroundRemover, CornerKeyRemover, PassthroughRemover, build_remover,
};
pub use error::{Error, Result};
pub use types::{InputFormat, LogFormat, RemoverKind, is_supported_image};

pub use api::{
    BatchReport, build_pipeline, iterate_images, process_bytes_to_png, process_directory_to_path,
    process_file_to_path,
};
