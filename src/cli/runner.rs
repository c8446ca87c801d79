use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use tracing::info;

use stickerpro::api::{build_pipeline, process_directory_to_path, process_file_to_path};
use stickerpro::io::organize::{FolderLayout, output_file_name};
use stickerpro::watcher::{FolderWatcher, WatchOptions};
use stickerpro::{Pipeline, ProcessingParams, RemoverKind, logging};

use super::args::CliArgs;
use super::errors::AppError;

fn resolve_params(args: &CliArgs) -> Result<ProcessingParams, AppError> {
    let mut params = match &args.params {
        Some(path) => ProcessingParams::from_json_file(path)?,
        None => ProcessingParams::default(),
    };

    if let Some(size) = args.size {
        if size == 0 {
            return Err(AppError::ZeroSize { size });
        }
        params.canvas_size = size;
    }
    if let Some(width) = args.outline_width {
        params = params.with_outline_width(width);
    }
    if args.no_crop {
        params.crop_to_content = false;
    }
    Ok(params)
}

fn resolve_pipeline(args: &CliArgs) -> Result<Pipeline, AppError> {
    let remover = args.remover.unwrap_or(if args.model.is_some() {
        RemoverKind::Onnx
    } else {
        RemoverKind::CornerKey
    });
    let params = resolve_params(args)?;
    info!(
        "Canvas {}x{}, outline: {:?}",
        params.canvas_size, params.canvas_size, params.outline
    );
    Ok(build_pipeline(remover, args.model.as_deref(), params)?)
}

fn run_watch(base: &Path, pipeline: Pipeline, scan_existing: bool) -> Result<(), AppError> {
    let layout = FolderLayout::under(base);
    let watcher = FolderWatcher::new(
        layout,
        pipeline,
        WatchOptions {
            scan_existing,
            ..WatchOptions::default()
        },
    )?;
    // Runs until the process is interrupted
    let stop = AtomicBool::new(false);
    watcher.run(&stop)?;
    Ok(())
}

fn run_batch(
    pipeline: &Pipeline,
    input_dir: PathBuf,
    output_dir: Option<PathBuf>,
    continue_on_error: bool,
) -> Result<(), AppError> {
    let output_dir = output_dir.ok_or(AppError::MissingArgument {
        arg: "--output-dir".to_string(),
    })?;
    fs::create_dir_all(&output_dir)?;

    info!("Starting batch processing from directory: {:?}", input_dir);
    info!("Output directory: {:?}", output_dir);

    let report = process_directory_to_path(pipeline, &input_dir, &output_dir, continue_on_error)?;

    info!("Batch processing complete!");
    info!("Processed: {}", report.processed);
    info!("Skipped: {}", report.skipped);
    info!("Errors: {}", report.errors);
    Ok(())
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    let level = if args.log { "debug" } else { "info" };
    let _log_guard = logging::init(args.log_format, level, args.log_dir.as_deref())?;

    if args.watch.is_some() && (args.input.is_some() || args.input_dir.is_some()) {
        return Err(AppError::Conflict {
            first: "--watch",
            second: "--input/--input-dir",
        }
        .into());
    }

    let pipeline = resolve_pipeline(&args)?;

    if let Some(base) = &args.watch {
        run_watch(base, pipeline, args.scan_existing)?;
    } else if let Some(input_dir) = args.input_dir {
        run_batch(&pipeline, input_dir, args.output_dir, args.batch)?;
    } else {
        let input = args.input.ok_or(AppError::MissingArgument {
            arg: "--input, --input-dir or --watch".to_string(),
        })?;
        let output = args
            .output
            .unwrap_or_else(|| input.with_file_name(output_file_name(&input)));

        process_file_to_path(&pipeline, &input, &output)?;
        info!("Successfully processed: {:?} -> {:?}", input, output);
    }

    Ok(())
}
