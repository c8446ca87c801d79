use clap::Parser;
use std::path::PathBuf;

use stickerpro::{LogFormat, RemoverKind};

#[derive(Parser)]
#[command(name = "stickerpro", version, about = "STICKERPRO CLI")]
pub struct CliArgs {
    /// Input image (single file mode)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Input directory containing images (batch mode)
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// Output PNG filename (single file mode, default: <stem>_processed.png)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing (batch mode)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Watch mode: monitor <DIR>/new, write to <DIR>/processed, move originals to <DIR>/old
    #[arg(short, long, num_args = 0..=1, default_missing_value = ".")]
    pub watch: Option<PathBuf>,

    /// Watch mode: also process images already waiting in the new folder
    #[arg(long, default_value_t = false)]
    pub scan_existing: bool,

    /// Side length of the square output canvas [default: 512]
    #[arg(long)]
    pub size: Option<u32>,

    /// Outline width in pixels, 0 disables the outline [default: 6]
    #[arg(long)]
    pub outline_width: Option<u32>,

    /// Keep the full frame instead of cropping to the visible subject
    #[arg(long, default_value_t = false)]
    pub no_crop: bool,

    /// JSON file with processing parameters; --size and --outline-width override it
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// Background remover (defaults to onnx when --model is given, corner-key otherwise)
    #[arg(long, value_enum)]
    pub remover: Option<RemoverKind>,

    /// ONNX segmentation model (u2net family)
    #[arg(long, env = "MODEL_PATH")]
    pub model: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, default_value_t = false)]
    pub log: bool,

    /// Log output format
    #[arg(long, value_enum, env = "LOG_FORMAT", default_value_t = LogFormat::Human)]
    pub log_format: LogFormat,

    /// Also write rotating log files (app, error, debug, processing) into this directory
    #[arg(long, env = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Batch mode: continue processing other files after an error
    #[arg(long, default_value_t = false)]
    pub batch: bool,
}
