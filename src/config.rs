//! Service configuration read from environment variables.
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::core::params::{
    DEFAULT_CANVAS_SIZE, DEFAULT_OUTLINE_WIDTH, MAX_CANVAS_SIZE, ProcessingParams,
};
use crate::error::{Error, Result};
use crate::types::{LogFormat, RemoverKind};

pub const DEFAULT_MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 50 * 1024 * 1024;
pub const DEFAULT_MAX_FILES: usize = 20;
pub const DEFAULT_RETENTION_SECS: u64 = 3600;

#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    pub max_file_bytes: u64,
    pub max_request_bytes: usize,
    pub max_files: usize,
    pub canvas_size: u32,
    pub outline_width: u32,
    pub remover: RemoverKind,
    pub model_path: Option<PathBuf>,
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub retention: Duration,
    pub log_format: LogFormat,
    /// Directory for rotating log files; None logs to the console only
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
            max_files: DEFAULT_MAX_FILES,
            canvas_size: DEFAULT_CANVAS_SIZE,
            outline_width: DEFAULT_OUTLINE_WIDTH,
            remover: RemoverKind::CornerKey,
            model_path: None,
            host: "0.0.0.0".to_string(),
            port: 5000,
            upload_dir: PathBuf::from("uploads"),
            processed_dir: PathBuf::from("web_processed"),
            retention: Duration::from_secs(DEFAULT_RETENTION_SECS),
            log_format: LogFormat::Human,
            log_dir: Some(PathBuf::from("logs")),
        }
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T> {
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim().parse().map_err(|_| Error::InvalidArgument {
                arg: key,
                value: raw,
            })
        }
        _ => Ok(default),
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source; unset or blank keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let d = Self::default();
        let model_path = lookup("MODEL_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);
        // A configured model implies the model-backed remover
        let default_remover = if model_path.is_some() {
            RemoverKind::Onnx
        } else {
            d.remover
        };
        let remover = match lookup("REMOVER") {
            Some(raw) if !raw.trim().is_empty() => {
                <RemoverKind as clap::ValueEnum>::from_str(raw.trim(), true).map_err(|_| {
                    Error::InvalidArgument {
                        arg: "REMOVER",
                        value: raw,
                    }
                })?
            }
            _ => default_remover,
        };

        // LOG_DIR=none switches file logging off
        let log_dir = match lookup("LOG_DIR") {
            Some(raw) if raw.trim().eq_ignore_ascii_case("none") => None,
            Some(raw) if !raw.trim().is_empty() => Some(PathBuf::from(raw.trim())),
            _ => d.log_dir,
        };

        let config = Self {
            max_file_bytes: parse_var(&lookup, "MAX_FILE_SIZE", d.max_file_bytes)?,
            max_request_bytes: parse_var(&lookup, "MAX_CONTENT_LENGTH", d.max_request_bytes)?,
            max_files: parse_var(&lookup, "MAX_FILES", d.max_files)?,
            canvas_size: parse_var(&lookup, "CANVAS_SIZE", d.canvas_size)?,
            outline_width: parse_var(&lookup, "OUTLINE_WIDTH", d.outline_width)?,
            remover,
            model_path,
            host: parse_var(&lookup, "HOST", d.host)?,
            port: parse_var(&lookup, "PORT", d.port)?,
            upload_dir: parse_var(&lookup, "UPLOAD_FOLDER", d.upload_dir)?,
            processed_dir: parse_var(&lookup, "PROCESSED_FOLDER", d.processed_dir)?,
            retention: Duration::from_secs(parse_var(
                &lookup,
                "RETENTION_SECS",
                DEFAULT_RETENTION_SECS,
            )?),
            log_format: parse_var(&lookup, "LOG_FORMAT", d.log_format)?,
            log_dir,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.canvas_size == 0 {
            return Err(Error::ZeroSize {
                size: self.canvas_size,
            });
        }
        if self.canvas_size > MAX_CANVAS_SIZE {
            return Err(Error::InvalidArgument {
                arg: "CANVAS_SIZE",
                value: self.canvas_size.to_string(),
            });
        }
        if self.max_files == 0 {
            return Err(Error::InvalidArgument {
                arg: "MAX_FILES",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    pub fn processing_params(&self) -> ProcessingParams {
        ProcessingParams {
            canvas_size: self.canvas_size,
            ..ProcessingParams::default()
        }
        .with_outline_width(self.outline_width)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| Error::InvalidArgument {
                arg: "HOST",
                value: self.host.clone(),
            })
    }
}
