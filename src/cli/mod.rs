//! Command Line Interface (CLI) layer for STICKERPRO.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! and the orchestration logic (`runner`) for single-file, batch and watch
//! flows. It wires user-provided options to the library exposed via
//! `stickerpro::api` and `stickerpro::watcher`.
//!
//! If you are embedding STICKERPRO into another application, prefer using
//! the high-level `stickerpro::api` module instead of calling the CLI code.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
