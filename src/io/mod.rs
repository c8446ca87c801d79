//! Filesystem side of the tool: the watcher's folder layout and moves
//! (`organize`) and ZIP bundling for web sessions (`archive`).
pub mod archive;
pub mod organize;

pub use archive::write_zip;
pub use organize::{FolderLayout, output_file_name};
