//! Core processing building blocks: background removal, content cropping,
//! resize/padding onto the square canvas, outlines and PNG saving. These are
//! internal primitives consumed by the high-level `api` module.
pub mod params;
pub mod processing;
