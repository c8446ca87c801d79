//! The linear sticker pipeline and its stages.
pub mod bounds;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod outline;
pub mod padding;
pub mod pipeline;
pub mod remove;
pub mod resize;
pub mod save;
