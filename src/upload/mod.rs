//! Upload synchronization between the CPU mask and the renderer's texture.
//!
//! The engine never hands the renderer its live buffer. Each tick, when the mask changed and no
//! deferred paint is running, [`sync::UploadSync`] copies it (optionally blurred) into a
//! [`sink::MaskSink`].

/// Separable Gaussian blur over single-channel opacity buffers.
pub mod blur;
/// Texture sink trait and the in-memory sink.
pub mod sink;
/// Dirty tracking, target allocation and shader parameters.
pub mod sync;
