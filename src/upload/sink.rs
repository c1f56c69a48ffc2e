use std::sync::Arc;

use parking_lot::Mutex;

use crate::foundation::core::Vec3;
use crate::foundation::error::{FogError, FogResult};

/// Which buffer the renderer should sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskSource {
    /// Raw opacity bytes.
    Raw,
    /// Output of the vertical blur pass.
    Blurred,
}

/// Parameters the renderer needs to map world positions onto the mask texture.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ShaderParams {
    /// Whether the mask should be sampled at all.
    pub enabled: bool,
    /// Effective world centre of the mask rectangle.
    pub center: Vec3,
    /// World size of the mask rectangle.
    pub size: Vec3,
    /// Lower corner divided by size: `[min.x / size.x, 1, min.z / (size.z + 1e-4), 0]`.
    pub center_adjusted: [f64; 4],
    /// Buffer bound for sampling.
    pub source: MaskSource,
}

/// One texture update.
#[derive(Clone, Copy, Debug)]
pub struct MaskUpload<'a> {
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Raw row-major opacity bytes.
    pub opacity: &'a [u8],
    /// Blurred opacity, present when blur is enabled.
    pub blurred: Option<&'a [u8]>,
}

/// External texture the mask is mirrored into.
///
/// Calls arrive from whichever thread ticks the engine, always under the engine lock.
pub trait MaskSink: Send {
    /// (Re)allocate textures for a `width x height` mask. Called only when dimensions change.
    fn resize(&mut self, width: u32, height: u32) -> FogResult<()>;
    /// Replace texture contents.
    fn upload(&mut self, upload: MaskUpload<'_>) -> FogResult<()>;
    /// Bind shader parameters; called every tick after flushing.
    fn apply(&mut self, _params: &ShaderParams) {}
}

impl MaskSink for Box<dyn MaskSink> {
    fn resize(&mut self, width: u32, height: u32) -> FogResult<()> {
        (**self).resize(width, height)
    }

    fn upload(&mut self, upload: MaskUpload<'_>) -> FogResult<()> {
        (**self).upload(upload)
    }

    fn apply(&mut self, params: &ShaderParams) {
        (**self).apply(params)
    }
}

/// Sink that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullMaskSink;

impl MaskSink for NullMaskSink {
    fn resize(&mut self, _width: u32, _height: u32) -> FogResult<()> {
        Ok(())
    }

    fn upload(&mut self, _upload: MaskUpload<'_>) -> FogResult<()> {
        Ok(())
    }
}

/// Upload captured by [`InMemoryMaskSink`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedUpload {
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Raw opacity bytes.
    pub opacity: Vec<u8>,
    /// Blurred opacity bytes.
    pub blurred: Option<Vec<u8>>,
}

#[derive(Debug, Default)]
struct Recorded {
    resizes: Vec<(u32, u32)>,
    uploads: Vec<RecordedUpload>,
    params: Option<ShaderParams>,
    applies: u64,
    failing: bool,
}

/// In-memory sink for tests and tools.
///
/// Clones share the same record, so a caller can keep one handle while the engine owns another.
#[derive(Clone, Debug, Default)]
pub struct InMemoryMaskSink {
    inner: Arc<Mutex<Recorded>>,
}

impl InMemoryMaskSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `resize`/`upload` calls fail with [`FogError::Upload`].
    pub fn set_failing(&self, failing: bool) {
        self.inner.lock().failing = failing;
    }

    /// Dimensions passed to every `resize` call, in order.
    pub fn resizes(&self) -> Vec<(u32, u32)> {
        self.inner.lock().resizes.clone()
    }

    /// Number of successful uploads.
    pub fn upload_count(&self) -> usize {
        self.inner.lock().uploads.len()
    }

    /// Most recent successful upload.
    pub fn last_upload(&self) -> Option<RecordedUpload> {
        self.inner.lock().uploads.last().cloned()
    }

    /// Most recent shader parameters.
    pub fn last_params(&self) -> Option<ShaderParams> {
        self.inner.lock().params
    }

    /// Number of `apply` calls.
    pub fn apply_count(&self) -> u64 {
        self.inner.lock().applies
    }
}

impl MaskSink for InMemoryMaskSink {
    fn resize(&mut self, width: u32, height: u32) -> FogResult<()> {
        let mut rec = self.inner.lock();
        if rec.failing {
            return Err(FogError::upload("in-memory sink is failing"));
        }
        rec.resizes.push((width, height));
        Ok(())
    }

    fn upload(&mut self, upload: MaskUpload<'_>) -> FogResult<()> {
        let mut rec = self.inner.lock();
        if rec.failing {
            return Err(FogError::upload("in-memory sink is failing"));
        }
        rec.uploads.push(RecordedUpload {
            width: upload.width,
            height: upload.height,
            opacity: upload.opacity.to_vec(),
            blurred: upload.blurred.map(<[u8]>::to_vec),
        });
        Ok(())
    }

    fn apply(&mut self, params: &ShaderParams) {
        let mut rec = self.inner.lock();
        rec.params = Some(*params);
        rec.applies += 1;
    }
}
