use crate::foundation::error::FogResult;
use crate::raster::mask::{MaskRaster, Placement};
use crate::upload::blur::{BlurKernel, blur_opacity};
use crate::upload::sink::{MaskSink, MaskSource, MaskUpload, ShaderParams};

/// Scratch and output buffers of the two blur passes.
#[derive(Debug, Default)]
struct BlurTargets {
    kernel: Option<BlurKernel>,
    horizontal: Vec<u8>,
    vertical: Vec<u8>,
}

/// Upload statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UploadStats {
    /// Successful uploads.
    pub uploads: u64,
    /// Texture (re)allocations.
    pub allocations: u64,
    /// Flushes skipped because a deferred paint was running.
    pub deferred: u64,
    /// Failed sink calls.
    pub failures: u64,
}

/// Mirrors the CPU mask into a [`MaskSink`] when it changes.
pub struct UploadSync {
    sink: Box<dyn MaskSink>,
    dirty: bool,
    allocated: Option<(u32, u32)>,
    blur: BlurTargets,
    stats: UploadStats,
}

impl UploadSync {
    /// Wrap a sink. Nothing is allocated until the first flush.
    pub fn new(sink: Box<dyn MaskSink>) -> Self {
        Self {
            sink,
            dirty: false,
            allocated: None,
            blur: BlurTargets::default(),
            stats: UploadStats::default(),
        }
    }

    /// Enable the blur passes with the given kernel, or disable them with `None`.
    pub fn set_blur(&mut self, radius: Option<(u32, f32)>) -> FogResult<()> {
        let kernel = match radius {
            Some((r, sigma)) if r > 0 => Some(BlurKernel::gaussian(r, sigma)?),
            _ => None,
        };
        if kernel != self.blur.kernel {
            self.blur.kernel = kernel;
            self.dirty = true;
        }
        Ok(())
    }

    /// Whether the blurred buffer is the sampled source.
    pub fn blur_enabled(&self) -> bool {
        self.blur.kernel.is_some()
    }

    /// Flag the mask as changed since the last upload.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Whether an upload is pending.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Forget the current allocation so the next flush reallocates and uploads.
    pub fn invalidate(&mut self) {
        self.allocated = None;
        self.dirty = true;
    }

    /// Counters.
    pub fn stats(&self) -> UploadStats {
        self.stats
    }

    /// Upload the raster if it changed (or `force`) and no deferred paint is running.
    ///
    /// Returns whether an upload happened. Sink failures are logged and keep the mask dirty so the
    /// next flush retries.
    pub fn flush(&mut self, raster: &MaskRaster, busy: bool, force: bool) -> bool {
        if !(self.dirty || force) {
            return false;
        }
        if busy {
            self.dirty = true;
            self.stats.deferred += 1;
            return false;
        }
        match self.upload(raster) {
            Ok(()) => {
                self.dirty = false;
                self.stats.uploads += 1;
                true
            }
            Err(err) => {
                self.dirty = true;
                self.stats.failures += 1;
                tracing::warn!(error = %err, "mask upload failed, will retry");
                false
            }
        }
    }

    fn upload(&mut self, raster: &MaskRaster) -> FogResult<()> {
        let dims = (raster.width(), raster.height());
        if self.allocated != Some(dims) {
            self.sink.resize(dims.0, dims.1)?;
            self.allocated = Some(dims);
            self.stats.allocations += 1;
            let len = dims.0 as usize * dims.1 as usize;
            self.blur.horizontal.clear();
            self.blur.horizontal.resize(len, 0);
            self.blur.vertical.clear();
            self.blur.vertical.resize(len, 0);
            tracing::debug!(width = dims.0, height = dims.1, "mask texture allocated");
        }

        let blurred = match &self.blur.kernel {
            Some(kernel) => {
                blur_opacity(
                    raster.cells(),
                    &mut self.blur.horizontal,
                    &mut self.blur.vertical,
                    dims.0,
                    dims.1,
                    kernel,
                );
                Some(self.blur.vertical.as_slice())
            }
            None => None,
        };

        self.sink.upload(MaskUpload {
            width: dims.0,
            height: dims.1,
            opacity: raster.cells(),
            blurred,
        })
    }

    /// Shader parameters for a placement.
    pub fn shader_params(&self, placement: &Placement, enabled: bool) -> ShaderParams {
        shader_params(placement, enabled, self.blur_enabled())
    }

    /// Push shader parameters to the sink.
    pub fn apply(&mut self, params: &ShaderParams) {
        self.sink.apply(params);
    }
}

pub(crate) fn shader_params(placement: &Placement, enabled: bool, blurred: bool) -> ShaderParams {
    let center = placement.effective_center();
    let size = placement.size;
    let min = center - size * 0.5;
    ShaderParams {
        enabled,
        center,
        size,
        center_adjusted: [min.x / size.x, 1.0, min.z / (size.z + 0.0001), 0.0],
        source: if blurred {
            MaskSource::Blurred
        } else {
            MaskSource::Raw
        },
    }
}

#[cfg(test)]
#[path = "../../tests/unit/upload/sync.rs"]
mod tests;
