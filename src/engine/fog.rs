use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::config::FogOfWarOpts;
use crate::engine::worker::{PaintJob, Worker};
use crate::foundation::core::Vec3;
use crate::foundation::error::{FogError, FogResult};
use crate::foundation::math::alpha_to_u8;
use crate::paint::{PaintOpts, PaintReport, UpdateMode, paint_footprint, reset_footprint};
use crate::raster::mask::{MaskRaster, MaskSnapshot, aligned_dimension};
use crate::shape::Footprint;
use crate::transition::pool::{PoolStats, TransitionPool};
use crate::transition::scheduler;
use crate::upload::sink::{MaskSink, ShaderParams};
use crate::upload::sync::{UploadStats, UploadSync};

/// Everything guarded by the engine lock.
pub(crate) struct FogState {
    opts: FogOfWarOpts,
    raster: Option<MaskRaster>,
    pool: TransitionPool,
    upload: UploadSync,
    now: f64,
}

impl FogState {
    fn new(opts: FogOfWarOpts, sink: Box<dyn MaskSink>) -> FogResult<Self> {
        let mut upload = UploadSync::new(sink);
        upload.set_blur(opts.blur_kernel())?;
        let mut state = Self {
            pool: TransitionPool::new(opts.max_transitions),
            raster: None,
            upload,
            opts,
            now: 0.0,
        };
        if state.opts.enabled {
            state.init_raster()?;
        }
        Ok(state)
    }

    /// (Re)create the raster at the configured size, fully opaque, and upload it.
    fn init_raster(&mut self) -> FogResult<()> {
        let raster = MaskRaster::new(self.opts.width(), self.opts.height(), self.opts.placement)?;
        tracing::debug!(
            width = raster.width(),
            height = raster.height(),
            "fog raster initialized"
        );
        self.pool.reset();
        self.upload.invalidate();
        self.upload.flush(&raster, false, true);
        self.raster = Some(raster);
        Ok(())
    }

    pub(crate) fn paint(&mut self, job: &PaintJob) -> PaintReport {
        let Some(raster) = self.raster.as_mut() else {
            return PaintReport::default();
        };
        let report = paint_footprint(
            raster,
            &mut self.pool,
            &job.footprint,
            job.new_alpha,
            &job.opts,
            job.issued_at.unwrap_or(self.now),
        );
        if report.written > 0 {
            self.upload.mark_dirty();
        }
        report
    }

    fn shader_params(&self) -> ShaderParams {
        let placement = self
            .raster
            .as_ref()
            .map_or(&self.opts.placement, MaskRaster::placement);
        self.upload.shader_params(placement, self.raster.is_some())
    }

    /// Drop transitions and push the current buffer to the sink right away.
    fn replace_contents(&mut self) {
        self.pool.reset();
        if let Some(raster) = &self.raster {
            self.upload.flush(raster, false, true);
        }
    }
}

/// State shared between engine handles and the worker thread.
pub(crate) struct Shared {
    pub(crate) state: Mutex<FogState>,
    pub(crate) pending: AtomicUsize,
    /// Set by the worker while it holds the lock to apply a job.
    pub(crate) running: AtomicBool,
    settings_version: AtomicU64,
}

/// Fog-of-war mask engine.
///
/// A cheap, cloneable handle: clones share one raster, one transition pool and one worker. The
/// worker stops once the last handle is dropped.
#[derive(Clone)]
pub struct FogOfWar {
    shared: Arc<Shared>,
    worker: Arc<Worker>,
}

impl std::fmt::Debug for FogOfWar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FogOfWar")
            .field("dimensions", &self.dimensions())
            .field("pending", &self.shared.pending.load(Ordering::Acquire))
            .field("settings_version", &self.settings_version())
            .finish()
    }
}

impl FogOfWar {
    /// Build an engine mirroring its mask into `sink`.
    ///
    /// When `opts.enabled` the raster is allocated fully opaque and uploaded once.
    #[tracing::instrument(skip(opts, sink), fields(width = opts.width(), height = opts.height()))]
    pub fn new(opts: FogOfWarOpts, sink: impl MaskSink + 'static) -> FogResult<Self> {
        opts.validate()?;
        let state = FogState::new(opts, Box::new(sink))?;
        let shared = Arc::new(Shared {
            state: Mutex::new(state),
            pending: AtomicUsize::new(0),
            running: AtomicBool::new(false),
            settings_version: AtomicU64::new(0),
        });
        let worker = Worker::spawn(Arc::clone(&shared))?;
        Ok(Self {
            shared,
            worker: Arc::new(worker),
        })
    }

    /// Advance transitions to clock time `now` (seconds), upload if needed and bind shader params.
    ///
    /// Returns whether the sink received an upload. Queued deferred paints do not hold the upload
    /// back; only a job the worker is applying does.
    pub fn tick(&self, now: f64) -> bool {
        let mut st = self.shared.state.lock();
        let busy = self.shared.running.load(Ordering::Acquire);
        st.now = now;
        let FogState {
            raster,
            pool,
            upload,
            ..
        } = &mut *st;
        let mut uploaded = false;
        if let Some(raster) = raster.as_mut() {
            if scheduler::advance(pool, raster, now) {
                upload.mark_dirty();
            }
            uploaded = upload.flush(raster, busy, false);
        }
        let params = st.shader_params();
        st.upload.apply(&params);
        uploaded
    }

    /// Advance the clock by `dt` seconds, see [`Self::tick`].
    pub fn advance(&self, dt: f64) -> bool {
        let now = self.now() + dt.max(0.0);
        self.tick(now)
    }

    /// Current engine clock in seconds.
    pub fn now(&self) -> f64 {
        self.shared.state.lock().now
    }

    /// Paint options built from the engine settings.
    pub fn paint_defaults(&self) -> PaintOpts {
        self.shared.state.lock().opts.paint
    }

    /// Paint `new_alpha` over a footprint, immediately or through the worker per `opts.mode`.
    ///
    /// Transitions start at the engine clock, i.e. the time of the last [`Self::tick`] (0 before
    /// the first one). Use [`Self::set_alpha_at`] when the caller's clock has moved on since.
    ///
    /// A footprint outside the mask is ignored. Missing geometry is reported and nothing is painted.
    #[tracing::instrument(skip(self, footprint, opts), fields(mode = ?opts.mode))]
    pub fn set_alpha(
        &self,
        footprint: impl Into<Footprint>,
        new_alpha: f32,
        opts: PaintOpts,
    ) -> FogResult<()> {
        self.paint(footprint.into(), new_alpha, opts, None)
    }

    /// Like [`Self::set_alpha`], but transitions start at the caller's clock time `now`.
    #[tracing::instrument(skip(self, footprint, opts), fields(mode = ?opts.mode))]
    pub fn set_alpha_at(
        &self,
        footprint: impl Into<Footprint>,
        new_alpha: f32,
        opts: PaintOpts,
        now: f64,
    ) -> FogResult<()> {
        if !now.is_finite() {
            return Err(FogError::validation("paint time must be finite"));
        }
        self.paint(footprint.into(), new_alpha, opts, Some(now))
    }

    fn paint(
        &self,
        footprint: Footprint,
        new_alpha: f32,
        opts: PaintOpts,
        issued_at: Option<f64>,
    ) -> FogResult<()> {
        if let Err(err) = footprint.validate().and_then(|()| opts.validate()) {
            tracing::warn!(error = %err, ?footprint, "paint rejected");
            return Err(err);
        }
        if !new_alpha.is_finite() {
            return Err(FogError::validation("alpha must be finite"));
        }

        let job = PaintJob {
            footprint,
            new_alpha,
            opts,
            issued_at,
        };
        match opts.mode {
            UpdateMode::Immediate => {
                let report = self.shared.state.lock().paint(&job);
                if !report.in_bounds {
                    tracing::trace!("paint footprint outside mask");
                }
                Ok(())
            }
            UpdateMode::Deferred => {
                if self.shared.state.lock().raster.is_none() {
                    return Ok(());
                }
                self.worker.submit(&self.shared, job)
            }
        }
    }

    /// Write `alpha` over a footprint right away, bypassing transitions.
    #[tracing::instrument(skip(self, footprint))]
    pub fn reset_alpha(&self, footprint: impl Into<Footprint>, alpha: f32) -> FogResult<()> {
        let footprint = footprint.into();
        if let Err(err) = footprint.validate() {
            tracing::warn!(error = %err, ?footprint, "reset rejected");
            return Err(err);
        }
        let mut st = self.shared.state.lock();
        let FogState { raster, upload, .. } = &mut *st;
        if let Some(raster) = raster.as_mut()
            && reset_footprint(raster, &footprint, alpha) > 0
        {
            upload.mark_dirty();
        }
        Ok(())
    }

    /// Set the whole mask to `alpha`, drop every transition and upload immediately.
    #[tracing::instrument(skip(self))]
    pub fn reset_all(&self, alpha: f32) {
        let mut st = self.shared.state.lock();
        if let Some(raster) = st.raster.as_mut() {
            raster.set_all(alpha_to_u8(alpha));
        }
        st.replace_contents();
    }

    /// Normalized opacity at a world position. 1.0 outside the mask or while disabled.
    pub fn alpha_at(&self, pos: Vec3) -> f32 {
        self.shared
            .state
            .lock()
            .raster
            .as_ref()
            .map_or(1.0, |r| r.alpha_at(pos))
    }

    /// Copy of the raw opacity bytes, `None` while disabled.
    pub fn opacity_bytes(&self) -> Option<Vec<u8>> {
        self.shared
            .state
            .lock()
            .raster
            .as_ref()
            .map(|r| r.cells().to_vec())
    }

    /// Replace the raw opacity bytes (current dimensions) and upload them.
    ///
    /// In-flight transitions are dropped. Ignored while disabled.
    #[tracing::instrument(skip(self, bytes), fields(len = bytes.len()))]
    pub fn set_opacity_bytes(&self, bytes: &[u8]) -> FogResult<()> {
        let mut st = self.shared.state.lock();
        let Some(raster) = st.raster.as_mut() else {
            return Ok(());
        };
        raster.copy_from(bytes)?;
        st.replace_contents();
        Ok(())
    }

    /// Dimensions and opacity bytes, `None` while disabled.
    pub fn snapshot(&self) -> Option<MaskSnapshot> {
        self.shared
            .state
            .lock()
            .raster
            .as_ref()
            .map(MaskRaster::snapshot)
    }

    /// Restore a snapshot, resizing the raster if needed, and upload it.
    ///
    /// Dimensions must be multiples of 4, the same alignment the settings apply. In-flight
    /// transitions are dropped. Ignored while disabled.
    #[tracing::instrument(skip(self, snapshot), fields(width = snapshot.width, height = snapshot.height))]
    pub fn load_snapshot(&self, snapshot: &MaskSnapshot) -> FogResult<()> {
        if aligned_dimension(snapshot.width) != snapshot.width
            || aligned_dimension(snapshot.height) != snapshot.height
        {
            return Err(FogError::validation(format!(
                "snapshot dimensions {}x{} must be multiples of 4",
                snapshot.width, snapshot.height
            )));
        }
        let mut st = self.shared.state.lock();
        let Some(raster) = st.raster.as_mut() else {
            return Ok(());
        };
        if raster.load(snapshot)? {
            st.opts.texture_width = snapshot.width;
            st.opts.texture_height = snapshot.height;
            st.upload.invalidate();
            self.bump_settings();
        }
        st.replace_contents();
        Ok(())
    }

    /// Turn the mask on (allocating an opaque raster) or off (releasing it).
    #[tracing::instrument(skip(self))]
    pub fn set_enabled(&self, enabled: bool) -> FogResult<()> {
        let mut st = self.shared.state.lock();
        if st.opts.enabled == enabled {
            return Ok(());
        }
        st.opts.enabled = enabled;
        if enabled {
            st.init_raster()?;
        } else {
            st.raster = None;
            st.pool.reset();
        }
        self.bump_settings();
        let params = st.shader_params();
        st.upload.apply(&params);
        Ok(())
    }

    /// Move the owner position used by local placement.
    pub fn set_anchor(&self, anchor: Vec3) {
        let mut st = self.shared.state.lock();
        st.opts.placement.anchor = anchor;
        if let Some(raster) = st.raster.as_mut() {
            raster.set_anchor(anchor);
        }
    }

    /// Apply new settings. A size or pool-capacity change rebuilds the mask fully opaque.
    #[tracing::instrument(skip(self, opts))]
    pub fn apply_opts(&self, opts: FogOfWarOpts) -> FogResult<()> {
        opts.validate()?;
        let mut st = self.shared.state.lock();
        st.upload.set_blur(opts.blur_kernel())?;

        let rebuild = opts.width() != st.opts.width()
            || opts.height() != st.opts.height()
            || opts.max_transitions != st.opts.max_transitions
            || opts.enabled != st.opts.enabled;
        if opts.max_transitions != st.opts.max_transitions {
            st.pool = TransitionPool::new(opts.max_transitions);
        }
        st.opts = opts;

        if !st.opts.enabled {
            st.raster = None;
            st.pool.reset();
        } else if rebuild || st.raster.is_none() {
            st.init_raster()?;
        } else {
            let placement = st.opts.placement;
            if let Some(raster) = st.raster.as_mut() {
                raster.set_placement(placement)?;
            }
            st.upload.mark_dirty();
        }
        self.bump_settings();
        Ok(())
    }

    fn bump_settings(&self) {
        self.shared.settings_version.fetch_add(1, Ordering::AcqRel);
    }

    /// Incremented whenever settings change through this engine.
    pub fn settings_version(&self) -> u64 {
        self.shared.settings_version.load(Ordering::Acquire)
    }

    /// Current settings.
    pub fn opts(&self) -> FogOfWarOpts {
        self.shared.state.lock().opts.clone()
    }

    /// Raster dimensions, `None` while disabled.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.shared
            .state
            .lock()
            .raster
            .as_ref()
            .map(|r| (r.width(), r.height()))
    }

    /// Whether the mask is allocated.
    pub fn is_enabled(&self) -> bool {
        self.shared.state.lock().raster.is_some()
    }

    /// Number of live transitions.
    pub fn live_transitions(&self) -> usize {
        self.shared.state.lock().pool.live()
    }

    /// Transition pool counters.
    pub fn pool_stats(&self) -> PoolStats {
        self.shared.state.lock().pool.stats()
    }

    /// Upload counters.
    pub fn upload_stats(&self) -> UploadStats {
        self.shared.state.lock().upload.stats()
    }

    /// Whether deferred paints are queued or running.
    pub fn is_busy(&self) -> bool {
        self.shared.pending.load(Ordering::Acquire) > 0
    }

    /// Whether the mask changed since the last upload.
    pub fn is_dirty(&self) -> bool {
        self.shared.state.lock().upload.is_dirty()
    }

    /// Block until every deferred paint submitted so far has been applied.
    pub fn wait_idle(&self) {
        self.worker.wait_idle();
    }

    /// Shader parameters for the current placement.
    pub fn shader_params(&self) -> ShaderParams {
        self.shared.state.lock().shader_params()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/fog.rs"]
mod tests;
