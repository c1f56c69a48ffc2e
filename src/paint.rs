use crate::foundation::core::Cell;
use crate::foundation::error::{FogError, FogResult};
use crate::foundation::math::{OPAQUE, alpha_to_u8, lerp_u8};
use crate::raster::mask::MaskRaster;
use crate::shape::{Coverage, Footprint};
use crate::transition::pool::{ScheduleOutcome, TransitionPool, TransitionRequest};

/// Where a paint call runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    /// Paint under the engine lock on the calling thread.
    Immediate,
    /// Queue the paint for the engine's worker thread.
    #[default]
    Deferred,
}

/// Per-call paint parameters.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PaintOpts {
    /// Seconds to fade toward the new alpha; 0 writes immediately.
    pub duration: f64,
    /// Width of the falloff band as a fraction of the shape size. Ignored by mesh footprints.
    pub smoothness: f32,
    /// Seconds after reaching the target before the cell fades back; 0 keeps the change.
    pub restore_delay: f64,
    /// Seconds the restore fade takes.
    pub restore_duration: f64,
    /// Opacity restored to after `restore_delay`.
    pub restore_to_alpha: f32,
    /// Blend the falloff against the current opacity instead of fully opaque fog.
    pub blend: bool,
    /// Immediate or deferred execution.
    pub mode: UpdateMode,
}

impl Default for PaintOpts {
    fn default() -> Self {
        Self {
            duration: 0.0,
            smoothness: 1.0,
            restore_delay: 0.0,
            restore_duration: 2.0,
            restore_to_alpha: 1.0,
            blend: true,
            mode: UpdateMode::Deferred,
        }
    }
}

impl PaintOpts {
    /// Instant paint (no fade, no restore) on the calling thread.
    pub fn immediate() -> Self {
        Self {
            mode: UpdateMode::Immediate,
            ..Self::default()
        }
    }

    /// Reject non-finite or negative timing parameters.
    pub fn validate(&self) -> FogResult<()> {
        for (name, v) in [
            ("duration", self.duration),
            ("restore_delay", self.restore_delay),
            ("restore_duration", self.restore_duration),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(FogError::validation(format!(
                    "paint {name} must be finite and >= 0"
                )));
            }
        }
        if !self.smoothness.is_finite() || self.smoothness < 0.0 {
            return Err(FogError::validation("paint smoothness must be finite and >= 0"));
        }
        if !self.restore_to_alpha.is_finite() {
            return Err(FogError::validation("paint restore_to_alpha must be finite"));
        }
        Ok(())
    }
}

/// Counters from one paint call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PaintReport {
    /// Whether the footprint's reference point was inside the mask.
    pub in_bounds: bool,
    /// Cells that passed the touch rule.
    pub touched: usize,
    /// Cells written immediately.
    pub written: usize,
    /// Transitions started or replaced.
    pub scheduled: usize,
    /// Requests merged into in-flight transitions.
    pub coalesced: usize,
    /// Requests lost to pool exhaustion.
    pub dropped: usize,
}

impl PaintReport {
    fn record(&mut self, outcome: ScheduleOutcome) {
        match outcome {
            ScheduleOutcome::Started | ScheduleOutcome::Replaced => self.scheduled += 1,
            ScheduleOutcome::Coalesced => self.coalesced += 1,
            ScheduleOutcome::Dropped => self.dropped += 1,
        }
    }
}

/// Paint `new_alpha` over `footprint`, writing cells directly or scheduling transitions.
///
/// Falloff footprints blend each cell between the new alpha and the existing (or opaque, without
/// `blend`) alpha by the rasterizer's retention, and skip cells that would stay fully opaque or
/// unchanged. Mesh footprints set the new alpha exactly. A requested restore always touches the
/// cell so the restore gets scheduled.
pub fn paint_footprint(
    raster: &mut MaskRaster,
    pool: &mut TransitionPool,
    footprint: &Footprint,
    new_alpha: f32,
    opts: &PaintOpts,
    now: f64,
) -> PaintReport {
    let grid = raster.grid();
    let coverage = footprint.coverage();
    let new_b = alpha_to_u8(new_alpha);
    let restore_to = alpha_to_u8(opts.restore_to_alpha);
    let restoring = opts.restore_delay > 0.0;
    let mut report = PaintReport::default();

    let in_bounds = footprint.rasterize(&grid, opts.smoothness, &mut |cell, keep| {
        let current = raster.get(cell);
        let target = match coverage {
            Coverage::Falloff => {
                let base = if opts.blend { current } else { OPAQUE };
                let target = lerp_u8(new_b, base, keep);
                if target == OPAQUE || (current == target && !restoring) {
                    return;
                }
                target
            }
            Coverage::Binary => {
                if current == new_b && !restoring {
                    return;
                }
                new_b
            }
        };
        report.touched += 1;
        apply_cell(raster, pool, cell, current, target, restore_to, opts, now, &mut report);
    });
    report.in_bounds = in_bounds;
    report
}

#[allow(clippy::too_many_arguments)]
fn apply_cell(
    raster: &mut MaskRaster,
    pool: &mut TransitionPool,
    cell: Cell,
    current: u8,
    target: u8,
    restore_to: u8,
    opts: &PaintOpts,
    now: f64,
    report: &mut PaintReport,
) {
    if opts.duration > 0.0 {
        let outcome = pool.schedule(
            TransitionRequest {
                cell,
                initial_alpha: current,
                target_alpha: target,
                start_delay: 0.0,
                duration: opts.duration,
                restore_to_alpha: restore_to,
                restore_delay: opts.restore_delay,
                restore_duration: opts.restore_duration,
            },
            now,
        );
        report.record(outcome);
        return;
    }

    raster.set(cell, target);
    report.written += 1;
    if opts.restore_delay > 0.0 {
        let outcome = pool.schedule(
            TransitionRequest {
                cell,
                initial_alpha: target,
                target_alpha: restore_to,
                start_delay: opts.restore_delay,
                duration: opts.restore_duration,
                restore_to_alpha: restore_to,
                restore_delay: 0.0,
                restore_duration: 0.0,
            },
            now,
        );
        report.record(outcome);
    }
}

/// Write `alpha` into every cell covered by `footprint`, bypassing transitions.
///
/// Returns the number of cells written.
pub fn reset_footprint(raster: &mut MaskRaster, footprint: &Footprint, alpha: f32) -> usize {
    let grid = raster.grid();
    let value = alpha_to_u8(alpha);
    let mut written = 0;
    footprint.rasterize(&grid, 0.0, &mut |cell, _| {
        raster.set(cell, value);
        written += 1;
    });
    written
}

#[cfg(test)]
#[path = "../tests/unit/paint/paint.rs"]
mod tests;
