use crate::foundation::math::lerp_u8;
use crate::raster::mask::MaskRaster;
use crate::transition::pool::TransitionPool;

/// Advance every live transition to clock time `now`, writing interpolated opacity into `raster`.
///
/// Finished transitions with a pending restore are re-armed in place as the restore phase; all
/// others are released. Returns whether any cell was written.
pub fn advance(pool: &mut TransitionPool, raster: &mut MaskRaster, now: f64) -> bool {
    let mut wrote = false;
    for i in pool.scan_range() {
        let slot = pool.slot_mut(i);
        if !slot.enabled {
            continue;
        }
        let elapsed = now - slot.start_time - slot.start_delay;
        if elapsed <= 0.0 {
            continue;
        }
        let t = if slot.duration <= 0.0 {
            1.0
        } else {
            (elapsed / slot.duration).clamp(0.0, 1.0)
        };

        let alpha = lerp_u8(slot.initial_alpha, slot.target_alpha, t as f32);
        if slot.cell.x < raster.width() && slot.cell.y < raster.height() {
            raster.set(slot.cell, alpha);
            wrote = true;
        }

        if t >= 1.0 {
            if slot.restore_pending() {
                slot.arm_restore(now);
            } else {
                pool.release(i);
            }
        }
    }
    wrote
}

#[cfg(test)]
#[path = "../../tests/unit/transition/scheduler.rs"]
mod tests;
