use crate::foundation::core::{Cell, Vec3};
use crate::foundation::math::{SMOOTHNESS_EPSILON, retention};
use crate::raster::mask::RasterGrid;
use crate::shape::window;

/// Visit the cells of a disc.
///
/// The radius is normalized by the world Z size and scaled by the raster height for both axes, so
/// on non-square rasters (or non-square world rectangles) the disc is sized from the Z axis alone.
pub(crate) fn rasterize(
    grid: &RasterGrid,
    center: Vec3,
    radius: f64,
    smoothness: f32,
    visit: &mut dyn FnMut(Cell, f32),
) -> bool {
    let Some(anchor) = grid.world_to_cell(center) else {
        return false;
    };

    let delta = grid.cells_z(radius);
    let delta_sq = delta * delta;
    let sm = SMOOTHNESS_EPSILON + smoothness.max(0.0);

    for r in window(anchor.y, delta, grid.height) {
        let dr = i64::from(anchor.y) - i64::from(r);
        let dr_sq = dr * dr;
        for c in window(anchor.x, delta, grid.width) {
            let dc = i64::from(anchor.x) - i64::from(c);
            let d_sq = dr_sq + dc * dc;
            if d_sq > delta_sq {
                continue;
            }
            let keep = if delta_sq == 0 {
                0.0
            } else {
                retention((delta_sq - d_sq) as f32 / (delta_sq as f32 * sm))
            };
            visit(Cell::new(c, r), keep);
        }
    }
    true
}

#[cfg(test)]
#[path = "../../tests/unit/shape/circle.rs"]
mod tests;
