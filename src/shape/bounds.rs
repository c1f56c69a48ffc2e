use crate::foundation::core::{Bounds, Cell};
use crate::foundation::math::{SMOOTHNESS_EPSILON, retention};
use crate::raster::mask::RasterGrid;
use crate::shape::convex::ConvexShape;
use crate::shape::window;

/// Normalized interior distance along one axis, aspect-corrected. A collapsed axis (zero cells)
/// imposes no constraint.
fn axis_falloff(delta_sq: i64, d_sq: i64, aspect: f32, sm: f32) -> f32 {
    if delta_sq == 0 {
        return f32::INFINITY;
    }
    (delta_sq - d_sq) as f32 * aspect / (delta_sq as f32 * sm)
}

/// Visit the cells of an axis-aligned box, optionally keeping only cells whose centre lies inside
/// `refine`.
///
/// The X and Z falloffs are computed independently and the stricter (smaller) one wins, so the
/// edge band follows whichever side is closer.
pub(crate) fn rasterize(
    grid: &RasterGrid,
    bounds: Bounds,
    smoothness: f32,
    refine: Option<&dyn ConvexShape>,
    visit: &mut dyn FnMut(Cell, f32),
) -> bool {
    let Some(anchor) = grid.world_to_cell(bounds.center) else {
        return false;
    };

    let size = grid.placement.size;
    let trx = bounds.extents.x / size.x;
    let trz = bounds.extents.z / size.z;
    let (aspect_z, aspect_x) = if trx <= 0.0 || trz <= 0.0 {
        (1.0, 1.0)
    } else if trx > trz {
        (1.0, (trx / trz) as f32)
    } else {
        ((trz / trx) as f32, 1.0)
    };

    let delta_x = grid.cells_x(bounds.extents.x);
    let delta_z = grid.cells_z(bounds.extents.z);
    let delta_x_sq = delta_x * delta_x;
    let delta_z_sq = delta_z * delta_z;
    let sm = SMOOTHNESS_EPSILON + smoothness.max(0.0);

    for r in window(anchor.y, delta_z, grid.height) {
        let dr = i64::from(anchor.y) - i64::from(r);
        let t_z = axis_falloff(delta_z_sq, dr * dr, aspect_z, sm);
        for c in window(anchor.x, delta_x, grid.width) {
            let cell = Cell::new(c, r);
            if let Some(shape) = refine {
                let mut sample = grid.cell_center(cell);
                sample.y = bounds.center.y;
                if !shape.contains(sample) {
                    continue;
                }
            }
            let dc = i64::from(anchor.x) - i64::from(c);
            let t_x = axis_falloff(delta_x_sq, dc * dc, aspect_x, sm);
            visit(cell, retention(t_z.min(t_x)));
        }
    }
    true
}

#[cfg(test)]
#[path = "../../tests/unit/shape/bounds.rs"]
mod tests;
