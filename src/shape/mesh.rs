use kurbo::Point;

use crate::foundation::core::{Bounds, Cell, Vec3};
use crate::foundation::error::{FogError, FogResult};
use crate::raster::mask::RasterGrid;
use crate::shape::window;

/// World-space triangle list used as a binary paint footprint.
///
/// Only the XZ projection matters; triangles may overlap and need not form a closed surface.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MeshFootprint {
    /// World-space vertex positions.
    pub vertices: Vec<Vec3>,
    /// Triangle list, three vertex indices per triangle.
    pub indices: Vec<u32>,
}

impl MeshFootprint {
    /// Wrap world-space geometry. Geometry is checked when painting, see [`Self::validate`].
    pub fn new(vertices: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Transform local vertices into world space (yaw about +Y, uniform scale, then translation).
    pub fn from_local(
        vertices: &[Vec3],
        indices: Vec<u32>,
        position: Vec3,
        yaw: f64,
        scale: f64,
    ) -> Self {
        let (s, c) = yaw.sin_cos();
        let vertices = vertices
            .iter()
            .map(|v| {
                let (x, z) = (v.x * scale, v.z * scale);
                Vec3::new(
                    x * c - z * s + position.x,
                    v.y * scale + position.y,
                    x * s + z * c + position.z,
                )
            })
            .collect();
        Self { vertices, indices }
    }

    /// Check that the mesh is a non-empty triangle list with in-range indices.
    pub fn validate(&self) -> FogResult<()> {
        if self.vertices.is_empty() {
            return Err(FogError::missing_geometry("mesh footprint has no vertices"));
        }
        if self.indices.is_empty() {
            return Err(FogError::missing_geometry("mesh footprint has no triangles"));
        }
        if self.indices.len() % 3 != 0 {
            return Err(FogError::missing_geometry(format!(
                "mesh footprint must use triangle topology, index count {} is not a multiple of 3",
                self.indices.len()
            )));
        }
        if let Some(&bad) = self
            .indices
            .iter()
            .find(|&&i| i as usize >= self.vertices.len())
        {
            return Err(FogError::missing_geometry(format!(
                "mesh footprint index {bad} out of range for {} vertices",
                self.vertices.len()
            )));
        }
        if self.vertices.iter().any(|v| !v.is_finite()) {
            return Err(FogError::validation("mesh footprint vertices must be finite"));
        }
        Ok(())
    }

    /// World bounds of the referenced vertices.
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::enclosing(
            self.indices
                .iter()
                .filter_map(|&i| self.vertices.get(i as usize).copied()),
        )
    }

    fn triangles(&self) -> Vec<[Point; 3]> {
        self.indices
            .chunks_exact(3)
            .map(|t| {
                [
                    self.vertices[t[0] as usize].to_point(),
                    self.vertices[t[1] as usize].to_point(),
                    self.vertices[t[2] as usize].to_point(),
                ]
            })
            .collect()
    }
}

fn edge_sign(p1: Point, p2: Point, p3: Point) -> f64 {
    (p1.x - p3.x) * (p2.y - p3.y) - (p2.x - p3.x) * (p1.y - p3.y)
}

/// Sign-based half-plane test. Points on an edge and degenerate triangles count as inside.
pub(crate) fn point_in_triangle(p: Point, tri: &[Point; 3]) -> bool {
    let d1 = edge_sign(p, tri[0], tri[1]);
    let d2 = edge_sign(p, tri[1], tri[2]);
    let d3 = edge_sign(p, tri[2], tri[0]);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

/// Visit every cell whose centre lies in at least one triangle. Retention is always 0.
///
/// Neighbouring cells usually hit the same triangle, so each search starts from the last hit.
pub(crate) fn rasterize(
    grid: &RasterGrid,
    mesh: &MeshFootprint,
    visit: &mut dyn FnMut(Cell, f32),
) -> bool {
    let Some(bounds) = mesh.bounds() else {
        return false;
    };
    let Some(anchor) = grid.world_to_cell(bounds.center) else {
        return false;
    };
    let triangles = mesh.triangles();
    if triangles.is_empty() {
        return true;
    }

    let delta_x = grid.cells_x(bounds.extents.x);
    let delta_z = grid.cells_z(bounds.extents.z);
    let mut last_hit = 0usize;

    for r in window(anchor.y, delta_z, grid.height) {
        for c in window(anchor.x, delta_x, grid.width) {
            let cell = Cell::new(c, r);
            let p = grid.cell_center(cell).to_point();
            let n = triangles.len();
            let hit = (0..n)
                .map(|k| (last_hit + k) % n)
                .find(|&i| point_in_triangle(p, &triangles[i]));
            if let Some(i) = hit {
                last_hit = i;
                visit(cell, 0.0);
            }
        }
    }
    true
}

#[cfg(test)]
#[path = "../../tests/unit/shape/mesh.rs"]
mod tests;
