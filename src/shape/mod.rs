//! Shape rasterizers: turn a world-space footprint into affected cells with per-cell falloff.
//!
//! Every rasterizer reports cells through a visitor as `(cell, retention)`, where retention 0
//! means the new alpha applies fully and 1 means the existing alpha is kept. Only the shape's
//! reference point is checked against the mask rectangle; a shape whose reference point lies
//! outside is ignored even when it partially overlaps.

use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;

use crate::foundation::core::{Bounds, Cell, Vec3};
use crate::foundation::error::{FogError, FogResult};
use crate::raster::mask::RasterGrid;

/// Axis-aligned box footprint with per-axis falloff.
pub mod bounds;
/// Circular footprint.
pub mod circle;
/// Convex footprint refined by a closest-point containment test.
pub mod convex;
/// Triangle-mesh footprint with binary coverage.
pub mod mesh;

pub use convex::{ConvexPolygon, ConvexShape, OrientedBox};
pub use mesh::MeshFootprint;

/// How per-cell target alpha is derived from the visitor's retention value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Coverage {
    /// Blend toward the new alpha by `1 - retention`; cells that would stay fully opaque are skipped.
    Falloff,
    /// Set the new alpha exactly on every visited cell.
    Binary,
}

/// A world-space shape whose footprint can be painted onto the mask.
#[derive(Clone)]
pub enum Footprint {
    /// Disc around `center` (x/z used) with a world-space radius.
    Circle {
        /// Disc centre.
        center: Vec3,
        /// Radius in world units.
        radius: f64,
    },
    /// Axis-aligned box; extents on x and z drive the falloff.
    Bounds(Bounds),
    /// Any convex shape answering closest-point queries.
    Convex(Arc<dyn ConvexShape>),
    /// World-space triangle mesh, painted without falloff.
    Mesh(Arc<MeshFootprint>),
}

impl fmt::Debug for Footprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Circle { center, radius } => f
                .debug_struct("Circle")
                .field("center", center)
                .field("radius", radius)
                .finish(),
            Self::Bounds(b) => f.debug_tuple("Bounds").field(b).finish(),
            Self::Convex(s) => f.debug_tuple("Convex").field(&s.bounds()).finish(),
            Self::Mesh(m) => f
                .debug_struct("Mesh")
                .field("vertices", &m.vertices.len())
                .field("triangles", &(m.indices.len() / 3))
                .finish(),
        }
    }
}

impl Footprint {
    /// Disc footprint.
    pub fn circle(center: Vec3, radius: f64) -> Self {
        Self::Circle { center, radius }
    }

    /// Check that the footprint carries usable geometry.
    pub fn validate(&self) -> FogResult<()> {
        match self {
            Self::Circle { center, radius } => {
                if !center.is_finite() || !radius.is_finite() || *radius < 0.0 {
                    return Err(FogError::validation(
                        "circle footprint needs a finite centre and radius >= 0",
                    ));
                }
                Ok(())
            }
            Self::Bounds(b) => {
                if !b.center.is_finite() || !b.extents.is_finite() {
                    return Err(FogError::validation("bounds footprint must be finite"));
                }
                Ok(())
            }
            Self::Convex(shape) => {
                let b = shape.bounds();
                if !b.center.is_finite() || !b.extents.is_finite() {
                    return Err(FogError::missing_geometry(
                        "convex footprint reports non-finite bounds",
                    ));
                }
                Ok(())
            }
            Self::Mesh(mesh) => mesh.validate(),
        }
    }

    pub(crate) fn coverage(&self) -> Coverage {
        match self {
            Self::Mesh(_) => Coverage::Binary,
            _ => Coverage::Falloff,
        }
    }

    /// Visit affected cells. Returns `false` when the reference point lies outside the mask.
    pub(crate) fn rasterize(
        &self,
        grid: &RasterGrid,
        smoothness: f32,
        visit: &mut dyn FnMut(Cell, f32),
    ) -> bool {
        match self {
            Self::Circle { center, radius } => {
                circle::rasterize(grid, *center, *radius, smoothness, visit)
            }
            Self::Bounds(b) => bounds::rasterize(grid, *b, smoothness, None, visit),
            Self::Convex(shape) => {
                bounds::rasterize(grid, shape.bounds(), smoothness, Some(shape.as_ref()), visit)
            }
            Self::Mesh(mesh) => mesh::rasterize(grid, mesh, visit),
        }
    }
}

impl From<Bounds> for Footprint {
    fn from(b: Bounds) -> Self {
        Self::Bounds(b)
    }
}

impl From<MeshFootprint> for Footprint {
    fn from(m: MeshFootprint) -> Self {
        Self::Mesh(Arc::new(m))
    }
}

impl From<Arc<MeshFootprint>> for Footprint {
    fn from(m: Arc<MeshFootprint>) -> Self {
        Self::Mesh(m)
    }
}

impl From<OrientedBox> for Footprint {
    fn from(b: OrientedBox) -> Self {
        Self::Convex(Arc::new(b))
    }
}

impl From<ConvexPolygon> for Footprint {
    fn from(p: ConvexPolygon) -> Self {
        Self::Convex(Arc::new(p))
    }
}

impl From<Arc<dyn ConvexShape>> for Footprint {
    fn from(s: Arc<dyn ConvexShape>) -> Self {
        Self::Convex(s)
    }
}

/// Inclusive cell range `[p - delta, p + delta]` clipped to `[0, dim - 1]`.
pub(crate) fn window(p: u32, delta: i64, dim: u32) -> RangeInclusive<u32> {
    let p = i64::from(p);
    let lo = (p - delta).max(0);
    let hi = (p + delta).min(i64::from(dim) - 1);
    if lo > hi {
        // Empty range.
        return 1..=0;
    }
    lo as u32..=hi as u32
}

#[cfg(test)]
#[path = "../../tests/unit/shape/footprint.rs"]
mod tests;
