use std::fmt;

use kurbo::{Affine, Line, ParamCurve, ParamCurveNearest, Point, Vec2};

use crate::foundation::core::{Bounds, Vec3};
use crate::foundation::error::{FogError, FogResult};

/// Convex footprint queried through closest-point projection.
///
/// Implementations must return the query point unchanged (bit for bit on x and z) when it lies
/// inside the shape; the rasterizer relies on that equality for its containment test.
pub trait ConvexShape: Send + Sync + fmt::Debug {
    /// World-space axis-aligned bounds of the shape.
    fn bounds(&self) -> Bounds;

    /// Closest point of the shape to `p` on the ground plane; `y` is passed through.
    fn closest_point(&self, p: Vec3) -> Vec3;

    /// Whether `p` lies inside (or on) the shape.
    fn contains(&self, p: Vec3) -> bool {
        let q = self.closest_point(p);
        q.x == p.x && q.z == p.z
    }
}

/// Box rotated about the vertical axis.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OrientedBox {
    /// World centre.
    pub center: Vec3,
    /// Half-size along the box's local X and Z axes.
    pub half_extents: Vec2,
    /// Rotation about +Y in radians.
    pub yaw: f64,
}

impl OrientedBox {
    /// Build a box; half extents must be finite and non-negative.
    pub fn new(center: Vec3, half_extents: Vec2, yaw: f64) -> FogResult<Self> {
        if !center.is_finite() || !half_extents.is_finite() || !yaw.is_finite() {
            return Err(FogError::validation("oriented box must be finite"));
        }
        if half_extents.x < 0.0 || half_extents.y < 0.0 {
            return Err(FogError::validation("oriented box half extents must be >= 0"));
        }
        Ok(Self {
            center,
            half_extents,
            yaw,
        })
    }

    fn to_world(&self) -> Affine {
        Affine::translate(self.center.to_point().to_vec2()) * Affine::rotate(self.yaw)
    }
}

impl ConvexShape for OrientedBox {
    fn bounds(&self) -> Bounds {
        let (s, c) = self.yaw.sin_cos();
        let (hx, hz) = (self.half_extents.x, self.half_extents.y);
        Bounds {
            center: self.center,
            extents: Vec3::new(c.abs() * hx + s.abs() * hz, 0.0, s.abs() * hx + c.abs() * hz),
        }
    }

    fn closest_point(&self, p: Vec3) -> Vec3 {
        let xf = self.to_world();
        let local = xf.inverse() * p.to_point();
        let clamped = Point::new(
            local.x.clamp(-self.half_extents.x, self.half_extents.x),
            local.y.clamp(-self.half_extents.y, self.half_extents.y),
        );
        if clamped == local {
            return p;
        }
        Vec3::from_point(xf * clamped, p.y)
    }
}

/// Convex polygon on the ground plane, stored counter-clockwise.
#[derive(Clone, Debug, PartialEq)]
pub struct ConvexPolygon {
    points: Vec<Point>,
    y: f64,
}

impl ConvexPolygon {
    /// Build from a vertex ring on the XZ plane (`Point::y` is world Z) at height `y`.
    ///
    /// Either winding is accepted. Fewer than three vertices or zero area is reported as missing
    /// geometry; a concave ring is a validation error.
    pub fn new(points: Vec<Point>, y: f64) -> FogResult<Self> {
        if points.len() < 3 {
            return Err(FogError::missing_geometry(
                "convex polygon needs at least 3 vertices",
            ));
        }
        if points.iter().any(|p| !p.is_finite()) || !y.is_finite() {
            return Err(FogError::validation("convex polygon vertices must be finite"));
        }

        let mut points = points;
        let area = signed_area(&points);
        if area.abs() <= f64::EPSILON {
            return Err(FogError::missing_geometry("convex polygon has zero area"));
        }
        if area < 0.0 {
            points.reverse();
        }

        let n = points.len();
        for i in 0..n {
            let a = points[i];
            let b = points[(i + 1) % n];
            let c = points[(i + 2) % n];
            if (b - a).cross(c - b) < -1e-9 {
                return Err(FogError::validation("polygon is not convex"));
            }
        }
        Ok(Self { points, y })
    }

    /// Vertices in counter-clockwise order.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    fn edges(&self) -> impl Iterator<Item = Line> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| Line::new(self.points[i], self.points[(i + 1) % n]))
    }

    fn inside(&self, p: Point) -> bool {
        self.edges().all(|e| (e.p1 - e.p0).cross(p - e.p0) >= 0.0)
    }
}

fn signed_area(points: &[Point]) -> f64 {
    let n = points.len();
    let twice: f64 = (0..n)
        .map(|i| {
            let a = points[i].to_vec2();
            let b = points[(i + 1) % n].to_vec2();
            a.cross(b)
        })
        .sum();
    twice * 0.5
}

impl ConvexShape for ConvexPolygon {
    fn bounds(&self) -> Bounds {
        Bounds::enclosing(self.points.iter().map(|p| Vec3::from_point(*p, self.y)))
            .unwrap_or_default()
    }

    fn closest_point(&self, p: Vec3) -> Vec3 {
        let q = p.to_point();
        if self.inside(q) {
            return p;
        }
        let nearest = self
            .edges()
            .map(|e| {
                let n = e.nearest(q, 1e-9);
                (n.distance_sq, e.eval(n.t))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map_or(q, |(_, pt)| pt);
        Vec3::from_point(nearest, p.y)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/shape/convex.rs"]
mod tests;
