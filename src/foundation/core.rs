use crate::foundation::error::{FogError, FogResult};

pub use kurbo::{Point, Vec2};

/// World-space position or extent. Only `x` and `z` address the mask; `y` is carried for callers
/// that hand over full 3D positions.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Vec3 {
    /// World X.
    pub x: f64,
    /// World Y (vertical, ignored by the mask).
    pub y: f64,
    /// World Z.
    pub z: f64,
}

impl Vec3 {
    /// Build a vector from components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Build a ground-plane position (`y = 0`).
    pub const fn xz(x: f64, z: f64) -> Self {
        Self { x, y: 0.0, z }
    }

    /// Project onto the XZ plane as a 2D point (`z` becomes `y`).
    pub fn to_point(self) -> Point {
        Point::new(self.x, self.z)
    }

    /// Lift a ground-plane point back into world space at height `y`.
    pub fn from_point(p: Point, y: f64) -> Self {
        Self { x: p.x, y, z: p.y }
    }

    pub(crate) fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl std::ops::Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::ops::Mul<f64> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f64) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Axis-aligned world box described by its centre and half-extents.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bounds {
    /// Box centre.
    pub center: Vec3,
    /// Half-size along each axis (non-negative).
    pub extents: Vec3,
}

impl Bounds {
    /// Build bounds from a centre and half-extents.
    pub fn new(center: Vec3, extents: Vec3) -> FogResult<Self> {
        if !center.is_finite() || !extents.is_finite() {
            return Err(FogError::validation("bounds must be finite"));
        }
        if extents.x < 0.0 || extents.y < 0.0 || extents.z < 0.0 {
            return Err(FogError::validation("bounds extents must be >= 0"));
        }
        Ok(Self { center, extents })
    }

    /// Build bounds from a centre and full size.
    pub fn from_center_size(center: Vec3, size: Vec3) -> FogResult<Self> {
        Self::new(center, size * 0.5)
    }

    /// Smallest bounds enclosing every point, or `None` for an empty set.
    pub fn enclosing(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut it = points.into_iter();
        let first = it.next()?;
        let (mut lo, mut hi) = (first, first);
        for p in it {
            lo = Vec3::new(lo.x.min(p.x), lo.y.min(p.y), lo.z.min(p.z));
            hi = Vec3::new(hi.x.max(p.x), hi.y.max(p.y), hi.z.max(p.z));
        }
        Some(Self {
            center: (lo + hi) * 0.5,
            extents: (hi - lo) * 0.5,
        })
    }

    /// Minimum corner.
    pub fn min(self) -> Vec3 {
        self.center - self.extents
    }

    /// Maximum corner.
    pub fn max(self) -> Vec3 {
        self.center + self.extents
    }

    /// Full size (twice the extents).
    pub fn size(self) -> Vec3 {
        self.extents * 2.0
    }
}

/// Integer raster cell address. `x` is the column, `y` the row (world Z).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    /// Column index.
    pub x: u32,
    /// Row index.
    pub y: u32,
}

impl Cell {
    /// Build a cell address.
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}
