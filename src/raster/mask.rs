use crate::foundation::core::{Cell, Vec3};
use crate::foundation::error::{FogError, FogResult};
use crate::foundation::math::{OPAQUE, alpha_from_u8};

/// Upper bound on either raster dimension.
pub(crate) const MAX_DIMENSION: u32 = 8192;

/// Largest half-extent in cells a footprint may span. Far beyond any raster, small enough that
/// squares and window bounds stay within `i64`.
const MAX_CELL_SPAN: i64 = 1 << 24;

fn clamp_span(cells: f64) -> i64 {
    (cells as i64).clamp(-MAX_CELL_SPAN, MAX_CELL_SPAN)
}

/// Round a requested dimension down to a multiple of 4 (minimum 4), matching texture row alignment.
pub(crate) fn aligned_dimension(v: u32) -> u32 {
    (v / 4).max(1) * 4
}

/// World placement of the mask rectangle.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Placement {
    /// Centre of the covered rectangle (relative to `anchor` when `is_local`).
    pub center: Vec3,
    /// Full size of the covered rectangle; `x` and `z` must be > 0.
    pub size: Vec3,
    /// When set, `center` is an offset from `anchor` (the owning volume's position).
    pub is_local: bool,
    /// Owner position used by local placement.
    pub anchor: Vec3,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            center: Vec3::default(),
            size: Vec3::new(1024.0, 0.0, 1024.0),
            is_local: false,
            anchor: Vec3::default(),
        }
    }
}

impl Placement {
    /// Validate the covered rectangle.
    pub fn validate(&self) -> FogResult<()> {
        if !self.center.is_finite() || !self.size.is_finite() || !self.anchor.is_finite() {
            return Err(FogError::validation("placement must be finite"));
        }
        if self.size.x <= 0.0 || self.size.z <= 0.0 {
            return Err(FogError::validation("placement size.x and size.z must be > 0"));
        }
        Ok(())
    }

    /// Centre actually used for mapping, after local anchoring.
    pub fn effective_center(&self) -> Vec3 {
        if self.is_local {
            self.anchor + self.center
        } else {
            self.center
        }
    }

    /// Map a world position into `[0,1]²` rectangle space, or `None` when outside.
    pub fn normalize(&self, pos: Vec3) -> Option<(f64, f64)> {
        let c = self.effective_center();
        let tx = (pos.x - c.x) / self.size.x + 0.5;
        if !(0.0..=1.0).contains(&tx) {
            return None;
        }
        let tz = (pos.z - c.z) / self.size.z + 0.5;
        if !(0.0..=1.0).contains(&tz) {
            return None;
        }
        Some((tx, tz))
    }
}

/// Serialized mask layout: dimensions followed by the raw opacity bytes.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MaskSnapshot {
    /// Raster width in cells.
    pub width: u32,
    /// Raster height in cells.
    pub height: u32,
    /// Row-major opacity bytes, `width * height` long. 255 is fully opaque fog.
    pub opacity: Vec<u8>,
}

impl MaskSnapshot {
    /// Check that the byte array matches the dimensions.
    pub fn validate(&self) -> FogResult<()> {
        let expected = (self.width as usize)
            .checked_mul(self.height as usize)
            .ok_or_else(|| FogError::validation("snapshot size overflow"))?;
        if self.width == 0 || self.height == 0 {
            return Err(FogError::validation("snapshot dimensions must be > 0"));
        }
        if self.opacity.len() != expected {
            return Err(FogError::validation(format!(
                "snapshot expects {expected} opacity bytes, got {}",
                self.opacity.len()
            )));
        }
        Ok(())
    }
}

/// Cell-space geometry of a raster: dimensions plus world placement.
///
/// Shape rasterizers work against this copyable view so they can run while the cells are being
/// written.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RasterGrid {
    /// Width in cells.
    pub width: u32,
    /// Height in cells.
    pub height: u32,
    /// World placement.
    pub placement: Placement,
}

impl RasterGrid {
    /// Cell containing a world position, or `None` when it lies outside the rectangle.
    pub fn world_to_cell(&self, pos: Vec3) -> Option<Cell> {
        let (tx, tz) = self.placement.normalize(pos)?;
        Some(Cell::new(
            Self::scale(tx, self.width),
            Self::scale(tz, self.height),
        ))
    }

    fn scale(t: f64, dim: u32) -> u32 {
        ((t * f64::from(dim)) as u32).min(dim - 1)
    }

    /// World position of a cell centre (`y = 0`).
    pub fn cell_center(&self, cell: Cell) -> Vec3 {
        let c = self.placement.effective_center();
        let size = self.placement.size;
        let wx = ((f64::from(cell.x) + 0.5) / f64::from(self.width) - 0.5) * size.x + c.x;
        let wz = ((f64::from(cell.y) + 0.5) / f64::from(self.height) - 0.5) * size.z + c.z;
        Vec3::xz(wx, wz)
    }

    /// Half-extent in whole cells of a world distance along X.
    pub(crate) fn cells_x(&self, world: f64) -> i64 {
        clamp_span(f64::from(self.width) * (world / self.placement.size.x))
    }

    /// Half-extent in whole cells of a world distance along Z.
    pub(crate) fn cells_z(&self, world: f64) -> i64 {
        clamp_span(f64::from(self.height) * (world / self.placement.size.z))
    }
}

/// Dense opacity grid mapped onto a world rectangle.
#[derive(Clone, Debug)]
pub struct MaskRaster {
    grid: RasterGrid,
    cells: Vec<u8>,
}

impl MaskRaster {
    /// Allocate a fully opaque raster.
    pub fn new(width: u32, height: u32, placement: Placement) -> FogResult<Self> {
        placement.validate()?;
        let mut raster = Self {
            grid: RasterGrid {
                width: 0,
                height: 0,
                placement,
            },
            cells: Vec::new(),
        };
        raster.resize(width, height)?;
        Ok(raster)
    }

    /// Reallocate to `width * height` opaque cells.
    pub fn resize(&mut self, width: u32, height: u32) -> FogResult<()> {
        if width == 0 || height == 0 {
            return Err(FogError::validation("raster dimensions must be > 0"));
        }
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(FogError::validation(format!(
                "raster dimensions must be <= {MAX_DIMENSION}"
            )));
        }
        self.grid.width = width;
        self.grid.height = height;
        self.cells.clear();
        self.cells.resize(width as usize * height as usize, OPAQUE);
        Ok(())
    }

    /// Raster width in cells.
    pub fn width(&self) -> u32 {
        self.grid.width
    }

    /// Raster height in cells.
    pub fn height(&self) -> u32 {
        self.grid.height
    }

    /// Copyable geometry view.
    pub fn grid(&self) -> RasterGrid {
        self.grid
    }

    /// Current world placement.
    pub fn placement(&self) -> &Placement {
        &self.grid.placement
    }

    /// Replace the world placement.
    pub fn set_placement(&mut self, placement: Placement) -> FogResult<()> {
        placement.validate()?;
        self.grid.placement = placement;
        Ok(())
    }

    pub(crate) fn set_anchor(&mut self, anchor: Vec3) {
        self.grid.placement.anchor = anchor;
    }

    /// Cell containing a world position, or `None` when it lies outside the rectangle.
    pub fn world_to_cell(&self, pos: Vec3) -> Option<Cell> {
        self.grid.world_to_cell(pos)
    }

    /// World position of a cell centre (`y = 0`).
    pub fn cell_center(&self, cell: Cell) -> Vec3 {
        self.grid.cell_center(cell)
    }

    fn index(&self, cell: Cell) -> usize {
        cell.y as usize * self.grid.width as usize + cell.x as usize
    }

    /// Opacity byte of a cell, `None` outside the raster.
    pub fn cell(&self, cell: Cell) -> Option<u8> {
        if cell.x >= self.grid.width || cell.y >= self.grid.height {
            return None;
        }
        Some(self.get(cell))
    }

    /// Callers keep `cell` inside the raster.
    pub(crate) fn get(&self, cell: Cell) -> u8 {
        self.cells[self.index(cell)]
    }

    pub(crate) fn set(&mut self, cell: Cell, value: u8) {
        let i = self.index(cell);
        self.cells[i] = value;
    }

    /// Normalized opacity at a world position; 1.0 outside the rectangle.
    pub fn alpha_at(&self, pos: Vec3) -> f32 {
        match self.world_to_cell(pos) {
            Some(cell) => alpha_from_u8(self.get(cell)),
            None => 1.0,
        }
    }

    /// Set every cell to `value`.
    pub fn set_all(&mut self, value: u8) {
        self.cells.fill(value);
    }

    /// Row-major opacity bytes.
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Capture dimensions and opacity bytes.
    pub fn snapshot(&self) -> MaskSnapshot {
        MaskSnapshot {
            width: self.width(),
            height: self.height(),
            opacity: self.cells.clone(),
        }
    }

    /// Replace dimensions and contents from a snapshot. Returns whether the dimensions changed.
    pub fn load(&mut self, snapshot: &MaskSnapshot) -> FogResult<bool> {
        snapshot.validate()?;
        let resized = snapshot.width != self.width() || snapshot.height != self.height();
        if resized {
            self.resize(snapshot.width, snapshot.height)?;
        }
        self.cells.copy_from_slice(&snapshot.opacity);
        Ok(resized)
    }

    /// Replace contents with a byte array of the current dimensions.
    pub fn copy_from(&mut self, opacity: &[u8]) -> FogResult<()> {
        if opacity.len() != self.cells.len() {
            return Err(FogError::validation(format!(
                "opacity buffer must be {} bytes ({}x{}), got {}",
                self.cells.len(),
                self.width(),
                self.height(),
                opacity.len()
            )));
        }
        self.cells.copy_from_slice(opacity);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/mask.rs"]
mod tests;
