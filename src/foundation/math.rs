use crate::foundation::core::Cell;

/// Fully opaque fog, the resting value of every cell.
pub(crate) const OPAQUE: u8 = 255;

/// Row stride of the cell key space. Rasters wider than this would alias keys.
pub(crate) const CELL_KEY_STRIDE: u32 = 64_000;

/// Added to user smoothness so that a zero smoothness still yields a finite falloff band.
pub(crate) const SMOOTHNESS_EPSILON: f32 = 0.0001;

pub(crate) fn cell_key(cell: Cell) -> u32 {
    cell.y * CELL_KEY_STRIDE + cell.x
}

/// Convert a normalized alpha to a byte. Truncates like the renderer's 8-bit channel.
pub(crate) fn alpha_to_u8(alpha: f32) -> u8 {
    if !alpha.is_finite() {
        return OPAQUE;
    }
    (alpha.clamp(0.0, 1.0) * 255.0) as u8
}

pub(crate) fn alpha_from_u8(v: u8) -> f32 {
    f32::from(v) / 255.0
}

/// `from + (to - from) * t`, truncated toward zero and kept in byte range.
pub(crate) fn lerp_u8(from: u8, to: u8, t: f32) -> u8 {
    let from_f = f32::from(from);
    let v = from_f + (f32::from(to) - from_f) * t;
    (v as i32).clamp(0, 255) as u8
}

/// Falloff retention for a normalized interior distance: 0 means the new alpha applies fully,
/// 1 means the existing alpha is kept.
pub(crate) fn retention(normalized: f32) -> f32 {
    if normalized.is_nan() {
        return 0.0;
    }
    (1.0 - normalized).clamp(0.0, 1.0)
}
