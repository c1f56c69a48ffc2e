//! The opacity raster and its world placement.

/// Dense opacity grid, coordinate mapping and snapshots.
pub mod mask;
