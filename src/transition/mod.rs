//! Per-cell opacity animation: bounded slot pool plus the tick step that drives it.

/// Fixed-capacity transition storage with per-cell coalescing.
pub mod pool;
/// Tick step advancing live transitions and re-arming restores.
pub mod scheduler;
