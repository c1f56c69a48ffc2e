//! Engine façade and its deferred-paint worker.
//!
//! All mask state lives behind one `parking_lot::Mutex`. Immediate paints take the lock on the
//! caller's thread; deferred paints are queued to a single worker thread that takes the same lock
//! per job. `is_busy` reports queued or running jobs; a tick only holds its upload back while the
//! worker is applying a job, so the dirty mask goes out on the next tick after it.

/// `FogOfWar` handle and locked state.
pub mod fog;
/// Single-worker paint queue.
pub(crate) mod worker;
