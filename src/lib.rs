//! fogmask is a fog-of-war visibility mask engine.
//!
//! It keeps a per-cell opacity raster mapped onto a world-space rectangle and lets callers reveal
//! or conceal regions gradually, optionally restoring them after a delay. The public API is
//! engine-oriented:
//!
//! - Configure a [`FogOfWarOpts`] and create a [`FogOfWar`] around a [`MaskSink`]
//! - Paint [`Footprint`]s with [`FogOfWar::set_alpha`]
//! - Call [`FogOfWar::tick`] once per frame to animate and upload the mask
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Engine settings and JSON loading.
pub mod config;
pub mod engine;
/// Paint and reset algorithms over a raster and a transition pool.
pub mod paint;
pub mod raster;
/// Explicit registry of active fog engines.
pub mod registry;
pub mod shape;
pub mod transition;
pub mod upload;

pub use crate::foundation::core::{Bounds, Cell, Point, Vec2, Vec3};
pub use crate::foundation::error::{FogError, FogResult};

pub use crate::config::FogOfWarOpts;
pub use crate::engine::fog::FogOfWar;
pub use crate::paint::{PaintOpts, PaintReport, UpdateMode};
pub use crate::raster::mask::{MaskRaster, MaskSnapshot, Placement, RasterGrid};
pub use crate::registry::{FogRegistry, VolumeId};
pub use crate::shape::{ConvexPolygon, ConvexShape, Footprint, MeshFootprint, OrientedBox};
pub use crate::transition::pool::{
    PoolStats, ScheduleOutcome, Transition, TransitionPool, TransitionRequest,
};
pub use crate::upload::sink::{
    InMemoryMaskSink, MaskSink, MaskSource, MaskUpload, NullMaskSink, RecordedUpload,
    ShaderParams,
};
pub use crate::upload::sync::UploadStats;
