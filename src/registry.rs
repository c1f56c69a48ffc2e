use std::collections::BTreeMap;

use crate::engine::fog::FogOfWar;
use crate::foundation::core::Vec3;

/// Stable identifier handed out by [`FogRegistry::register`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VolumeId(u64);

impl VolumeId {
    /// Raw id value.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Explicit collection of active fog engines, owned by whoever drives the world.
///
/// Iteration follows registration order. `version` changes on every membership change so
/// dependents can cache derived state.
#[derive(Debug, Default)]
pub struct FogRegistry {
    volumes: BTreeMap<VolumeId, FogOfWar>,
    next_id: u64,
    version: u64,
}

impl FogRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an engine handle.
    pub fn register(&mut self, fog: FogOfWar) -> VolumeId {
        let id = VolumeId(self.next_id);
        self.next_id += 1;
        self.volumes.insert(id, fog);
        self.version += 1;
        tracing::debug!(id = id.0, "fog volume registered");
        id
    }

    /// Remove an engine handle, returning it if it was registered.
    pub fn unregister(&mut self, id: VolumeId) -> Option<FogOfWar> {
        let fog = self.volumes.remove(&id)?;
        self.version += 1;
        tracing::debug!(id = id.0, "fog volume unregistered");
        Some(fog)
    }

    /// Engine registered under `id`.
    pub fn get(&self, id: VolumeId) -> Option<&FogOfWar> {
        self.volumes.get(&id)
    }

    /// Registered engines in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (VolumeId, &FogOfWar)> {
        self.volumes.iter().map(|(&id, fog)| (id, fog))
    }

    /// Number of registered engines.
    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    /// Whether no engine is registered.
    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }

    /// Membership version.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Tick every engine to clock time `now`. Returns how many uploaded.
    pub fn tick_all(&self, now: f64) -> usize {
        self.volumes.values().filter(|fog| fog.tick(now)).count()
    }

    /// Lowest opacity any registered mask reports at `pos`; 1.0 when none covers it.
    pub fn alpha_at(&self, pos: Vec3) -> f32 {
        self.volumes
            .values()
            .map(|fog| fog.alpha_at(pos))
            .fold(1.0, f32::min)
    }
}

#[cfg(test)]
#[path = "../tests/unit/registry/registry.rs"]
mod tests;
