use std::collections::HashMap;

use crate::foundation::core::Cell;
use crate::foundation::math::cell_key;

/// Default slot count, enough for a full 256x256 mask to animate at once.
pub const DEFAULT_POOL_CAPACITY: usize = 64_000;

/// One cell's animated opacity change. Times are in seconds on the engine clock.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Transition {
    /// Animated cell.
    pub cell: Cell,
    /// Clock time the transition was (re)armed.
    pub start_time: f64,
    /// Delay after `start_time` before interpolation begins.
    pub start_delay: f64,
    /// Interpolation length; `<= 0` jumps straight to the target.
    pub duration: f64,
    /// Opacity at the start of the interpolation.
    pub initial_alpha: u8,
    /// Opacity at the end of the interpolation.
    pub target_alpha: u8,
    /// Opacity the cell returns to once the restore phase runs.
    pub restore_to_alpha: u8,
    /// Wait before the restore phase starts; 0 disables the restore.
    pub restore_delay: f64,
    /// Length of the restore interpolation.
    pub restore_duration: f64,
    /// Whether the slot is live.
    pub enabled: bool,
}

impl Transition {
    pub(crate) fn restore_pending(&self) -> bool {
        self.restore_delay > 0.0 && self.target_alpha != self.restore_to_alpha
    }

    /// Re-arm this slot as its own restore phase.
    pub(crate) fn arm_restore(&mut self, now: f64) {
        self.initial_alpha = self.target_alpha;
        self.target_alpha = self.restore_to_alpha;
        self.start_time = now;
        self.start_delay = self.restore_delay;
        self.duration = self.restore_duration;
        self.restore_delay = 0.0;
        self.restore_duration = 0.0;
    }
}

/// Parameters of a transition to schedule for one cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransitionRequest {
    /// Target cell.
    pub cell: Cell,
    /// Opacity at the start of the interpolation.
    pub initial_alpha: u8,
    /// Opacity at the end of the interpolation.
    pub target_alpha: u8,
    /// Delay before interpolation begins.
    pub start_delay: f64,
    /// Interpolation length.
    pub duration: f64,
    /// Opacity to return to after the restore delay.
    pub restore_to_alpha: u8,
    /// Wait before restoring; 0 keeps the change.
    pub restore_delay: f64,
    /// Length of the restore interpolation.
    pub restore_duration: f64,
}

/// Result of [`TransitionPool::schedule`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// A free slot was claimed.
    Started,
    /// The cell's live transition was overwritten in place.
    Replaced,
    /// The cell already animates toward an equal or lower target with the same restore.
    Coalesced,
    /// No free slot was left; the request was dropped.
    Dropped,
}

/// Counters describing pool usage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Slot count.
    pub capacity: usize,
    /// Currently enabled slots.
    pub live: usize,
    /// Highest slot index ever claimed since the last reset.
    pub high_water: Option<usize>,
    /// Requests dropped because the pool was exhausted.
    pub dropped: u64,
    /// Requests merged into an in-flight transition.
    pub coalesced: u64,
}

/// Fixed-capacity transition storage with a LIFO free list and a cell index.
///
/// At most one live transition exists per cell. Exhaustion never grows memory: new requests for
/// cells without a live slot are dropped.
pub struct TransitionPool {
    slots: Vec<Transition>,
    free: Vec<u32>,
    by_cell: HashMap<u32, u32>,
    high_water: Option<usize>,
    dropped: u64,
    coalesced: u64,
}

impl TransitionPool {
    /// Allocate `capacity` disabled slots.
    pub fn new(capacity: usize) -> Self {
        let mut pool = Self {
            slots: vec![Transition::default(); capacity],
            free: Vec::with_capacity(capacity),
            by_cell: HashMap::with_capacity(capacity.min(4096)),
            high_water: None,
            dropped: 0,
            coalesced: 0,
        };
        pool.reset();
        pool
    }

    /// Disable every slot and rebuild the free list so that index 0 is handed out first.
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.enabled = false;
        }
        self.free.clear();
        self.free.extend((0..self.slots.len() as u32).rev());
        self.by_cell.clear();
        self.high_water = None;
    }

    /// Slot count.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of enabled slots.
    pub fn live(&self) -> usize {
        self.by_cell.len()
    }

    /// Usage counters.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            capacity: self.capacity(),
            live: self.live(),
            high_water: self.high_water,
            dropped: self.dropped,
            coalesced: self.coalesced,
        }
    }

    /// Live transition animating `cell`, if any.
    pub fn get(&self, cell: Cell) -> Option<&Transition> {
        let &i = self.by_cell.get(&cell_key(cell))?;
        Some(&self.slots[i as usize]).filter(|t| t.enabled)
    }

    /// Iterate over enabled slots.
    pub fn iter_live(&self) -> impl Iterator<Item = &Transition> {
        self.scan_range()
            .map(|i| &self.slots[i])
            .filter(|t| t.enabled)
    }

    /// Schedule (or coalesce) a transition for `req.cell` starting at `now`.
    pub fn schedule(&mut self, req: TransitionRequest, now: f64) -> ScheduleOutcome {
        let key = cell_key(req.cell);
        let existing = self
            .by_cell
            .get(&key)
            .copied()
            .filter(|&i| {
                let slot = &self.slots[i as usize];
                slot.enabled && slot.cell == req.cell
            });

        let (index, outcome) = match existing {
            Some(i) => {
                let slot = &self.slots[i as usize];
                if slot.target_alpha <= req.target_alpha
                    && slot.restore_to_alpha == req.restore_to_alpha
                    && slot.restore_delay == req.restore_delay
                    && slot.restore_duration == req.restore_duration
                {
                    self.coalesced = self.coalesced.saturating_add(1);
                    return ScheduleOutcome::Coalesced;
                }
                (i, ScheduleOutcome::Replaced)
            }
            None => {
                let Some(i) = self.free.pop() else {
                    self.dropped = self.dropped.saturating_add(1);
                    tracing::trace!(x = req.cell.x, y = req.cell.y, "transition pool exhausted");
                    return ScheduleOutcome::Dropped;
                };
                self.by_cell.insert(key, i);
                let i_usize = i as usize;
                if self.high_water.is_none_or(|hw| i_usize > hw) {
                    self.high_water = Some(i_usize);
                }
                (i, ScheduleOutcome::Started)
            }
        };

        self.slots[index as usize] = Transition {
            cell: req.cell,
            start_time: now,
            start_delay: req.start_delay,
            duration: req.duration,
            initial_alpha: req.initial_alpha,
            target_alpha: req.target_alpha,
            restore_to_alpha: req.restore_to_alpha,
            restore_delay: req.restore_delay,
            restore_duration: req.restore_duration,
            enabled: true,
        };
        outcome
    }

    /// Slot indices the scheduler must visit: everything up to the high-water mark.
    pub(crate) fn scan_range(&self) -> std::ops::Range<usize> {
        0..self.high_water.map_or(0, |hw| hw + 1)
    }

    pub(crate) fn slot_mut(&mut self, index: usize) -> &mut Transition {
        &mut self.slots[index]
    }

    /// Disable a slot and return it to the free list.
    pub(crate) fn release(&mut self, index: usize) {
        let slot = &mut self.slots[index];
        if !slot.enabled {
            return;
        }
        slot.enabled = false;
        let key = cell_key(slot.cell);
        if self.by_cell.get(&key) == Some(&(index as u32)) {
            self.by_cell.remove(&key);
        }
        self.free.push(index as u32);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/transition/pool.rs"]
mod tests;
