//! Open-addressing slot table with linear probing
//!
//! Every walk starts at the key's home slot and advances by one cell (mod
//! capacity). A walk ends on a matching key, on an empty cell, or when it
//! comes back around to its start index. The last case is the only
//! exhaustion signal; the table never grows.

use super::arena::RecordArena;
use super::hash::char_sum_hash;
use super::record::RecordId;
use std::num::NonZeroUsize;

/// Result of a probe walk
///
/// `probes` counts the occupied, non-matching cells stepped past before the
/// walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// The key lives at `slot`
    Found {
        slot: usize,
        id: RecordId,
        probes: usize,
    },
    /// The key is absent and `slot` is the first empty cell on its chain
    Vacant { slot: usize, probes: usize },
    /// Full revolution over occupied, non-matching cells
    Exhausted { probes: usize },
}

impl Probe {
    pub fn probes(&self) -> usize {
        match *self {
            Probe::Found { probes, .. }
            | Probe::Vacant { probes, .. }
            | Probe::Exhausted { probes } => probes,
        }
    }

    /// Slot the walk stopped at, if any
    pub fn slot(&self) -> Option<usize> {
        match *self {
            Probe::Found { slot, .. } | Probe::Vacant { slot, .. } => Some(slot),
            Probe::Exhausted { .. } => None,
        }
    }
}

/// Fixed-size array of cells addressed by [`char_sum_hash`]
#[derive(Debug)]
pub struct SlotTable {
    slots: Vec<Option<RecordId>>,
}

impl SlotTable {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            slots: vec![None; capacity.get()],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Home slot for `key`
    pub fn home(&self, key: &str) -> usize {
        char_sum_hash(key, self.capacity())
    }

    fn next(&self, slot: usize) -> usize {
        (slot + 1) % self.capacity()
    }

    /// Walk the probe chain for `key`, resolving occupants through `arena`
    pub fn probe(&self, key: &str, arena: &RecordArena) -> Probe {
        let start = self.home(key);
        let mut current = start;
        let mut probes = 0;

        loop {
            match self.slots[current] {
                None => return Probe::Vacant { slot: current, probes },
                Some(id) if arena.key(id) == Some(key) => {
                    return Probe::Found {
                        slot: current,
                        id,
                        probes,
                    }
                }
                Some(_) => {
                    probes += 1;
                    current = self.next(current);
                    if current == start {
                        return Probe::Exhausted { probes };
                    }
                }
            }
        }
    }

    pub fn get(&self, slot: usize) -> Option<RecordId> {
        self.slots.get(slot).copied().flatten()
    }

    /// Place a handle into an empty cell
    pub fn occupy(&mut self, slot: usize, id: RecordId) {
        debug_assert!(self.slots[slot].is_none(), "slot {} already occupied", slot);
        self.slots[slot] = Some(id);
    }

    /// Clear a cell, returning its previous occupant
    pub fn vacate(&mut self, slot: usize) -> Option<RecordId> {
        self.slots.get_mut(slot).and_then(Option::take)
    }

    /// Clear and collect the run of occupied cells following `slot`
    ///
    /// Stops at the first empty cell or when the walk returns to `slot`.
    /// Handles are returned in walk order.
    pub fn drain_cluster_after(&mut self, slot: usize) -> Vec<RecordId> {
        let mut cluster = Vec::new();
        let mut current = self.next(slot);

        while current != slot {
            match self.slots[current].take() {
                Some(id) => cluster.push(id),
                None => break,
            }
            current = self.next(current);
        }

        cluster
    }

    /// Number of occupied cells
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|cell| cell.is_some()).count()
    }

    /// Iterate over occupied cells as `(slot, id)`
    pub fn iter(&self) -> impl Iterator<Item = (usize, RecordId)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, cell)| cell.map(|id| (slot, id)))
    }

    /// Length of the longest run of occupied cells, wrapping around the end
    pub fn longest_cluster(&self) -> usize {
        let capacity = self.capacity();
        let Some(empty) = self.slots.iter().position(Option::is_none) else {
            return capacity;
        };

        let mut longest = 0;
        let mut run = 0;
        for step in 1..=capacity {
            if self.slots[(empty + step) % capacity].is_some() {
                run += 1;
                longest = longest.max(run);
            } else {
                run = 0;
            }
        }
        longest
    }
}
