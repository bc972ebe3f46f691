//! Record arena owning every live record

use super::record::{Record, RecordId};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Owns live records by value and hands out stable [`RecordId`]s
///
/// Uses a min-heap of freed ids so the lowest free entry is reused first.
#[derive(Debug, Default)]
pub struct RecordArena {
    entries: Vec<Option<Record>>,
    free_ids: BinaryHeap<Reverse<u32>>,
    live: usize,
}

impl RecordArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an arena with room for `capacity` records
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            free_ids: BinaryHeap::new(),
            live: 0,
        }
    }

    /// Store a record and return its handle
    pub fn allocate(&mut self, record: Record) -> RecordId {
        self.live += 1;

        // Try to reuse a freed entry first
        if let Some(Reverse(index)) = self.free_ids.pop() {
            self.entries[index as usize] = Some(record);
            return RecordId::new(index);
        }

        let index = self.entries.len() as u32;
        self.entries.push(Some(record));
        RecordId::new(index)
    }

    /// Remove a record, returning it if the handle was live
    pub fn free(&mut self, id: RecordId) -> Option<Record> {
        let record = self.entries.get_mut(id.index())?.take()?;
        self.free_ids.push(Reverse(id.index() as u32));
        self.live -= 1;
        Some(record)
    }

    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.entries.get(id.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: RecordId) -> Option<&mut Record> {
        self.entries.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Key of a live record
    pub fn key(&self, id: RecordId) -> Option<&str> {
        self.get(id).map(|record| record.key.as_str())
    }

    /// Number of live records
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Iterate over live records with their handles
    pub fn iter(&self) -> impl Iterator<Item = (RecordId, &Record)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                entry
                    .as_ref()
                    .map(|record| (RecordId::new(index as u32), record))
            })
    }
}
