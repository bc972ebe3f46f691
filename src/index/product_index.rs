//! Product index combining the slot table and record sequence
//!
//! This is the integration layer that callers use. Every mutating operation
//! updates the arena, the slot table and the sequence within one call, and
//! every operation reports an [`IndexEvent`] to the configured observer.

use super::arena::RecordArena;
use super::record::{Record, RecordId};
use super::sequence::{RecordSequence, SortKey};
use super::slot_table::{Probe, SlotTable};
use crate::config::IndexConfig;
use crate::error::{Error, Result};
use crate::observe::{IndexEvent, IndexObserver, Operation, Outcome, TracingObserver};
use crate::sample;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::time::Instant;
use tracing::{error, info};

/// Successful result of [`ProductIndex::insert_or_update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Upsert {
    Inserted,
    Updated,
}

/// Occupancy figures for the slot table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexStats {
    pub capacity: usize,
    pub len: usize,
    pub load_factor: f64,
    /// Records sitting outside their home slot
    pub displaced: usize,
    pub longest_cluster: usize,
}

/// Fixed-capacity product index
///
/// Provides:
/// - exact-key lookup, upsert and delete through the slot table
/// - label search, key range scans and sorted views through the sequence
pub struct ProductIndex {
    table: SlotTable,
    arena: RecordArena,
    sequence: RecordSequence,
    observer: RefCell<Box<dyn IndexObserver>>,
}

impl std::fmt::Debug for ProductIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductIndex")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish()
    }
}

impl ProductIndex {
    /// Create an index that logs operations through `tracing`
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_observer(capacity, TracingObserver)
    }

    /// Create an index reporting to a custom observer
    pub fn with_observer<O>(capacity: usize, observer: O) -> Result<Self>
    where
        O: IndexObserver + 'static,
    {
        let capacity = NonZeroUsize::new(capacity).ok_or_else(|| {
            Error::InvalidArgument("table capacity must be at least 1".to_string())
        })?;

        Ok(Self {
            table: SlotTable::new(capacity),
            arena: RecordArena::with_capacity(capacity.get()),
            sequence: RecordSequence::with_capacity(capacity.get()),
            observer: RefCell::new(Box::new(observer)),
        })
    }

    /// Build an index from configuration, seeding sample data if asked to
    pub fn from_config<O>(config: &IndexConfig, observer: O) -> Result<Self>
    where
        O: IndexObserver + 'static,
    {
        config.validate()?;
        let mut index = Self::with_observer(config.capacity, observer)?;

        if config.seed_samples {
            let seeded = sample::seed(&mut index)?;
            info!(seeded, capacity = config.capacity, "Seeded sample products");
        }

        Ok(index)
    }

    fn emit(&self, event: IndexEvent) {
        self.observer.borrow_mut().observe(&event);
    }

    /// Store a new record at `slot` and append it to the sequence
    fn place(&mut self, slot: usize, record: Record) {
        let id = self.arena.allocate(record);
        self.table.occupy(slot, id);
        self.sequence.push(id);
    }

    /// Insert a record, or overwrite label and count if the key is live
    ///
    /// Returns [`Error::TableFull`] without touching any state when the
    /// probe walk comes back to the home slot.
    pub fn insert_or_update(&mut self, key: &str, label: &str, count: u32) -> Result<Upsert> {
        let started = Instant::now();
        let home = self.table.home(key);
        let probe = self.table.probe(key, &self.arena);

        let (result, outcome) = match probe {
            Probe::Found { id, .. } => {
                if let Some(record) = self.arena.get_mut(id) {
                    record.update(label, count);
                }
                (Ok(Upsert::Updated), Outcome::Updated)
            }
            Probe::Vacant { slot, .. } => {
                self.place(slot, Record::new(key, label, count));
                (Ok(Upsert::Inserted), Outcome::Inserted)
            }
            Probe::Exhausted { .. } => (
                Err(Error::TableFull {
                    capacity: self.capacity(),
                }),
                Outcome::TableFull,
            ),
        };

        self.emit(
            IndexEvent::new(Operation::Upsert, key, outcome)
                .with_probes(probe.probes())
                .with_slots(home, probe.slot())
                .with_elapsed(started.elapsed()),
        );
        result
    }

    /// Insert a record whose key must not be live yet
    pub fn insert_new(&mut self, key: &str, label: &str, count: u32) -> Result<()> {
        let started = Instant::now();
        let home = self.table.home(key);
        let probe = self.table.probe(key, &self.arena);

        let (result, outcome) = match probe {
            Probe::Found { .. } => (
                Err(Error::DuplicateKey(key.to_string())),
                Outcome::DuplicateKey,
            ),
            Probe::Vacant { slot, .. } => {
                self.place(slot, Record::new(key, label, count));
                (Ok(()), Outcome::Inserted)
            }
            Probe::Exhausted { .. } => (
                Err(Error::TableFull {
                    capacity: self.capacity(),
                }),
                Outcome::TableFull,
            ),
        };

        self.emit(
            IndexEvent::new(Operation::Insert, key, outcome)
                .with_probes(probe.probes())
                .with_slots(home, probe.slot())
                .with_elapsed(started.elapsed()),
        );
        result
    }

    /// Overwrite label and count of a live record
    pub fn update_existing(&mut self, key: &str, label: &str, count: u32) -> Result<()> {
        let started = Instant::now();
        let home = self.table.home(key);
        let probe = self.table.probe(key, &self.arena);

        let (result, outcome, slot) = match probe {
            Probe::Found { slot, id, .. } => {
                if let Some(record) = self.arena.get_mut(id) {
                    record.update(label, count);
                }
                (Ok(()), Outcome::Updated, Some(slot))
            }
            Probe::Vacant { .. } | Probe::Exhausted { .. } => {
                (Err(Error::NotFound(key.to_string())), Outcome::NotFound, None)
            }
        };

        self.emit(
            IndexEvent::new(Operation::Update, key, outcome)
                .with_probes(probe.probes())
                .with_slots(home, slot)
                .with_elapsed(started.elapsed()),
        );
        result
    }

    /// Exact-key lookup through the slot table
    ///
    /// Returns a copy of the record, never a live reference.
    pub fn find_exact(&self, key: &str) -> Option<Record> {
        let started = Instant::now();
        let home = self.table.home(key);
        let probe = self.table.probe(key, &self.arena);

        let (found, slot) = match probe {
            Probe::Found { slot, id, .. } => (self.arena.get(id).cloned(), Some(slot)),
            Probe::Vacant { .. } | Probe::Exhausted { .. } => (None, None),
        };
        let outcome = if found.is_some() {
            Outcome::Found
        } else {
            Outcome::NotFound
        };

        self.emit(
            IndexEvent::new(Operation::Find, key, outcome)
                .with_probes(probe.probes())
                .with_slots(home, slot)
                .with_elapsed(started.elapsed()),
        );
        found
    }

    /// Delete a record and re-settle the cluster that followed it
    ///
    /// Every record in the run of occupied cells after the freed slot is
    /// lifted out and walked in again from its home slot, so no probe chain
    /// is left broken by the hole.
    pub fn delete(&mut self, key: &str) -> bool {
        let started = Instant::now();
        let home = self.table.home(key);
        let probe = self.table.probe(key, &self.arena);

        let Probe::Found { slot, id, probes } = probe else {
            self.emit(
                IndexEvent::new(Operation::Delete, key, Outcome::NotFound)
                    .with_probes(probe.probes())
                    .with_slots(home, None)
                    .with_elapsed(started.elapsed()),
            );
            return false;
        };

        self.table.vacate(slot);
        self.arena.free(id);
        self.sequence.remove(id);

        let cluster = self.table.drain_cluster_after(slot);
        let rehashed = cluster.len();
        for member in cluster {
            self.resettle(member);
        }

        self.emit(
            IndexEvent::new(Operation::Delete, key, Outcome::Deleted)
                .with_probes(probes)
                .with_slots(home, Some(slot))
                .with_rehashed(rehashed)
                .with_elapsed(started.elapsed()),
        );
        true
    }

    /// Walk a lifted record back in from its home slot
    ///
    /// The record keeps its arena entry and its place in the sequence.
    fn resettle(&mut self, id: RecordId) {
        let Some(key) = self.arena.key(id) else {
            return;
        };

        match self.table.probe(key, &self.arena) {
            Probe::Vacant { slot, .. } => self.table.occupy(slot, id),
            other => error!(key, probe = ?other, "Cluster member could not be re-settled"),
        }
    }

    /// Case-insensitive substring search over labels, in sequence order
    pub fn linear_search_by_label(&self, substring: &str) -> Vec<Record> {
        let started = Instant::now();
        let (matches, comparisons) = self.sequence.search_label(substring, &self.arena);

        self.emit(
            IndexEvent::new(
                Operation::LabelSearch,
                substring,
                Outcome::Matched {
                    count: matches.len(),
                },
            )
            .with_probes(comparisons)
            .with_elapsed(started.elapsed()),
        );
        matches
    }

    /// Records with keys in `[start_key, end_key]`, sorted by label
    pub fn range_scan(&self, start_key: &str, end_key: &str) -> Result<Vec<Record>> {
        let started = Instant::now();
        let subject = format!("{}..={}", start_key, end_key);

        match self.sequence.range(start_key, end_key, &self.arena) {
            Ok((matches, comparisons)) => {
                self.emit(
                    IndexEvent::new(
                        Operation::RangeScan,
                        subject,
                        Outcome::Matched {
                            count: matches.len(),
                        },
                    )
                    .with_probes(comparisons)
                    .with_elapsed(started.elapsed()),
                );
                Ok(matches)
            }
            Err(e) => {
                self.emit(
                    IndexEvent::new(Operation::RangeScan, subject, Outcome::InvalidRange)
                        .with_elapsed(started.elapsed()),
                );
                Err(e)
            }
        }
    }

    /// Sort the sequence in place and return its records
    ///
    /// The new order persists: later scans see it instead of insertion
    /// order.
    pub fn sorted_view(&mut self, by: SortKey) -> Vec<Record> {
        let started = Instant::now();
        let comparisons = self.sequence.sort(by, &self.arena);
        let records = self.sequence.snapshot(&self.arena);

        self.emit(
            IndexEvent::new(
                Operation::Sort,
                by.to_string(),
                Outcome::Sorted {
                    count: records.len(),
                },
            )
            .with_probes(comparisons)
            .with_elapsed(started.elapsed()),
        );
        records
    }

    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Number of live records
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        matches!(self.table.probe(key, &self.arena), Probe::Found { .. })
    }

    /// Slot currently holding `key`
    pub fn slot_of(&self, key: &str) -> Option<usize> {
        match self.table.probe(key, &self.arena) {
            Probe::Found { slot, .. } => Some(slot),
            _ => None,
        }
    }

    /// Home slot `key` hashes to
    pub fn home_slot(&self, key: &str) -> usize {
        self.table.home(key)
    }

    /// Copy of every record in current sequence order
    pub fn records(&self) -> Vec<Record> {
        self.sequence.snapshot(&self.arena)
    }

    /// Key stored in each cell of the slot table
    pub fn slot_keys(&self) -> Vec<Option<String>> {
        let mut keys = vec![None; self.capacity()];
        for (slot, id) in self.table.iter() {
            keys[slot] = self.arena.key(id).map(str::to_string);
        }
        keys
    }

    pub fn stats(&self) -> IndexStats {
        let displaced = self
            .table
            .iter()
            .filter(|(slot, id)| {
                self.arena
                    .key(*id)
                    .is_some_and(|key| self.table.home(key) != *slot)
            })
            .count();

        IndexStats {
            capacity: self.capacity(),
            len: self.len(),
            load_factor: self.table.occupied() as f64 / self.capacity() as f64,
            displaced,
            longest_cluster: self.table.longest_cluster(),
        }
    }

    /// Verify that both views agree and every record is reachable
    ///
    /// Checks key uniqueness, set equality between slot table and sequence,
    /// and that each record is found by a probe walk from its home slot.
    pub fn check_invariants(&self) -> Result<()> {
        let violation = |msg: String| Err(Error::InvariantViolation(msg));

        let mut keys = HashSet::new();
        let mut table_ids = HashSet::new();
        for (slot, id) in self.table.iter() {
            let Some(key) = self.arena.key(id) else {
                return violation(format!("slot {} holds freed {}", slot, id));
            };
            if !keys.insert(key) {
                return violation(format!("key '{}' stored twice", key));
            }
            table_ids.insert(id);

            match self.table.probe(key, &self.arena) {
                Probe::Found { slot: found, .. } if found == slot => {}
                other => {
                    return violation(format!(
                        "key '{}' at slot {} unreachable from home {}: {:?}",
                        key,
                        slot,
                        self.table.home(key),
                        other
                    ))
                }
            }
        }

        let mut sequence_ids = HashSet::new();
        for id in self.sequence.ids() {
            if !sequence_ids.insert(*id) {
                return violation(format!("{} listed twice in sequence", id));
            }
        }

        if table_ids != sequence_ids {
            return violation(format!(
                "slot table holds {} records, sequence holds {}",
                table_ids.len(),
                sequence_ids.len()
            ));
        }
        if self.arena.len() != table_ids.len() {
            return violation(format!(
                "arena holds {} live records, slot table {}",
                self.arena.len(),
                table_ids.len()
            ));
        }

        Ok(())
    }
}
