//! Operation events and observers
//!
//! Every index operation reports one [`IndexEvent`] to the observer the
//! index was built with. Observers decide what to do with it: log it,
//! count it, or keep it for later inspection. The index itself never
//! formats display text.

pub mod metrics;

pub use metrics::MetricsObserver;

use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Operation that produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Upsert,
    Insert,
    Update,
    Find,
    Delete,
    LabelSearch,
    RangeScan,
    Sort,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Upsert => "upsert",
            Operation::Insert => "insert",
            Operation::Update => "update",
            Operation::Find => "find",
            Operation::Delete => "delete",
            Operation::LabelSearch => "label_search",
            Operation::RangeScan => "range_scan",
            Operation::Sort => "sort",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an operation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Outcome {
    Inserted,
    Updated,
    TableFull,
    DuplicateKey,
    Found,
    NotFound,
    Deleted,
    Matched { count: usize },
    InvalidRange,
    Sorted { count: usize },
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Inserted => "inserted",
            Outcome::Updated => "updated",
            Outcome::TableFull => "table_full",
            Outcome::DuplicateKey => "duplicate_key",
            Outcome::Found => "found",
            Outcome::NotFound => "not_found",
            Outcome::Deleted => "deleted",
            Outcome::Matched { .. } => "matched",
            Outcome::InvalidRange => "invalid_range",
            Outcome::Sorted { .. } => "sorted",
        }
    }

    /// Whether the operation was turned away without effect
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Outcome::TableFull | Outcome::DuplicateKey | Outcome::InvalidRange
        )
    }
}

/// Structured record of one index operation
///
/// `probes` counts occupied, non-matching cells stepped past for slot table
/// operations, and records compared for sequence operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexEvent {
    pub operation: Operation,
    /// Key, search text or range the operation was asked about
    pub subject: String,
    pub outcome: Outcome,
    pub probes: usize,
    pub home_slot: Option<usize>,
    /// Slot the operation finished at
    pub slot: Option<usize>,
    /// Records re-settled by a delete
    pub rehashed: usize,
    pub elapsed: Duration,
}

impl IndexEvent {
    pub fn new(operation: Operation, subject: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            operation,
            subject: subject.into(),
            outcome,
            probes: 0,
            home_slot: None,
            slot: None,
            rehashed: 0,
            elapsed: Duration::ZERO,
        }
    }

    pub fn with_probes(mut self, probes: usize) -> Self {
        self.probes = probes;
        self
    }

    pub fn with_slots(mut self, home_slot: usize, slot: Option<usize>) -> Self {
        self.home_slot = Some(home_slot);
        self.slot = slot;
        self
    }

    pub fn with_rehashed(mut self, rehashed: usize) -> Self {
        self.rehashed = rehashed;
        self
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }
}

/// Receiver of index events
pub trait IndexObserver {
    fn observe(&mut self, event: &IndexEvent);
}

impl<A: IndexObserver, B: IndexObserver> IndexObserver for (A, B) {
    fn observe(&mut self, event: &IndexEvent) {
        self.0.observe(event);
        self.1.observe(event);
    }
}

impl<T: IndexObserver + ?Sized> IndexObserver for Box<T> {
    fn observe(&mut self, event: &IndexEvent) {
        (**self).observe(event);
    }
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl IndexObserver for NoopObserver {
    fn observe(&mut self, _event: &IndexEvent) {}
}

/// Forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl IndexObserver for TracingObserver {
    fn observe(&mut self, event: &IndexEvent) {
        let elapsed_us = event.elapsed.as_micros() as u64;
        if event.outcome.is_rejection() {
            warn!(
                op = %event.operation,
                subject = %event.subject,
                outcome = event.outcome.as_str(),
                probes = event.probes,
                elapsed_us,
                "Index operation rejected"
            );
        } else {
            debug!(
                op = %event.operation,
                subject = %event.subject,
                outcome = event.outcome.as_str(),
                probes = event.probes,
                home_slot = ?event.home_slot,
                slot = ?event.slot,
                rehashed = event.rehashed,
                elapsed_us,
                "Index operation"
            );
        }
    }
}

/// Keeps every event in a shared log
///
/// Clones share the same log, so a caller can hand one clone to the index
/// and inspect the other.
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<IndexEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<IndexEvent> {
        self.events.lock().clone()
    }

    pub fn last(&self) -> Option<IndexEvent> {
        self.events.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl IndexObserver for RecordingObserver {
    fn observe(&mut self, event: &IndexEvent) {
        self.events.lock().push(event.clone());
    }
}
