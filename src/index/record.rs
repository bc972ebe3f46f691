//! Product records and arena handles

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable handle to a record held by the [`RecordArena`](super::RecordArena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(u32);

impl RecordId {
    /// Create a handle from a raw arena index
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    /// Arena index for this handle
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Record(#{})", self.0)
    }
}

/// A product held by the index
///
/// `key` is unique among live records and compared case-sensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub key: String,
    pub label: String,
    pub count: u32,
}

impl Record {
    pub fn new(key: impl Into<String>, label: impl Into<String>, count: u32) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            count,
        }
    }

    /// Overwrite the mutable fields, keeping the key
    pub fn update(&mut self, label: impl Into<String>, count: u32) {
        self.label = label.into();
        self.count = count;
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SKU: {} | Name: {} | Qty: {}", self.key, self.label, self.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id() {
        let id = RecordId::new(7);
        assert_eq!(id.index(), 7);
        assert_eq!(id.to_string(), "Record(#7)");
    }

    #[test]
    fn test_record_update_keeps_key() {
        let mut record = Record::new("A-100", "Wireless Mouse", 150);

        record.update("Wired Mouse", 20);
        assert_eq!(record.key, "A-100");
        assert_eq!(record.label, "Wired Mouse");
        assert_eq!(record.count, 20);
    }

    #[test]
    fn test_record_display() {
        let record = Record::new("K-106", "Gaming Keyboard", 80);
        assert_eq!(
            record.to_string(),
            "SKU: K-106 | Name: Gaming Keyboard | Qty: 80"
        );
    }
}
