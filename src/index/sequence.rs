//! Insertion-ordered record sequence
//!
//! Backs the queries the slot table cannot answer efficiently: substring
//! search on labels, key range scans and full sorted dumps. Holds handles
//! only; the records themselves live in the arena.

use super::arena::RecordArena;
use super::record::{Record, RecordId};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Field used to order a sorted view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Label,
    Key,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Label => write!(f, "label"),
            SortKey::Key => write!(f, "key"),
        }
    }
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "label" | "name" => Ok(SortKey::Label),
            "key" | "sku" => Ok(SortKey::Key),
            other => Err(Error::InvalidArgument(format!(
                "unknown sort field '{}', expected 'label' or 'key'",
                other
            ))),
        }
    }
}

/// Compare two strings ignoring case, without allocating
pub fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Whether `key` falls at or below the inclusive upper bound `end`
///
/// Only the first `len(end)` characters of the key take part, so a bound of
/// `"M"` admits `"M-100"`.
fn within_upper_bound(key: &str, end: &str) -> bool {
    let width = end.chars().count();
    let prefix_end = key
        .char_indices()
        .nth(width)
        .map(|(offset, _)| offset)
        .unwrap_or(key.len());
    cmp_ignore_case(&key[..prefix_end], end) != Ordering::Greater
}

/// Ordered handles of every live record
#[derive(Debug, Default)]
pub struct RecordSequence {
    items: Vec<RecordId>,
}

impl RecordSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, id: RecordId) {
        self.items.push(id);
    }

    /// Remove a handle, keeping the order of the rest
    pub fn remove(&mut self, id: RecordId) -> bool {
        match self.items.iter().position(|item| *item == id) {
            Some(position) => {
                self.items.remove(position);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn ids(&self) -> &[RecordId] {
        &self.items
    }

    fn records<'a>(&'a self, arena: &'a RecordArena) -> impl Iterator<Item = &'a Record> + 'a {
        self.items.iter().filter_map(move |id| arena.get(*id))
    }

    /// Copy out every record in current order
    pub fn snapshot(&self, arena: &RecordArena) -> Vec<Record> {
        self.records(arena).cloned().collect()
    }

    /// Case-insensitive substring match on labels
    ///
    /// Returns the matches in sequence order and the number of comparisons.
    pub fn search_label(&self, needle: &str, arena: &RecordArena) -> (Vec<Record>, usize) {
        let needle = needle.to_lowercase();
        let mut comparisons = 0;

        let matches = self
            .records(arena)
            .filter(|record| {
                comparisons += 1;
                record.label.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();

        (matches, comparisons)
    }

    /// Records whose key lies in `[start, end]`, sorted by label
    ///
    /// Rejects a `start` that lies above `end` under the same prefix rule
    /// used for the scan. The sequence order is left untouched.
    pub fn range(
        &self,
        start: &str,
        end: &str,
        arena: &RecordArena,
    ) -> Result<(Vec<Record>, usize)> {
        if !within_upper_bound(start, end) {
            return Err(Error::InvalidRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        let mut comparisons = 0;
        let mut matches: Vec<Record> = self
            .records(arena)
            .filter(|record| {
                comparisons += 1;
                cmp_ignore_case(&record.key, start) != Ordering::Less
                    && within_upper_bound(&record.key, end)
            })
            .cloned()
            .collect();

        matches.sort_by(|a, b| cmp_ignore_case(&a.label, &b.label));
        Ok((matches, comparisons))
    }

    /// Stable sort of the sequence itself
    ///
    /// Returns the number of comparisons made.
    pub fn sort(&mut self, by: SortKey, arena: &RecordArena) -> usize {
        let mut comparisons = 0;
        self.items.sort_by(|a, b| {
            comparisons += 1;
            let left = arena.get(*a).map_or("", |record| sort_field(record, by));
            let right = arena.get(*b).map_or("", |record| sort_field(record, by));
            cmp_ignore_case(left, right)
        });
        comparisons
    }
}

fn sort_field(record: &Record, by: SortKey) -> &str {
    match by {
        SortKey::Label => &record.label,
        SortKey::Key => &record.key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (RecordSequence, RecordArena) {
        let mut arena = RecordArena::new();
        let mut sequence = RecordSequence::new();
        for (key, label, count) in [
            ("M-100", "Monitor 24in", 40),
            ("A-100", "Wireless Mouse", 150),
            ("L-301", "Acer Laptop 15in", 25),
            ("K-106", "Gaming Keyboard", 80),
            ("Z-900", "bluetooth mouse", 5),
        ] {
            let id = arena.allocate(Record::new(key, label, count));
            sequence.push(id);
        }
        (sequence, arena)
    }

    fn keys(records: &[Record]) -> Vec<&str> {
        records.iter().map(|r| r.key.as_str()).collect()
    }

    #[test]
    fn test_cmp_ignore_case() {
        assert_eq!(cmp_ignore_case("abc", "ABC"), Ordering::Equal);
        assert_eq!(cmp_ignore_case("a-100", "B"), Ordering::Less);
        assert_eq!(cmp_ignore_case("Zeta", "alpha"), Ordering::Greater);
    }

    #[test]
    fn test_within_upper_bound() {
        assert!(within_upper_bound("M-100", "M"));
        assert!(within_upper_bound("m-100", "M"));
        assert!(within_upper_bound("A-150", "A-199"));
        assert!(!within_upper_bound("N-100", "M"));
        assert!(within_upper_bound("", "M"));
    }

    #[test]
    fn test_search_label_case_insensitive() {
        let (sequence, arena) = fixture();

        let (matches, comparisons) = sequence.search_label("MOUSE", &arena);
        assert_eq!(keys(&matches), vec!["A-100", "Z-900"]);
        assert_eq!(comparisons, 5);

        let (matches, _) = sequence.search_label("printer", &arena);
        assert!(matches.is_empty());
    }

    #[test]
    fn test_range_sorted_by_label() -> Result<()> {
        let (sequence, arena) = fixture();

        let (matches, comparisons) = sequence.range("a", "m", &arena)?;
        // Acer Laptop, Gaming Keyboard, Monitor, Wireless Mouse
        assert_eq!(keys(&matches), vec!["L-301", "K-106", "M-100", "A-100"]);
        assert_eq!(comparisons, 5);

        // Scan must not reorder the sequence
        let order: Vec<_> = sequence.snapshot(&arena);
        assert_eq!(keys(&order)[0], "M-100");
        Ok(())
    }

    #[test]
    fn test_range_rejects_inverted_bounds() {
        let (sequence, arena) = fixture();

        let err = sequence.range("M", "A", &arena).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidRange {
                start: "M".to_string(),
                end: "A".to_string()
            }
        );
    }

    #[test]
    fn test_range_single_key() -> Result<()> {
        let (sequence, arena) = fixture();

        let (matches, _) = sequence.range("k-106", "K-106", &arena)?;
        assert_eq!(keys(&matches), vec!["K-106"]);
        Ok(())
    }

    #[test]
    fn test_range_start_inside_prefix_bound() -> Result<()> {
        let mut arena = RecordArena::new();
        let mut sequence = RecordSequence::new();
        for key in ["L-301", "L-302", "M-100"] {
            let id = arena.allocate(Record::new(key, key, 1));
            sequence.push(id);
        }

        let (matches, _) = sequence.range("A", "L", &arena)?;
        assert_eq!(keys(&matches), vec!["L-301", "L-302"]);

        // Any key admitted under `end` is also accepted as `start`
        let (matches, _) = sequence.range("L-302", "L", &arena)?;
        assert_eq!(keys(&matches), vec!["L-302"]);

        assert!(sequence.range("M-100", "L", &arena).is_err());
        Ok(())
    }

    #[test]
    fn test_sort_counts_comparisons() {
        let (mut sequence, arena) = fixture();

        let comparisons = sequence.sort(SortKey::Key, &arena);
        assert!(comparisons >= sequence.len() - 1);
        assert!(comparisons <= sequence.len() * sequence.len());

        let mut single = RecordSequence::new();
        single.push(sequence.ids()[0]);
        assert_eq!(single.sort(SortKey::Key, &arena), 0);
    }

    #[test]
    fn test_sort_is_persistent() {
        let (mut sequence, arena) = fixture();

        sequence.sort(SortKey::Key, &arena);
        assert_eq!(
            keys(&sequence.snapshot(&arena)),
            vec!["A-100", "K-106", "L-301", "M-100", "Z-900"]
        );

        sequence.sort(SortKey::Label, &arena);
        assert_eq!(
            keys(&sequence.snapshot(&arena)),
            vec!["L-301", "Z-900", "K-106", "M-100", "A-100"]
        );
    }

    #[test]
    fn test_sort_is_stable() {
        let mut arena = RecordArena::new();
        let mut sequence = RecordSequence::new();
        for key in ["B-2", "A-1", "C-3"] {
            let id = arena.allocate(Record::new(key, "Same Label", 1));
            sequence.push(id);
        }

        sequence.sort(SortKey::Label, &arena);
        assert_eq!(keys(&sequence.snapshot(&arena)), vec!["B-2", "A-1", "C-3"]);
    }

    #[test]
    fn test_remove_keeps_order() {
        let (mut sequence, arena) = fixture();
        let second = sequence.ids()[1];

        assert!(sequence.remove(second));
        assert!(!sequence.remove(second));
        assert_eq!(
            keys(&sequence.snapshot(&arena)),
            vec!["M-100", "L-301", "K-106", "Z-900"]
        );
    }

    #[test]
    fn test_sort_key_parse() {
        assert_eq!("label".parse::<SortKey>().ok(), Some(SortKey::Label));
        assert_eq!("SKU".parse::<SortKey>().ok(), Some(SortKey::Key));
        assert!("price".parse::<SortKey>().is_err());
    }
}
