//! End-to-end scenarios for the product index

use stockindex::error::{Error, Result};
use stockindex::index::{Record, SortKey};
use stockindex::observe::{NoopObserver, Operation, Outcome, RecordingObserver};
use stockindex::shell::{Reply, Shell};
use stockindex::{IndexConfig, ProductIndex, Upsert};

fn keys(records: &[Record]) -> Vec<&str> {
    records.iter().map(|r| r.key.as_str()).collect()
}

#[test]
fn test_collision_probes_forward() -> Result<()> {
    let recorder = RecordingObserver::new();
    let mut index = ProductIndex::with_observer(20, recorder.clone())?;

    // Anagrams share a character sum, so both hash to 15
    index.insert_or_update("A-100", "Wireless Mouse", 150)?;
    index.insert_or_update("A-010", "Trackball Mouse", 12)?;

    assert_eq!(index.home_slot("A-010"), 15);
    assert_eq!(index.slot_of("A-100"), Some(15));
    assert_eq!(index.slot_of("A-010"), Some(16));

    let found = index.find_exact("A-010").expect("A-010 should exist");
    assert_eq!(found.label, "Trackball Mouse");

    let event = recorder.last().unwrap();
    assert_eq!(event.operation, Operation::Find);
    assert_eq!(event.home_slot, Some(15));
    assert_eq!(event.slot, Some(16));
    assert_eq!(event.probes, 1);
    Ok(())
}

#[test]
fn test_range_sorted_by_label() -> Result<()> {
    let mut index = ProductIndex::with_observer(20, NoopObserver)?;
    index.insert_or_update("A-100", "Wireless Mouse", 150)?;
    index.insert_or_update("K-106", "Gaming Keyboard", 80)?;
    index.insert_or_update("L-301", "Acer Laptop 15in", 25)?;
    index.insert_or_update("M-100", "Monitor 24in", 40)?;

    let matches = index.range_scan("A", "M")?;
    assert_eq!(keys(&matches), vec!["L-301", "K-106", "M-100", "A-100"]);

    // Scanning does not reorder the sequence
    assert_eq!(
        keys(&index.records()),
        vec!["A-100", "K-106", "L-301", "M-100"]
    );

    let narrow = index.range_scan("K", "L")?;
    assert_eq!(keys(&narrow), vec!["L-301", "K-106"]);

    assert!(matches!(
        index.range_scan("M", "A"),
        Err(Error::InvalidRange { .. })
    ));
    Ok(())
}

#[test]
fn test_delete_missing_key_changes_nothing() -> Result<()> {
    let config = IndexConfig {
        seed_samples: true,
        ..IndexConfig::default()
    };
    let mut index = ProductIndex::from_config(&config, NoopObserver)?;
    let slots_before = index.slot_keys();
    let records_before = index.records();

    assert!(!index.delete("Z-999"));
    assert_eq!(index.slot_keys(), slots_before);
    assert_eq!(index.records(), records_before);
    index.check_invariants()
}

#[test]
fn test_single_slot_table() -> Result<()> {
    let mut index = ProductIndex::with_observer(1, NoopObserver)?;

    assert_eq!(
        index.insert_or_update("A-100", "Wireless Mouse", 150)?,
        Upsert::Inserted
    );
    assert_eq!(
        index.insert_or_update("K-106", "Gaming Keyboard", 80),
        Err(Error::TableFull { capacity: 1 })
    );
    assert_eq!(index.len(), 1);
    assert!(index.find_exact("K-106").is_none());

    assert!(index.delete("A-100"));
    assert!(index.is_empty());
    assert_eq!(
        index.insert_or_update("K-106", "Gaming Keyboard", 80)?,
        Upsert::Inserted
    );
    index.check_invariants()
}

#[test]
fn test_delete_keeps_long_cluster_reachable() -> Result<()> {
    let recorder = RecordingObserver::new();
    let mut index = ProductIndex::with_observer(20, recorder.clone())?;

    // A-100, A-010 and A-001 hash to 15; A-101 hashes to 16
    index.insert_or_update("A-100", "Wireless Mouse", 150)?;
    index.insert_or_update("A-010", "Trackball Mouse", 12)?;
    index.insert_or_update("A-001", "Travel Mouse", 5)?;
    index.insert_or_update("A-101", "Mouse Pad", 300)?;
    assert_eq!(index.slot_of("A-101"), Some(18));

    assert!(index.delete("A-100"));
    let event = recorder.last().unwrap();
    assert_eq!(event.outcome, Outcome::Deleted);
    assert_eq!(event.rehashed, 3);

    assert_eq!(index.slot_of("A-010"), Some(15));
    assert_eq!(index.slot_of("A-001"), Some(16));
    assert_eq!(index.slot_of("A-101"), Some(17));
    assert!(index.slot_keys()[18].is_none());

    for key in ["A-010", "A-001", "A-101"] {
        assert!(index.find_exact(key).is_some(), "{} should be reachable", key);
    }
    assert_eq!(keys(&index.records()), vec!["A-010", "A-001", "A-101"]);
    index.check_invariants()
}

#[test]
fn test_delete_wrapping_cluster() -> Result<()> {
    let mut index = ProductIndex::with_observer(5, NoopObserver)?;

    // 'c' = 99 and 'h' = 104 hash to 4, 'd' = 100 hashes to 0
    index.insert_or_update("c", "c", 1)?;
    index.insert_or_update("h", "h", 1)?;
    index.insert_or_update("d", "d", 1)?;
    assert_eq!(index.slot_of("h"), Some(0));
    assert_eq!(index.slot_of("d"), Some(1));

    assert!(index.delete("c"));
    assert_eq!(index.slot_of("h"), Some(4));
    assert_eq!(index.slot_of("d"), Some(0));
    index.check_invariants()
}

#[test]
fn test_repeated_operations_are_idempotent() -> Result<()> {
    let mut index = ProductIndex::with_observer(20, NoopObserver)?;

    assert_eq!(
        index.insert_or_update("K-106", "Gaming Keyboard", 80)?,
        Upsert::Inserted
    );
    assert_eq!(
        index.insert_or_update("K-106", "Gaming Keyboard", 80)?,
        Upsert::Updated
    );
    assert_eq!(index.len(), 1);
    assert_eq!(index.records().len(), 1);

    assert!(index.delete("K-106"));
    assert!(!index.delete("K-106"));
    assert!(index.is_empty());
    assert!(index.records().is_empty());

    let first = index.sorted_view(SortKey::Label);
    let second = index.sorted_view(SortKey::Label);
    assert_eq!(first, second);
    index.check_invariants()
}

#[test]
fn test_shell_session() -> Result<()> {
    let config = IndexConfig {
        seed_samples: true,
        ..IndexConfig::default()
    };
    let mut shell = Shell::new(&config, NoopObserver)?;

    shell.execute("put A-010 \"Trackball Mouse\" 12")?;
    let response = shell.execute("find A-010")?;
    let event = response.event.expect("find reports an event");
    assert_eq!(event.probes, 1);
    assert!(matches!(response.reply, Reply::Found(_)));

    shell.execute("delete A-100")?;
    assert_eq!(shell.index().slot_of("A-010"), Some(15));

    assert!(shell.execute("put B-1 Widget lots").is_err());
    assert!(shell.execute("frobnicate").is_err());
    shell.index().check_invariants()
}
