//! Product Index
//!
//! A fixed-capacity hash table using additive hashing and linear probing,
//! paired with an insertion-ordered sequence for scans and sorts.
//!
//! # Architecture
//!
//! ```text
//! ProductIndex
//!   ├─→ RecordArena       → id 0: A-100 Wireless Mouse 150
//!   │                       id 1: K-106 Gaming Keyboard 80
//!   │                       free: [2]
//!   │
//!   ├─→ SlotTable (N=20)  → [.., 11: id 1, .., 15: id 0, ..]
//!   │     exact-key lookup, insert, delete + cluster rehash
//!   │
//!   └─→ RecordSequence    → [id 0, id 1]
//!         label search, key range scan, sorted views
//! ```
//!
//! Both views hold `RecordId`s into the arena. A record exists exactly once,
//! so an update through one view is always visible through the other.

pub mod arena;
pub mod hash;
pub mod product_index;
pub mod record;
pub mod sequence;
pub mod slot_table;

pub use arena::RecordArena;
pub use hash::char_sum_hash;
pub use product_index::{IndexStats, ProductIndex, Upsert};
pub use record::{Record, RecordId};
pub use sequence::{cmp_ignore_case, RecordSequence, SortKey};
pub use slot_table::{Probe, SlotTable};
