//! An ordered map over heterogeneous scalar keys, backed by an arena skip
//! list.
//!
//! Keys may be numbers, strings, a null-like value, or the absent-key
//! marker, all living in one map under a fixed cross-type total order:
//!
//! ```text
//! Absent  <  Null  <  numbers (numeric order)  <  strings (lexicographic)
//! ```
//!
//! Point operations run in expected O(log n) with no rebalancing. Balance
//! comes from a promotion coin flipped on an injected RNG, so structure is
//! reproducible under a seeded generator.
//!
//! # Design Philosophy
//!
//! A classic skip list is a web of mutually referencing nodes. This crate
//! inverts the model the same way a slab-backed list does:
//!
//! ```text
//! Arena (Slab)      - owns cells and entries, provides stable handles
//! SkipList          - coordinates handles, performs index surgery
//! ```
//!
//! Benefits:
//! - **No reference cycles**: prev/next/owner edges are compact indices
//! - **Safe unlinking**: removal is a handle rewrite, never a dangling pointer
//! - **Cache-friendly**: cells live contiguously in slab slots
//!
//! # Quick Start
//!
//! ```
//! use strata::{ScalarKey, SkipList};
//! use rand::SeedableRng;
//! use rand::rngs::SmallRng;
//!
//! let rng = SmallRng::seed_from_u64(12345);
//! let mut map: SkipList<&'static str, _> = SkipList::new(rng);
//!
//! map.insert(ScalarKey::from(2), "two");
//! map.insert(ScalarKey::from("2"), "text two");
//! map.insert(ScalarKey::Null, "null");
//!
//! // One map, three key categories, one fixed order.
//! let keys: Vec<_> = map.keys().cloned().collect();
//! assert_eq!(
//!     keys,
//!     vec![ScalarKey::Null, ScalarKey::from(2), ScalarKey::from("2")]
//! );
//!
//! assert_eq!(map.get(&ScalarKey::from(2)), Some(&"two"));
//! assert_eq!(map.first_key(), Some(&ScalarKey::Null));
//! ```
//!
//! # Operations
//!
//! | Operation | Cost | Notes |
//! |-----------|------|-------|
//! | `insert` / `get` / `remove` | expected O(log n) | upsert overwrites in place |
//! | `first` / `last` | O(1) | via the bottom-layer sentinels |
//! | `entries_at` | expected O(log n) | anchored ascending + descending cursors |
//! | `segment` / `remove_segment` / `extract_segment` | O(log n + span) | fixed-count neighbourhood |
//! | `remove_range` | O(log n + span) | `std::ops::Bound` interval, no-op when reversed |
//!
//! # Concurrency
//!
//! Single-owner and synchronous; no internal locking. Cursors borrow the
//! map, so the borrow checker prevents mutation while one is live.

#![warn(missing_docs)]

mod index;
pub mod key;
pub mod skiplist;

pub use key::ScalarKey;
pub use skiplist::{
    Ascend, Config, Descend, EntriesAt, InvalidProbability, Keys, RemovedSegment, Segment,
    SegmentValues, SkipList, Values,
};
