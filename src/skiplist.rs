//! Skip list: a probabilistically layered ordered map over heterogeneous
//! scalar keys.
//!
//! Entries live in sorted order on a stack of doubly-linked layers. Layer 0
//! holds every entry; each higher layer holds a random subset of the layer
//! below, so a search can skim long distances up high before dropping down
//! for the final approach. Expected O(log n) for point operations, with no
//! rebalancing.
//!
//! ```text
//! Layer 2:  HEAD ──────────────────► 50 ─────────────────────► TAIL
//!             │                       │
//! Layer 1:  HEAD ────────► 20 ──────► 50 ──────────► 90 ─────► TAIL
//!             │            │          │              │
//! Layer 0:  HEAD ──► 10 ──► 20 ──► 30 ──► 50 ──► 60 ──► 90 ──► TAIL
//! ```
//!
//! # Design
//!
//! Every logical entry is a [`Group`]: the key, the value, and one linked
//! cell per layer the entry was promoted into. Cells and groups live in slab
//! arenas and reference each other by compact handles, so the prev/next/owner
//! cycles of a classic skip list reduce to index rewrites. Unlinking never
//! risks a dangling reference. Two sentinel groups bound every layer; their
//! conceptual keys sit below and above every real key, and the comparator is
//! never consulted for them.
//!
//! Keys are [`ScalarKey`]s under a fixed cross-type order; values are any
//! `V`. The promotion coin comes from an injected [`RngCore`], so structure
//! is reproducible under a seeded generator.
//!
//! # Example
//!
//! ```rust
//! use strata::{ScalarKey, SkipList};
//! use rand::SeedableRng;
//! use rand::rngs::SmallRng;
//!
//! let rng = SmallRng::seed_from_u64(12345);
//! let mut map: SkipList<String, _> = SkipList::new(rng);
//!
//! map.insert(ScalarKey::from(50), "fifty".into());
//! map.insert(ScalarKey::from(10), "ten".into());
//! map.insert(ScalarKey::from("10"), "text ten".into());
//!
//! assert_eq!(map.get(&ScalarKey::from(50)), Some(&"fifty".into()));
//! assert_eq!(map.first(), Some((&ScalarKey::from(10), &"ten".into())));
//! // String keys sort above all numeric keys.
//! assert_eq!(map.last(), Some((&ScalarKey::from("10"), &"text ten".into())));
//! ```

use core::cmp::Ordering;
use core::fmt;
use core::iter::FusedIterator;
use core::ops::{Bound, RangeBounds};

use rand_core::RngCore;
use slab::Slab;

use crate::index::{GroupRef, NodeRef};
use crate::key::ScalarKey;

// ============================================================================
// Config
// ============================================================================

/// Construction options for [`SkipList`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Probability that an entry present in layer L is also linked into
    /// layer L+1. Must lie in the open interval (0, 1).
    ///
    /// Higher values make towers taller: faster search, more cells per
    /// entry. The default 0.5 gives ~2 cells per entry on average.
    pub promote_probability: f64,
    /// Maintain an incremental entry count, readable through
    /// [`SkipList::len`]. Enabled by default; disable to shave the counter
    /// update off every mutation.
    pub track_len: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            promote_probability: 0.5,
            track_len: true,
        }
    }
}

/// Error returned when a [`Config`] carries a promotion probability outside
/// the open interval (0, 1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvalidProbability(pub f64);

impl InvalidProbability {
    /// Returns the rejected probability value.
    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for InvalidProbability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "promotion probability must lie in (0, 1), got {}",
            self.0
        )
    }
}

impl std::error::Error for InvalidProbability {}

// ============================================================================
// Node and Group
// ============================================================================

/// One per-layer doubly-linked cell.
///
/// `prev`/`next` point at same-layer neighbours; `group` identifies the
/// owning entry. `NONE` links appear only on the outward side of the
/// sentinels, so a real entry's neighbours always exist.
#[derive(Debug, Clone, Copy)]
struct Node {
    prev: NodeRef,
    next: NodeRef,
    group: GroupRef,
}

/// What a group represents.
#[derive(Debug)]
enum GroupKind<V> {
    /// Lower sentinel; sits below every key.
    Head,
    /// Upper sentinel; sits above every key.
    Tail,
    /// A real key/value entry.
    Entry { key: ScalarKey, value: V },
}

/// A logical entry plus its per-layer cells.
///
/// `nodes[0]` is the bottom-layer cell and always exists; `nodes[l]` exists
/// for every layer `l` the group was promoted into. The sentinel groups own
/// one cell per materialized layer.
#[derive(Debug)]
struct Group<V> {
    kind: GroupKind<V>,
    nodes: Vec<NodeRef>,
}

impl<V> Group<V> {
    #[inline]
    fn is_sentinel(&self) -> bool {
        !matches!(self.kind, GroupKind::Entry { .. })
    }

    #[inline]
    fn is_tail(&self) -> bool {
        matches!(self.kind, GroupKind::Tail)
    }

    /// Key/value of a real entry. Callers hold a handle that structurally
    /// cannot point at a sentinel.
    #[inline]
    fn entry(&self) -> (&ScalarKey, &V) {
        match &self.kind {
            GroupKind::Entry { key, value } => (key, value),
            _ => panic!("sentinel group where an entry was expected"),
        }
    }
}

// ============================================================================
// Search
// ============================================================================

/// Result of a predecessor search.
struct Located {
    /// Bottom-layer cell of the exactly-matching group, or `NONE`.
    matching: NodeRef,
    /// Rightmost bottom-layer cell with key < target, or the head
    /// sentinel's cell when no entry sorts below the target.
    predecessor: NodeRef,
    /// Per-layer splice anchors: `path[l]` is the rightmost cell in layer
    /// `l` with key < target. Fully populated only when `matching` is
    /// `NONE`; an early match returns before the descent completes.
    path: Vec<NodeRef>,
}

// ============================================================================
// SkipList
// ============================================================================

/// An ordered map over [`ScalarKey`]s, implemented as an arena-backed skip
/// list.
///
/// # Type parameters
///
/// - `V`: value type
/// - `R`: random source for the promotion coin, implementing [`RngCore`]
///
/// # Concurrency
///
/// Single-owner, synchronous. There is no internal locking; wrap the map if
/// it must be shared across threads. Cursors borrow the structure, so the
/// borrow checker rules out mutation while one is live.
#[derive(Debug)]
pub struct SkipList<V, R> {
    nodes: Slab<Node>,
    groups: Slab<Group<V>>,
    head: GroupRef,
    tail: GroupRef,
    rng: R,
    /// Promotion coin: promote while `rng.next_u64() < promote_threshold`.
    promote_threshold: u64,
    /// `Some(count)` when length tracking is enabled.
    len: Option<usize>,
}

impl<V, R: RngCore> SkipList<V, R> {
    /// Creates an empty map with the default [`Config`].
    pub fn new(rng: R) -> Self {
        Self::with_config(Config::default(), rng).expect("default config is valid")
    }

    /// Creates an empty map with the given configuration.
    ///
    /// Fails fast if `config.promote_probability` lies outside (0, 1);
    /// nothing else about a config can be invalid.
    pub fn with_config(config: Config, rng: R) -> Result<Self, InvalidProbability> {
        let p = config.promote_probability;
        if !(p > 0.0 && p < 1.0) {
            return Err(InvalidProbability(p));
        }
        let mut list = Self {
            nodes: Slab::new(),
            groups: Slab::new(),
            head: GroupRef::NONE,
            tail: GroupRef::NONE,
            rng,
            promote_threshold: (p * u64::MAX as f64) as u64,
            len: config.track_len.then_some(0),
        };
        list.bootstrap();
        Ok(list)
    }

    // ========================================================================
    // Insert
    // ========================================================================

    /// Inserts a key-value pair.
    ///
    /// If the key already exists the value is overwritten in place and the
    /// old value returned; no structural change happens and no randomness
    /// is consumed. Otherwise the entry is spliced into the bottom layer at
    /// its sorted position and promoted upward while the coin keeps landing
    /// under [`Config::promote_probability`], materializing new layers past
    /// the current top as needed.
    pub fn insert(&mut self, key: ScalarKey, value: V) -> Option<V> {
        let found = self.locate(&key);

        if found.matching.is_some() {
            let group = self.node(found.matching).group;
            match &mut self.group_mut(group).kind {
                GroupKind::Entry { value: slot, .. } => {
                    return Some(core::mem::replace(slot, value));
                }
                _ => panic!("matching cell owned by a sentinel"),
            }
        }

        // Splice a fresh entry into the bottom layer at the predecessor.
        let group = GroupRef::from_usize(self.groups.insert(Group {
            kind: GroupKind::Entry { key, value },
            nodes: Vec::new(),
        }));
        let succ = self.node(found.predecessor).next;
        let cell = self.link_after(found.predecessor, succ, group);
        self.group_mut(group).nodes.push(cell);

        // Stack the entry up while the coin cooperates. The anchor for layer
        // l is the recorded search path; past the current top, a new
        // sentinel-only layer is materialized first.
        let mut layer = 1;
        while self.rng.next_u64() < self.promote_threshold {
            let anchor = if layer < found.path.len() {
                found.path[layer]
            } else {
                self.push_layer()
            };
            let succ = self.node(anchor).next;
            let cell = self.link_after(anchor, succ, group);
            self.group_mut(group).nodes.push(cell);
            layer += 1;
        }

        if let Some(len) = &mut self.len {
            *len += 1;
        }
        None
    }
}

impl<V, R> SkipList<V, R> {
    // ========================================================================
    // Lookup
    // ========================================================================

    /// Returns a reference to the value for the given key.
    pub fn get(&self, key: &ScalarKey) -> Option<&V> {
        let found = self.locate(key);
        if found.matching.is_none() {
            return None;
        }
        let group = self.node(found.matching).group;
        Some(self.group(group).entry().1)
    }

    /// Returns a mutable reference to the value for the given key.
    pub fn get_mut(&mut self, key: &ScalarKey) -> Option<&mut V> {
        let found = self.locate(key);
        if found.matching.is_none() {
            return None;
        }
        let group = self.node(found.matching).group;
        match &mut self.group_mut(group).kind {
            GroupKind::Entry { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Returns `true` if the map contains the given key.
    #[inline]
    pub fn contains_key(&self, key: &ScalarKey) -> bool {
        self.locate(key).matching.is_some()
    }

    // ========================================================================
    // Remove
    // ========================================================================

    /// Removes the entry for the given key and returns its value.
    ///
    /// The entry's cell is unlinked from every layer it occupies; removing
    /// an absent key is a no-op returning `None`.
    pub fn remove(&mut self, key: &ScalarKey) -> Option<V> {
        let found = self.locate(key);
        if found.matching.is_none() {
            return None;
        }
        let group = self.node(found.matching).group;
        Some(self.discard_group(group))
    }

    /// Removes the entry for the given key, reporting whether it existed.
    #[inline]
    pub fn delete(&mut self, key: &ScalarKey) -> bool {
        self.remove(key).is_some()
    }

    /// Removes all entries, resetting to a single sentinel-only layer.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.groups.clear();
        if let Some(len) = &mut self.len {
            *len = 0;
        }
        self.bootstrap();
    }

    // ========================================================================
    // Length
    // ========================================================================

    /// Returns the number of entries, or `None` if length tracking was
    /// disabled at construction.
    #[inline]
    pub fn len(&self) -> Option<usize> {
        self.len
    }

    /// Returns `true` if the map holds no entries. O(1) regardless of
    /// length tracking.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.group(self.node(self.bottom_first()).group).is_tail()
    }

    // ========================================================================
    // Min / max
    // ========================================================================

    /// Returns the entry with the smallest key. O(1).
    pub fn first(&self) -> Option<(&ScalarKey, &V)> {
        self.entry_at(self.bottom_first())
    }

    /// Returns the entry with the largest key. O(1).
    pub fn last(&self) -> Option<(&ScalarKey, &V)> {
        self.entry_at(self.bottom_last())
    }

    /// Returns the smallest key.
    pub fn first_key(&self) -> Option<&ScalarKey> {
        self.first().map(|(key, _)| key)
    }

    /// Returns the value of the entry with the smallest key.
    pub fn first_value(&self) -> Option<&V> {
        self.first().map(|(_, value)| value)
    }

    /// Returns the largest key.
    pub fn last_key(&self) -> Option<&ScalarKey> {
        self.last().map(|(key, _)| key)
    }

    /// Returns the value of the entry with the largest key.
    pub fn last_value(&self) -> Option<&V> {
        self.last().map(|(_, value)| value)
    }

    /// Returns the entry with the smallest key, value mutable.
    pub fn first_mut(&mut self) -> Option<(&ScalarKey, &mut V)> {
        let group = self.node(self.bottom_first()).group;
        match &mut self.group_mut(group).kind {
            GroupKind::Entry { key, value } => Some((&*key, value)),
            _ => None,
        }
    }

    /// Returns the entry with the largest key, value mutable.
    pub fn last_mut(&mut self) -> Option<(&ScalarKey, &mut V)> {
        let group = self.node(self.bottom_last()).group;
        match &mut self.group_mut(group).kind {
            GroupKind::Entry { key, value } => Some((&*key, value)),
            _ => None,
        }
    }

    // ========================================================================
    // Iteration
    // ========================================================================

    /// Returns a cursor over all entries in ascending key order.
    #[inline]
    pub fn iter(&self) -> Ascend<'_, V> {
        self.ascend_from(self.bottom_first())
    }

    /// Returns a cursor over all entries in descending key order.
    #[inline]
    pub fn iter_rev(&self) -> Descend<'_, V> {
        self.descend_from(self.bottom_last())
    }

    /// Returns an iterator over keys in ascending order.
    #[inline]
    pub fn keys(&self) -> Keys<'_, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over values in ascending key order.
    #[inline]
    pub fn values(&self) -> Values<'_, V> {
        Values { inner: self.iter() }
    }

    /// Anchors a pair of cursors at the given key.
    ///
    /// When the key is present, `value` carries its value and both cursors
    /// start at the matching entry. Otherwise the ascending cursor starts at
    /// the first key above the anchor and the descending cursor at the last
    /// key below it. The cursors are independent, single-pass, and observe
    /// the structure as it is while they run.
    pub fn entries_at(&self, key: &ScalarKey) -> EntriesAt<'_, V> {
        let found = self.locate(key);
        if found.matching.is_some() {
            let group = self.node(found.matching).group;
            EntriesAt {
                value: Some(self.group(group).entry().1),
                ascending: self.ascend_from(found.matching),
                descending: self.descend_from(found.matching),
            }
        } else {
            EntriesAt {
                value: None,
                ascending: self.ascend_from(self.node(found.predecessor).next),
                descending: self.descend_from(found.predecessor),
            }
        }
    }

    // ========================================================================
    // Segments
    // ========================================================================

    /// Returns the values in a fixed-count neighbourhood of the anchor key:
    /// up to `count_before` values below it (nearest first), the anchor's
    /// own value, and up to `count_after` values above it (nearest first).
    ///
    /// Returns `None` if the anchor key is absent. Walks clamp at the ends
    /// of the map, so oversized counts yield however many entries exist.
    pub fn segment(
        &self,
        key: &ScalarKey,
        count_before: usize,
        count_after: usize,
    ) -> Option<Segment<'_, V>> {
        let (before, anchor, after) = self.segment_nodes(key, count_before, count_after)?;
        Some(Segment {
            before: before.iter().map(|&n| self.node_value(n)).collect(),
            value: self.node_value(anchor),
            after: after.iter().map(|&n| self.node_value(n)).collect(),
        })
    }

    /// Removes the fixed-count neighbourhood of the anchor key (the anchor
    /// entry plus up to `count_before` entries below and `count_after`
    /// above) and returns the removed values in [`segment`](Self::segment)
    /// order.
    ///
    /// Returns `None`, removing nothing, if the anchor key is absent.
    pub fn extract_segment(
        &mut self,
        key: &ScalarKey,
        count_before: usize,
        count_after: usize,
    ) -> Option<SegmentValues<V>> {
        let (before_cells, anchor, after_cells) =
            self.segment_nodes(key, count_before, count_after)?;
        let mut before = Vec::with_capacity(before_cells.len());
        for cell in before_cells {
            let group = self.node(cell).group;
            before.push(self.discard_group(group));
        }
        let value = {
            let group = self.node(anchor).group;
            self.discard_group(group)
        };
        let mut after = Vec::with_capacity(after_cells.len());
        for cell in after_cells {
            let group = self.node(cell).group;
            after.push(self.discard_group(group));
        }
        Some(SegmentValues {
            before,
            value,
            after,
        })
    }

    /// Removes the fixed-count neighbourhood of the anchor key and returns
    /// how many entries were removed on each side.
    ///
    /// Returns `None`, removing nothing, if the anchor key is absent.
    pub fn remove_segment(
        &mut self,
        key: &ScalarKey,
        count_before: usize,
        count_after: usize,
    ) -> Option<RemovedSegment> {
        let (before, anchor, after) = self.segment_nodes(key, count_before, count_after)?;
        let removed = RemovedSegment {
            before: before.len(),
            after: after.len(),
        };
        for cell in before.into_iter().chain(Some(anchor)).chain(after) {
            let group = self.node(cell).group;
            self.discard_group(group);
        }
        Some(removed)
    }

    // ========================================================================
    // Range removal
    // ========================================================================

    /// Removes every entry whose key falls inside `range`, returning the
    /// number removed.
    ///
    /// Bound semantics follow [`std::ops::Bound`]: an `Excluded` bound key
    /// survives, an `Included` bound key is removed with the rest, and an
    /// unbounded side extends through the corresponding extremum. Bound keys
    /// need not exist in the map. A reversed interval, or one that covers no
    /// entries, is a no-op returning 0.
    ///
    /// ```rust
    /// # use strata::{ScalarKey, SkipList};
    /// # use rand::{SeedableRng, rngs::SmallRng};
    /// # let mut map: SkipList<u32, _> = SkipList::new(SmallRng::seed_from_u64(1));
    /// # for i in 0..50 { map.insert(ScalarKey::from(i), i); }
    /// use core::ops::Bound;
    ///
    /// // Open interval: 10 and 20 survive, 11..=19 are removed.
    /// let removed = map.remove_range((
    ///     Bound::Excluded(ScalarKey::from(10)),
    ///     Bound::Excluded(ScalarKey::from(20)),
    /// ));
    /// assert_eq!(removed, 9);
    ///
    /// // Everything below 5, minimum included.
    /// map.remove_range(..ScalarKey::from(5));
    /// ```
    pub fn remove_range<B>(&mut self, range: B) -> usize
    where
        B: RangeBounds<ScalarKey>,
    {
        let start = match range.start_bound() {
            Bound::Unbounded => self.bottom_first(),
            Bound::Included(key) => {
                let found = self.locate(key);
                if found.matching.is_some() {
                    found.matching
                } else {
                    self.node(found.predecessor).next
                }
            }
            Bound::Excluded(key) => {
                let found = self.locate(key);
                if found.matching.is_some() {
                    self.node(found.matching).next
                } else {
                    self.node(found.predecessor).next
                }
            }
        };
        let end = match range.end_bound() {
            Bound::Unbounded => self.bottom_last(),
            Bound::Included(key) => {
                let found = self.locate(key);
                if found.matching.is_some() {
                    found.matching
                } else {
                    found.predecessor
                }
            }
            Bound::Excluded(key) => self.locate(key).predecessor,
        };

        // A sentinel on either side means the interval covers nothing.
        if self.group(self.node(start).group).is_sentinel()
            || self.group(self.node(end).group).is_sentinel()
        {
            return 0;
        }
        // Reversed interval: well-defined no-op.
        {
            let (start_key, _) = self.group(self.node(start).group).entry();
            let (end_key, _) = self.group(self.node(end).group).entry();
            if start_key.cmp(end_key) == Ordering::Greater {
                return 0;
            }
        }

        let mut removed = 0;
        let mut current = start;
        loop {
            let at_end = current == end;
            let next = self.node(current).next;
            let group = self.node(current).group;
            self.discard_group(group);
            removed += 1;
            if at_end {
                break;
            }
            current = next;
        }
        removed
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    #[inline]
    fn node(&self, cell: NodeRef) -> &Node {
        debug_assert!(cell.is_some(), "NONE node handle dereferenced");
        self.nodes.get(cell.as_usize()).expect("invalid node handle")
    }

    #[inline]
    fn node_mut(&mut self, cell: NodeRef) -> &mut Node {
        debug_assert!(cell.is_some(), "NONE node handle dereferenced");
        self.nodes
            .get_mut(cell.as_usize())
            .expect("invalid node handle")
    }

    #[inline]
    fn group(&self, group: GroupRef) -> &Group<V> {
        debug_assert!(group.is_some(), "NONE group handle dereferenced");
        self.groups
            .get(group.as_usize())
            .expect("invalid group handle")
    }

    #[inline]
    fn group_mut(&mut self, group: GroupRef) -> &mut Group<V> {
        debug_assert!(group.is_some(), "NONE group handle dereferenced");
        self.groups
            .get_mut(group.as_usize())
            .expect("invalid group handle")
    }

    #[inline]
    fn layer_count(&self) -> usize {
        self.group(self.head).nodes.len()
    }

    /// Head sentinel's cell in the given layer.
    #[inline]
    fn head_node(&self, layer: usize) -> NodeRef {
        self.group(self.head).nodes[layer]
    }

    /// First bottom-layer cell after the head sentinel; the tail sentinel's
    /// cell when the map is empty.
    #[inline]
    fn bottom_first(&self) -> NodeRef {
        self.node(self.head_node(0)).next
    }

    /// Last bottom-layer cell before the tail sentinel; the head sentinel's
    /// cell when the map is empty.
    #[inline]
    fn bottom_last(&self) -> NodeRef {
        let tail_bottom = self.group(self.tail).nodes[0];
        self.node(tail_bottom).prev
    }

    /// Entry key/value at a cell known not to be a sentinel's.
    #[inline]
    fn node_value(&self, cell: NodeRef) -> &V {
        self.group(self.node(cell).group).entry().1
    }

    /// Entry key/value at a cell, or `None` when the cell belongs to a
    /// sentinel.
    fn entry_at(&self, cell: NodeRef) -> Option<(&ScalarKey, &V)> {
        match &self.group(self.node(cell).group).kind {
            GroupKind::Entry { key, value } => Some((key, value)),
            _ => None,
        }
    }

    /// Creates the sentinel pair and the first layer.
    fn bootstrap(&mut self) {
        let head = GroupRef::from_usize(self.groups.insert(Group {
            kind: GroupKind::Head,
            nodes: Vec::new(),
        }));
        let tail = GroupRef::from_usize(self.groups.insert(Group {
            kind: GroupKind::Tail,
            nodes: Vec::new(),
        }));
        self.head = head;
        self.tail = tail;
        self.push_layer();
    }

    /// Materializes a new empty layer above the current top and returns its
    /// head-sentinel cell.
    fn push_layer(&mut self) -> NodeRef {
        let head_cell = NodeRef::from_usize(self.nodes.insert(Node {
            prev: NodeRef::NONE,
            next: NodeRef::NONE,
            group: self.head,
        }));
        let tail_cell = NodeRef::from_usize(self.nodes.insert(Node {
            prev: head_cell,
            next: NodeRef::NONE,
            group: self.tail,
        }));
        self.node_mut(head_cell).next = tail_cell;
        self.group_mut(self.head).nodes.push(head_cell);
        self.group_mut(self.tail).nodes.push(tail_cell);
        head_cell
    }

    /// Splices a new cell for `group` between `prev` and `next` in one
    /// layer.
    fn link_after(&mut self, prev: NodeRef, next: NodeRef, group: GroupRef) -> NodeRef {
        let cell = NodeRef::from_usize(self.nodes.insert(Node { prev, next, group }));
        self.node_mut(prev).next = cell;
        self.node_mut(next).prev = cell;
        cell
    }

    /// Unlinks a group's cell from every layer it occupies, frees the arena
    /// slots, and returns the entry's value.
    fn discard_group(&mut self, group: GroupRef) -> V {
        let cells = core::mem::take(&mut self.group_mut(group).nodes);
        for cell in cells {
            let Node { prev, next, .. } = self.nodes.remove(cell.as_usize());
            self.node_mut(prev).next = next;
            self.node_mut(next).prev = prev;
        }
        if let Some(len) = &mut self.len {
            *len -= 1;
        }
        match self.groups.remove(group.as_usize()).kind {
            GroupKind::Entry { value, .. } => value,
            _ => panic!("attempted to discard a sentinel group"),
        }
    }

    /// Predecessor search: descends from the top layer, advancing while the
    /// probe key sorts below the target and recording, per layer, the
    /// rightmost cell that does. The single traversal primitive behind
    /// every operation.
    fn locate(&self, key: &ScalarKey) -> Located {
        let mut path = vec![NodeRef::NONE; self.layer_count()];
        let mut layer = self.layer_count() - 1;
        let mut current = self.head_node(layer);
        let mut last_visited = current;

        loop {
            let node = self.node(current);
            let advance = match &self.group(node.group).kind {
                GroupKind::Head => true,
                GroupKind::Tail => false,
                GroupKind::Entry { key: probe, .. } => match probe.cmp(key) {
                    Ordering::Less => true,
                    Ordering::Greater => false,
                    Ordering::Equal => {
                        let matching = self.group(node.group).nodes[0];
                        return Located {
                            matching,
                            predecessor: self.node(matching).prev,
                            path,
                        };
                    }
                },
            };

            if advance {
                last_visited = current;
                current = node.next;
                continue;
            }

            path[layer] = last_visited;
            if layer == 0 {
                return Located {
                    matching: NodeRef::NONE,
                    predecessor: last_visited,
                    path,
                };
            }
            layer -= 1;
            current = self.group(self.node(last_visited).group).nodes[layer];
        }
    }

    /// Resolves the cells of a fixed-count segment around an exactly
    /// matching anchor, clamping both walks at the sentinels.
    fn segment_nodes(
        &self,
        key: &ScalarKey,
        count_before: usize,
        count_after: usize,
    ) -> Option<(Vec<NodeRef>, NodeRef, Vec<NodeRef>)> {
        let found = self.locate(key);
        if found.matching.is_none() {
            return None;
        }
        let anchor = found.matching;

        let mut before = Vec::new();
        let mut current = anchor;
        for _ in 0..count_before {
            current = self.node(current).prev;
            if self.group(self.node(current).group).is_sentinel() {
                break;
            }
            before.push(current);
        }

        let mut after = Vec::new();
        current = anchor;
        for _ in 0..count_after {
            current = self.node(current).next;
            if self.group(self.node(current).group).is_sentinel() {
                break;
            }
            after.push(current);
        }

        Some((before, anchor, after))
    }

    #[inline]
    fn ascend_from(&self, cell: NodeRef) -> Ascend<'_, V> {
        Ascend {
            nodes: &self.nodes,
            groups: &self.groups,
            current: cell,
            index: 0,
        }
    }

    #[inline]
    fn descend_from(&self, cell: NodeRef) -> Descend<'_, V> {
        Descend {
            nodes: &self.nodes,
            groups: &self.groups,
            current: cell,
            index: 0,
        }
    }
}

// ============================================================================
// Segment results
// ============================================================================

/// Borrowed values around a segment anchor. See [`SkipList::segment`].
#[derive(Debug)]
pub struct Segment<'a, V> {
    /// Values below the anchor, nearest first.
    pub before: Vec<&'a V>,
    /// The anchor entry's value.
    pub value: &'a V,
    /// Values above the anchor, nearest first.
    pub after: Vec<&'a V>,
}

/// Owned values removed by [`SkipList::extract_segment`].
#[derive(Debug)]
pub struct SegmentValues<V> {
    /// Removed values from below the anchor, nearest first.
    pub before: Vec<V>,
    /// The anchor entry's value.
    pub value: V,
    /// Removed values from above the anchor, nearest first.
    pub after: Vec<V>,
}

/// Per-side counts removed by [`SkipList::remove_segment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemovedSegment {
    /// Entries removed below the anchor.
    pub before: usize,
    /// Entries removed above the anchor.
    pub after: usize,
}

impl RemovedSegment {
    /// Total entries removed, anchor included.
    pub fn total(self) -> usize {
        self.before + self.after + 1
    }
}

// ============================================================================
// Cursors
// ============================================================================

/// The pair of cursors anchored by [`SkipList::entries_at`].
pub struct EntriesAt<'a, V> {
    /// Value of the exactly-matching entry, if the anchor key is present.
    pub value: Option<&'a V>,
    /// Cursor walking upward from the anchor, match included.
    pub ascending: Ascend<'a, V>,
    /// Cursor walking downward from the anchor, match included.
    pub descending: Descend<'a, V>,
}

/// Forward cursor yielding `(index, key, value)` in ascending key order.
///
/// `index` counts yielded entries from 0. The cursor is fused: once the tail
/// sentinel is reached it yields `None` forever.
pub struct Ascend<'a, V> {
    nodes: &'a Slab<Node>,
    groups: &'a Slab<Group<V>>,
    current: NodeRef,
    index: usize,
}

impl<'a, V> Iterator for Ascend<'a, V> {
    type Item = (usize, &'a ScalarKey, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_none() {
            return None;
        }
        let node = self
            .nodes
            .get(self.current.as_usize())
            .expect("invalid cursor cell");
        let group = self
            .groups
            .get(node.group.as_usize())
            .expect("invalid cursor group");
        match &group.kind {
            GroupKind::Entry { key, value } => {
                let item = (self.index, key, value);
                self.index += 1;
                self.current = node.next;
                Some(item)
            }
            _ => {
                self.current = NodeRef::NONE;
                None
            }
        }
    }
}

impl<V> FusedIterator for Ascend<'_, V> {}

/// Backward cursor yielding `(index, key, value)` in descending key order.
///
/// `index` counts yielded entries from 0. The cursor is fused: once the head
/// sentinel is reached it yields `None` forever.
pub struct Descend<'a, V> {
    nodes: &'a Slab<Node>,
    groups: &'a Slab<Group<V>>,
    current: NodeRef,
    index: usize,
}

impl<'a, V> Iterator for Descend<'a, V> {
    type Item = (usize, &'a ScalarKey, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_none() {
            return None;
        }
        let node = self
            .nodes
            .get(self.current.as_usize())
            .expect("invalid cursor cell");
        let group = self
            .groups
            .get(node.group.as_usize())
            .expect("invalid cursor group");
        match &group.kind {
            GroupKind::Entry { key, value } => {
                let item = (self.index, key, value);
                self.index += 1;
                self.current = node.prev;
                Some(item)
            }
            _ => {
                self.current = NodeRef::NONE;
                None
            }
        }
    }
}

impl<V> FusedIterator for Descend<'_, V> {}

/// Iterator over keys in ascending order.
pub struct Keys<'a, V> {
    inner: Ascend<'a, V>,
}

impl<'a, V> Iterator for Keys<'a, V> {
    type Item = &'a ScalarKey;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, key, _)| key)
    }
}

impl<V> FusedIterator for Keys<'_, V> {}

/// Iterator over values in ascending key order.
pub struct Values<'a, V> {
    inner: Ascend<'a, V>,
}

impl<'a, V> Iterator for Values<'a, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, _, value)| value)
    }
}

impl<V> FusedIterator for Values<'_, V> {}
