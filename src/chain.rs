//! The unit chain: a circular doubly-linked ring of storage units.
//!
//! Nodes live in an arena (a slab of slots with a free list) and are
//! addressed by [`NodeId`] handles that carry a generation counter, so a
//! handle that outlives its node is detected instead of silently
//! corrupting the ring. The ring has no separate sentinel: the head node
//! IS the first unit's node, and "one past the end" is the wrap back to
//! head.
//!
//! The chain also owns the shared read cursor (the *position node*) and
//! the *mark node*. The structural invariant maintained by every
//! operation here is that units strictly before the position node are
//! fully consumed and units strictly after it are untouched.

use crate::pool::{LocalPool, UnitPool, DEFAULT_UNIT_CAPACITY};
use crate::unit::Unit;

/// A generation-checked handle to a chain node.
///
/// Stale handles (referring to a node that has since been recycled) are
/// rejected with a panic on access rather than resolving to whatever
/// unit happens to occupy the slot now.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl std::fmt::Debug for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NodeId({}:{})", self.index, self.generation)
    }
}

struct Node {
    unit: Unit,
    next: NodeId,
    prev: NodeId,
}

enum Slot {
    Occupied { node: Node, generation: u32 },
    Vacant { next_free: Option<u32>, generation: u32 },
}

/// A circular doubly-linked sequence of [`Unit`]s backing one buffer.
///
/// Generic over the [`UnitPool`] that supplies fresh units and receives
/// recycled ones. All splice operations are O(1) index relinking; no
/// payload bytes move.
pub struct UnitChain<P: UnitPool = LocalPool> {
    slots: Vec<Slot>,
    free_head: Option<u32>,
    node_count: usize,
    head: NodeId,
    position: NodeId,
    mark: NodeId,
    unit_capacity: usize,
    pool: P,
}

impl<P: UnitPool> UnitChain<P> {
    /// Create a chain holding one empty unit of `unit_capacity`.
    pub fn new(pool: P, unit_capacity: usize) -> Self {
        let first = pool.take(unit_capacity);
        let mut chain = Self {
            slots: Vec::new(),
            free_head: None,
            node_count: 0,
            head: NodeId { index: 0, generation: 0 },
            position: NodeId { index: 0, generation: 0 },
            mark: NodeId { index: 0, generation: 0 },
            unit_capacity,
            pool,
        };
        let id = chain.alloc(first);
        chain.head = id;
        chain.position = id;
        chain.mark = id;
        chain
    }

    /// Create a chain from a sequence of units, in order. An empty
    /// sequence yields a chain with one fresh empty unit. The cursor is
    /// normalized to the first unit with unread data.
    pub fn from_units<I: IntoIterator<Item = Unit>>(
        pool: P,
        unit_capacity: usize,
        units: I,
    ) -> Self {
        let mut iter = units.into_iter();
        let mut chain = match iter.next() {
            Some(first) => {
                let mut chain = Self {
                    slots: Vec::new(),
                    free_head: None,
                    node_count: 0,
                    head: NodeId { index: 0, generation: 0 },
                    position: NodeId { index: 0, generation: 0 },
                    mark: NodeId { index: 0, generation: 0 },
                    unit_capacity,
                    pool,
                };
                let id = chain.alloc(first);
                chain.head = id;
                chain.position = id;
                chain.mark = id;
                chain
            }
            None => return Self::new(pool, unit_capacity),
        };
        for unit in iter {
            chain.append_unit(unit);
        }
        chain.normalize_cursor();
        chain
    }

    /// The capacity hint used for fresh units.
    #[must_use]
    pub fn unit_capacity(&self) -> usize {
        self.unit_capacity
    }

    /// Number of nodes in the ring. Always at least one.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    // === Slot arena ===

    fn alloc(&mut self, unit: Unit) -> NodeId {
        let id = match self.free_head {
            Some(index) => {
                let slot = &self.slots[index as usize];
                let Slot::Vacant { next_free, generation } = slot else {
                    unreachable!("free list points at occupied slot");
                };
                let generation = *generation;
                self.free_head = *next_free;
                let id = NodeId { index, generation };
                self.slots[index as usize] = Slot::Occupied {
                    node: Node { unit, next: id, prev: id },
                    generation,
                };
                id
            }
            None => {
                let index = u32::try_from(self.slots.len()).expect("chain node count overflow");
                let id = NodeId { index, generation: 0 };
                self.slots.push(Slot::Occupied {
                    node: Node { unit, next: id, prev: id },
                    generation: 0,
                });
                id
            }
        };
        self.node_count += 1;
        id
    }

    fn free(&mut self, id: NodeId) -> Unit {
        let slot = &mut self.slots[id.index as usize];
        match slot {
            Slot::Occupied { generation, .. } if *generation == id.generation => {
                let next_gen = generation.wrapping_add(1);
                let old = std::mem::replace(
                    slot,
                    Slot::Vacant {
                        next_free: self.free_head,
                        generation: next_gen,
                    },
                );
                self.free_head = Some(id.index);
                self.node_count -= 1;
                let Slot::Occupied { node, .. } = old else { unreachable!() };
                node.unit
            }
            _ => panic!("stale node handle: {id:?}"),
        }
    }

    fn node(&self, id: NodeId) -> &Node {
        match &self.slots[id.index as usize] {
            Slot::Occupied { node, generation } if *generation == id.generation => node,
            _ => panic!("stale node handle: {id:?}"),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        match &mut self.slots[id.index as usize] {
            Slot::Occupied { node, generation } if *generation == id.generation => node,
            _ => panic!("stale node handle: {id:?}"),
        }
    }

    /// The unit held by `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    #[must_use]
    pub fn unit(&self, id: NodeId) -> &Unit {
        &self.node(id).unit
    }

    /// Mutable access to the unit held by `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn unit_mut(&mut self, id: NodeId) -> &mut Unit {
        &mut self.node_mut(id).unit
    }

    // === Ring traversal ===

    /// The head node: the first unit in the chain.
    #[must_use]
    pub fn head_id(&self) -> NodeId {
        self.head
    }

    /// The last node in the chain.
    #[must_use]
    pub fn last_id(&self) -> NodeId {
        self.node(self.head).prev
    }

    /// The node currently under the read cursor.
    #[must_use]
    pub fn position_id(&self) -> NodeId {
        self.position
    }

    /// The node holding the mark.
    #[must_use]
    pub fn mark_id(&self) -> NodeId {
        self.mark
    }

    /// The node after `id`, or `None` at the wrap back to head.
    #[must_use]
    pub fn next_id(&self, id: NodeId) -> Option<NodeId> {
        let next = self.node(id).next;
        (next != self.head).then_some(next)
    }

    /// The node before `id`, or `None` when `id` is the head.
    #[must_use]
    pub fn prev_id(&self, id: NodeId) -> Option<NodeId> {
        (id != self.head).then(|| self.node(id).prev)
    }

    /// Iterate node ids from head to tail.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        let mut cursor = Some(self.head);
        std::iter::from_fn(move || {
            let id = cursor?;
            cursor = self.next_id(id);
            Some(id)
        })
    }

    // === Cursor ===

    /// The unit under the cursor.
    #[must_use]
    pub fn current_unit(&self) -> &Unit {
        self.unit(self.position)
    }

    /// Mutable access to the unit under the cursor.
    pub fn current_unit_mut(&mut self) -> &mut Unit {
        let id = self.position;
        self.unit_mut(id)
    }

    /// Advance the cursor to the next node. Returns false (leaving the
    /// cursor in place) when the cursor is already on the last node.
    pub fn advance_position(&mut self) -> bool {
        match self.next_id(self.position) {
            Some(next) => {
                self.position = next;
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_position_id(&mut self, id: NodeId) {
        self.position = id;
    }

    pub(crate) fn set_mark_id(&mut self, id: NodeId) {
        self.mark = id;
    }

    /// Sum of every unit's size.
    #[must_use]
    pub fn total_size(&self) -> usize {
        self.ids().map(|id| self.unit(id).size()).sum()
    }

    /// Consumed bytes: per-unit positions up to and including the
    /// position node.
    #[must_use]
    pub fn position_offset(&self) -> usize {
        let mut total = 0;
        for id in self.ids() {
            total += self.unit(id).position();
            if id == self.position {
                break;
            }
        }
        total
    }

    /// Unread bytes from the cursor to the end of the chain.
    #[must_use]
    pub fn remaining(&self) -> usize {
        let mut total = 0;
        let mut id = Some(self.position);
        while let Some(n) = id {
            total += self.unit(n).remaining();
            id = self.next_id(n);
        }
        total
    }

    /// Advance the cursor by exactly `n` bytes.
    ///
    /// # Panics
    ///
    /// Panics if fewer than `n` unread bytes remain; callers validate
    /// first.
    pub(crate) fn consume(&mut self, mut n: usize) {
        while n > 0 {
            let rem = self.current_unit().remaining();
            if rem >= n {
                self.current_unit_mut().advance(n);
                return;
            }
            self.current_unit_mut().advance(rem);
            n -= rem;
            assert!(self.advance_position(), "consume past end of chain");
        }
    }

    /// Point the cursor (and mark) at the first unit with unread data,
    /// or the last unit when everything is consumed.
    pub(crate) fn normalize_cursor(&mut self) {
        let mut chosen = self.last_id();
        for id in self.ids() {
            if self.unit(id).remaining() > 0 {
                chosen = id;
                break;
            }
        }
        self.position = chosen;
        self.mark = chosen;
    }

    // === Splicing ===

    fn splice_before_head(&mut self, unit: Unit) -> NodeId {
        let tail = self.last_id();
        let head = self.head;
        let id = self.alloc(unit);
        self.node_mut(id).prev = tail;
        self.node_mut(id).next = head;
        self.node_mut(tail).next = id;
        self.node_mut(head).prev = id;
        id
    }

    /// Splice a unit onto the tail. O(1).
    pub fn append_unit(&mut self, unit: Unit) -> NodeId {
        self.splice_before_head(unit)
    }

    /// Splice a unit in front of the head; the new node becomes the
    /// head, and the cursor and mark move to it. O(1).
    ///
    /// Prepending assumes nothing has been consumed yet; the buffer
    /// façade enforces that before calling in.
    pub fn prepend_unit(&mut self, unit: Unit) -> NodeId {
        let id = self.splice_before_head(unit);
        self.head = id;
        self.position = id;
        self.mark = id;
        id
    }

    /// Append a fresh unit from the pool, at least `min_capacity` big.
    pub fn append_fresh(&mut self, min_capacity: usize) -> NodeId {
        let unit = self.pool.take(self.unit_capacity.max(min_capacity));
        tracing::trace!(nodes = self.node_count, "chain grew by one unit");
        self.append_unit(unit)
    }

    /// The last unit if it still has tail headroom, else a freshly
    /// appended one. Every codec writes through this single choke point.
    pub fn writable_tail(&mut self) -> NodeId {
        let last = self.last_id();
        if self.unit(last).is_appendable() {
            last
        } else {
            self.append_fresh(self.unit_capacity)
        }
    }

    /// The first unit if it still has head headroom, else a fresh unit
    /// spliced in front with its whole capacity as headroom. The mirror
    /// choke point for prepends.
    pub fn prependable_head(&mut self) -> NodeId {
        if self.unit(self.head).is_prependable() {
            self.head
        } else {
            let mut unit = self.pool.take(self.unit_capacity);
            unit.open_head_room();
            self.prepend_unit(unit)
        }
    }

    // === Structural removal ===

    /// Remove the head node and return its unit. The next node becomes
    /// the head; cursor and mark move off the removed node if they were
    /// on it.
    ///
    /// # Panics
    ///
    /// Panics if the chain has a single node.
    pub(crate) fn remove_head(&mut self) -> Unit {
        assert!(self.node_count > 1, "cannot remove the only node");
        let old = self.head;
        let next = self.node(old).next;
        let tail = self.node(old).prev;
        self.node_mut(tail).next = next;
        self.node_mut(next).prev = tail;
        self.head = next;
        if self.position == old {
            self.position = next;
        }
        if self.mark == old {
            self.mark = next;
        }
        self.free(old)
    }

    /// Remove `id` and every node after it, returning their units in
    /// chain order. When that empties the ring, a fresh unit takes over
    /// as head.
    pub(crate) fn detach_from(&mut self, id: NodeId) -> Vec<Unit> {
        let mut ids = Vec::new();
        let mut cursor = Some(id);
        while let Some(n) = cursor {
            ids.push(n);
            cursor = self.next_id(n);
        }
        let mut units = Vec::with_capacity(ids.len());
        for n in ids {
            if self.node_count == 1 {
                // Last node: swap its unit out for a fresh one.
                let fresh = self.pool.take(self.unit_capacity);
                let unit = std::mem::replace(&mut self.node_mut(n).unit, fresh);
                units.push(unit);
            } else if n == self.head {
                units.push(self.remove_head());
            } else {
                let prev = self.node(n).prev;
                let next = self.node(n).next;
                self.node_mut(prev).next = next;
                self.node_mut(next).prev = prev;
                if self.position == n {
                    self.position = prev;
                }
                if self.mark == n {
                    self.mark = prev;
                }
                units.push(self.free(n));
            }
        }
        self.normalize_cursor();
        units
    }

    /// Remove every node, returning all units; one fresh empty unit is
    /// left as the head.
    pub(crate) fn detach_all(&mut self) -> Vec<Unit> {
        let head = self.head;
        self.detach_from(head)
    }

    /// Return a unit to the pool.
    pub(crate) fn recycle(&self, unit: Unit) {
        self.pool.give(unit);
    }

    // === Read-only windows ===

    /// Iterate the unread windows from the cursor to the end of the
    /// chain, skipping empty ones.
    pub fn windows(&self) -> impl Iterator<Item = &[u8]> + '_ {
        let mut cursor = Some(self.position);
        std::iter::from_fn(move || loop {
            let id = cursor?;
            cursor = self.next_id(id);
            let window = self.unit(id).readable();
            if !window.is_empty() {
                return Some(window);
            }
        })
    }

    /// The flattened view handed to charset decoders: one read-only
    /// window per unit touched by `[index, index + len)`.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfBounds`](crate::BufferError::OutOfBounds) when the
    /// range does not fit within the chain's content.
    pub fn window_slices(&self, index: usize, len: usize) -> crate::error::Result<Vec<&[u8]>> {
        let size = self.total_size();
        if index.checked_add(len).map_or(true, |end| end > size) {
            return Err(crate::error::BufferError::OutOfBounds { index, size });
        }
        let mut slices = Vec::new();
        let mut skip = index;
        let mut rest = len;
        for id in self.ids() {
            if rest == 0 {
                break;
            }
            let contents = self.unit(id).contents();
            if skip >= contents.len() {
                skip -= contents.len();
                continue;
            }
            let window = &contents[skip..];
            skip = 0;
            let take = window.len().min(rest);
            slices.push(&window[..take]);
            rest -= take;
        }
        Ok(slices)
    }

    pub(crate) fn pool(&self) -> &P {
        &self.pool
    }
}

impl<P: UnitPool> Drop for UnitChain<P> {
    fn drop(&mut self) {
        for slot in &mut self.slots {
            if matches!(slot, Slot::Occupied { .. }) {
                let old = std::mem::replace(
                    slot,
                    Slot::Vacant { next_free: None, generation: 0 },
                );
                let Slot::Occupied { node, .. } = old else { unreachable!() };
                self.pool.give(node.unit);
            }
        }
    }
}

impl<P: UnitPool> std::fmt::Debug for UnitChain<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitChain")
            .field("nodes", &self.node_count)
            .field("size", &self.total_size())
            .field("position", &self.position_offset())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::LocalPool;

    fn chain(unit_capacity: usize) -> UnitChain<LocalPool> {
        UnitChain::new(LocalPool, unit_capacity)
    }

    #[test]
    fn test_chain_starts_with_one_empty_unit() {
        let chain = chain(8);
        assert_eq!(chain.node_count(), 1);
        assert_eq!(chain.total_size(), 0);
        assert_eq!(chain.head_id(), chain.last_id());
        assert_eq!(chain.head_id(), chain.position_id());
    }

    #[test]
    fn test_chain_append_links_ring() {
        let mut chain = chain(4);
        let a = chain.head_id();
        let mut unit = Unit::new(4);
        unit.push_slice(b"xy");
        let b = chain.append_unit(unit);
        assert_eq!(chain.node_count(), 2);
        assert_eq!(chain.next_id(a), Some(b));
        assert_eq!(chain.next_id(b), None);
        assert_eq!(chain.prev_id(b), Some(a));
        assert_eq!(chain.prev_id(a), None);
        assert_eq!(chain.last_id(), b);
    }

    #[test]
    fn test_chain_prepend_moves_head_and_cursor() {
        let mut chain = chain(4);
        chain.unit_mut(chain.head_id()).push_slice(b"cd");
        let mut front = Unit::new(4);
        front.push_slice(b"ab");
        let id = chain.prepend_unit(front);
        assert_eq!(chain.head_id(), id);
        assert_eq!(chain.position_id(), id);
        let bytes: Vec<u8> = chain.windows().flatten().copied().collect();
        assert_eq!(bytes, b"abcd");
    }

    #[test]
    fn test_chain_writable_tail_appends_when_full() {
        let mut chain = chain(2);
        let first = chain.writable_tail();
        chain.unit_mut(first).push_slice(b"ab");
        let second = chain.writable_tail();
        assert_ne!(first, second);
        assert_eq!(chain.node_count(), 2);
    }

    #[test]
    fn test_chain_prependable_head_splices_fresh_unit() {
        let mut chain = chain(2);
        // Fresh unit has start == 0, so the chain must splice one in
        // front with full head headroom.
        let id = chain.prependable_head();
        assert_eq!(id, chain.head_id());
        assert_eq!(chain.unit(id).head_room(), 2);
        assert_eq!(chain.node_count(), 2);
    }

    #[test]
    fn test_chain_consume_crosses_units() {
        let mut chain = chain(2);
        let a = chain.head_id();
        chain.unit_mut(a).push_slice(b"ab");
        let mut u = Unit::new(2);
        u.push_slice(b"cd");
        let b = chain.append_unit(u);
        chain.consume(3);
        assert_eq!(chain.position_id(), b);
        assert_eq!(chain.position_offset(), 3);
        assert_eq!(chain.remaining(), 1);
    }

    #[test]
    fn test_chain_detach_from_keeps_one_node() {
        let mut chain = chain(2);
        chain.unit_mut(chain.head_id()).push_slice(b"ab");
        let mut u = Unit::new(2);
        u.push_slice(b"cd");
        chain.append_unit(u);

        let units = chain.detach_all();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].contents(), b"ab");
        assert_eq!(units[1].contents(), b"cd");
        assert_eq!(chain.node_count(), 1);
        assert_eq!(chain.total_size(), 0);
    }

    #[test]
    fn test_chain_window_slices() {
        let mut chain = chain(2);
        chain.unit_mut(chain.head_id()).push_slice(b"ab");
        let mut u = Unit::new(2);
        u.push_slice(b"cd");
        chain.append_unit(u);

        let slices = chain.window_slices(1, 2).unwrap();
        let flat: Vec<u8> = slices.into_iter().flatten().copied().collect();
        assert_eq!(flat, b"bc");

        assert!(chain.window_slices(3, 2).is_err());
        assert!(chain.window_slices(0, 4).is_ok());
    }

    #[test]
    #[should_panic(expected = "stale node handle")]
    fn test_chain_stale_handle_detected() {
        let mut chain = chain(2);
        let mut u = Unit::new(2);
        u.push_slice(b"cd");
        chain.append_unit(u);
        let old_head = chain.head_id();
        let unit = chain.remove_head();
        chain.recycle(unit);
        let _ = chain.unit(old_head);
    }

    #[test]
    fn test_chain_slot_reuse_bumps_generation() {
        let mut chain = chain(2);
        let mut u = Unit::new(2);
        u.push_slice(b"cd");
        chain.append_unit(u);
        let old_head = chain.head_id();
        let unit = chain.remove_head();
        chain.recycle(unit);

        // Reusing the freed slot must not resurrect the old handle.
        let id = chain.append_unit(Unit::new(2));
        assert_eq!(id.index, old_head.index);
        assert_ne!(id.generation, old_head.generation);
    }
}
