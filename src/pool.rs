//! Unit allocation and recycling.
//!
//! Buffers never allocate segment storage directly; they go through the
//! [`UnitPool`] capability. The provided [`LocalPool`] keeps one free
//! list per thread per capacity class, so recycling never crosses a
//! thread boundary and never takes a lock. The recycling contract is
//! enforced by move semantics: [`UnitPool::give`] consumes the unit, so
//! the previous owner cannot touch it again.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::unit::Unit;

/// Default capacity for units allocated without an explicit hint.
pub const DEFAULT_UNIT_CAPACITY: usize = 4096;

/// Maximum recycled units retained per capacity class per thread.
const MAX_RETAINED_PER_CLASS: usize = 32;

/// Allocates and recycles [`Unit`]s.
///
/// Implementations must hand out empty units: `size() == 0`,
/// `start() == 0`, cursor and mark at zero, regardless of whether the
/// instance is fresh or recycled.
pub trait UnitPool {
    /// Obtain a unit with capacity of at least `min_capacity`.
    fn take(&self, min_capacity: usize) -> Unit;

    /// Return a unit for reuse. The unit is cleared before it can be
    /// observed again through [`take`](UnitPool::take).
    fn give(&self, unit: Unit);
}

thread_local! {
    static FREE_LISTS: RefCell<HashMap<usize, Vec<Unit>>> = RefCell::new(HashMap::new());
}

/// Thread-local unit pool.
///
/// A zero-sized handle: every thread that touches it gets its own free
/// lists, keyed by exact unit capacity. Buffers that migrate between
/// threads (via ownership transfer) recycle into whichever thread drops
/// them, which keeps the pool contention-free by construction.
///
/// # Examples
///
/// ```
/// use chainbuf::pool::{LocalPool, UnitPool};
///
/// let pool = LocalPool;
/// let mut unit = pool.take(64);
/// assert_eq!(unit.capacity(), 64);
/// unit.push_slice(b"data");
/// pool.give(unit);
///
/// // The recycled instance comes back empty.
/// let unit = pool.take(64);
/// assert_eq!(unit.size(), 0);
/// assert_eq!(unit.start(), 0);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalPool;

impl UnitPool for LocalPool {
    fn take(&self, min_capacity: usize) -> Unit {
        let capacity = min_capacity.max(1);
        let recycled = FREE_LISTS.with(|lists| {
            lists
                .borrow_mut()
                .get_mut(&capacity)
                .and_then(Vec::pop)
        });
        match recycled {
            Some(unit) => {
                tracing::trace!(capacity, "unit recycled from local pool");
                unit
            }
            None => {
                tracing::trace!(capacity, "unit allocated");
                Unit::new(capacity)
            }
        }
    }

    fn give(&self, mut unit: Unit) {
        unit.clear();
        FREE_LISTS.with(|lists| {
            let mut lists = lists.borrow_mut();
            let list = lists.entry(unit.capacity()).or_default();
            if list.len() < MAX_RETAINED_PER_CLASS {
                tracing::trace!(capacity = unit.capacity(), "unit returned to local pool");
                list.push(unit);
            }
            // Over the retention cap the unit is simply dropped.
        });
    }
}
