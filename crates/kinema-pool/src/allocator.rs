//! Variable-width index allocation with coalescing free ranges.
//!
//! [`IndexAllocator`] hands out contiguous ranges of a logical slot space
//! `[0, capacity)`. It never touches payload data: growth and relocation
//! are announced through [`AllocatorCallbacks`], and whoever owns the data
//! columns reacts to them.
//!
//! # Bookkeeping
//!
//! ```text
//! capacity = 8
//!  slot:   0   1   2   3   4   5   6   7
//!         [u1][u3........][f2....][u1][f1]
//!  used:  {0 → 1, 1 → 3, 6 → 1}
//!  free:  {4 → 2, 7 → 1}
//! ```
//!
//! Both maps are ordered by start index. Free ranges are coalesced on every
//! release, so two free ranges never touch. Capacity only shrinks inside
//! [`defragment`](IndexAllocator::defragment).

use std::collections::BTreeMap;

use kinema_core::{AllocatorCallbacks, ConsistencyError, Dimension, PoolError, SlotIndex};
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use crate::config::PoolConfig;

/// One range moved by [`IndexAllocator::defragment`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Relocation {
    /// Base index before the move.
    pub old: SlotIndex,
    /// Base index after the move.
    pub new: SlotIndex,
    /// Width of the moved range.
    pub dimension: Dimension,
}

/// Outcome of one defragmentation pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[must_use]
pub struct DefragReport {
    /// Ranges that moved, in ascending order of their old base.
    pub relocations: SmallVec<[Relocation; 8]>,
    /// Capacity before the pass.
    pub old_capacity: u32,
    /// Capacity after the pass.
    pub new_capacity: u32,
}

impl DefragReport {
    /// Whether the pass changed nothing.
    pub fn is_noop(&self) -> bool {
        self.relocations.is_empty() && self.old_capacity == self.new_capacity
    }

    /// Number of relocated ranges.
    pub fn moves(&self) -> usize {
        self.relocations.len()
    }
}

/// First-fit allocator over variable-width slot ranges.
#[derive(Clone, Debug)]
pub struct IndexAllocator {
    /// Free ranges: start → length.
    free: BTreeMap<u32, u32>,
    /// Live allocations: base → dimension.
    used: BTreeMap<u32, Dimension>,
    /// Logical slot count.
    capacity: u32,
    /// Sum of live dimensions.
    used_slots: u32,
    growth_step: u32,
    max_capacity: u32,
}

impl IndexAllocator {
    /// Create an allocator whose whole initial capacity is free.
    ///
    /// The caller is responsible for sizing its storage to
    /// `config.initial_capacity`; no callback fires here.
    pub fn new(config: &PoolConfig) -> Self {
        let mut free = BTreeMap::new();
        if config.initial_capacity > 0 {
            free.insert(0, config.initial_capacity);
        }
        Self {
            free,
            used: BTreeMap::new(),
            capacity: config.initial_capacity,
            used_slots: 0,
            growth_step: config.growth_step.max(1),
            max_capacity: config.max_capacity,
        }
    }

    /// Allocate `dimension` contiguous slots and return the base index.
    ///
    /// Takes the lowest free range that is wide enough. If none is, the
    /// capacity grows by at least `dimension` (announced through
    /// `set_num_indices` first) and the range is taken from the old tail.
    pub fn allocate(
        &mut self,
        dimension: Dimension,
        callbacks: &mut impl AllocatorCallbacks,
    ) -> Result<SlotIndex, PoolError> {
        if dimension.is_zero() {
            return Err(PoolError::ZeroDimension);
        }
        let width = dimension.get();

        let start = match self.first_fit(width) {
            Some(start) => {
                self.carve(start, width);
                start
            }
            None => self.grow(width, callbacks)?,
        };

        self.used.insert(start, dimension);
        self.used_slots += width;
        trace!(index = start, dimension = width, "allocated slot range");
        Ok(SlotIndex(start))
    }

    /// Return the range based at `index` to the free pool.
    ///
    /// Coalesces with free neighbours on both sides. Capacity is unchanged.
    pub fn free(&mut self, index: SlotIndex) -> Result<Dimension, PoolError> {
        let dimension = self
            .used
            .remove(&index.0)
            .ok_or(PoolError::InvalidIndex { index })?;
        self.used_slots -= dimension.get();
        self.release(index.0, dimension.get());
        trace!(index = index.0, dimension = dimension.get(), "freed slot range");
        Ok(dimension)
    }

    /// Slide every live range down to close the gaps below it, then shrink
    /// capacity to the number of used slots.
    ///
    /// Ranges keep their relative order. `move_index` is invoked for each
    /// relocated range before its new base is recorded; `set_num_indices`
    /// is invoked once at the end if the capacity shrank.
    pub fn defragment(&mut self, callbacks: &mut impl AllocatorCallbacks) -> DefragReport {
        let old_capacity = self.capacity;
        let mut report = DefragReport {
            relocations: SmallVec::new(),
            old_capacity,
            new_capacity: old_capacity,
        };
        if self.free.is_empty() {
            return report;
        }

        let previous = std::mem::take(&mut self.used);
        let mut target = 0u32;
        for (base, dimension) in previous {
            if base > target {
                let relocation = Relocation {
                    old: SlotIndex(base),
                    new: SlotIndex(target),
                    dimension,
                };
                callbacks.move_index(relocation.old, relocation.new, dimension);
                trace!(
                    old = base,
                    new = target,
                    dimension = dimension.get(),
                    "relocated slot range"
                );
                report.relocations.push(relocation);
            }
            self.used.insert(target, dimension);
            target += dimension.get();
        }
        debug_assert_eq!(target, self.used_slots);

        self.free.clear();
        if target < self.capacity {
            self.capacity = target;
            callbacks.set_num_indices(target);
        }
        report.new_capacity = self.capacity;
        debug!(
            moves = report.moves(),
            old_capacity,
            new_capacity = report.new_capacity,
            "defragmented"
        );
        report
    }

    /// Drop every allocation and shrink to zero capacity.
    pub fn reset(&mut self, callbacks: &mut impl AllocatorCallbacks) {
        self.used.clear();
        self.free.clear();
        self.used_slots = 0;
        if self.capacity != 0 {
            self.capacity = 0;
            callbacks.set_num_indices(0);
        }
    }

    /// Dimension of the allocation based at `index`, or `None` if `index`
    /// is not a live base.
    pub fn count_for_index(&self, index: SlotIndex) -> Option<Dimension> {
        self.used.get(&index.0).copied()
    }

    /// Whether `index` is the base of a live allocation.
    pub fn is_allocated(&self, index: SlotIndex) -> bool {
        self.used.contains_key(&index.0)
    }

    /// Logical slot count.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Slots covered by live allocations.
    pub fn used_slots(&self) -> u32 {
        self.used_slots
    }

    /// Slots available for allocation without growing.
    pub fn free_slots(&self) -> u32 {
        self.capacity - self.used_slots
    }

    /// Number of live allocations.
    pub fn live_count(&self) -> usize {
        self.used.len()
    }

    /// Live allocations in ascending base order.
    pub fn used_ranges(&self) -> impl Iterator<Item = (SlotIndex, Dimension)> + '_ {
        self.used.iter().map(|(&base, &dim)| (SlotIndex(base), dim))
    }

    /// Free ranges in ascending start order, as `(start, length)`.
    pub fn free_ranges(&self) -> impl Iterator<Item = (SlotIndex, u32)> + '_ {
        self.free.iter().map(|(&start, &len)| (SlotIndex(start), len))
    }

    /// Recompute every bookkeeping invariant from scratch.
    pub fn verify(&self) -> Result<(), ConsistencyError> {
        let mut ranges: Vec<(u32, u32, bool)> = self
            .used
            .iter()
            .map(|(&base, &dim)| (base, dim.get(), true))
            .chain(self.free.iter().map(|(&start, &len)| (start, len, false)))
            .collect();
        ranges.sort_unstable_by_key(|&(start, _, _)| start);

        let mut used_total = 0u32;
        let mut free_total = 0u32;
        let mut previous: Option<(u32, u64, bool)> = None;
        for (start, len, is_used) in ranges {
            if len == 0 {
                return Err(ConsistencyError::ZeroWidth {
                    index: SlotIndex(start),
                    dimension: Dimension(0),
                });
            }
            let end = u64::from(start) + u64::from(len);
            if end > u64::from(self.capacity) {
                return Err(ConsistencyError::OutOfBounds {
                    start,
                    len,
                    capacity: self.capacity,
                });
            }
            if let Some((prev_start, prev_end, prev_used)) = previous {
                if prev_end > u64::from(start) {
                    return Err(ConsistencyError::Overlap {
                        first: prev_start,
                        second: start,
                    });
                }
                if !prev_used && !is_used && prev_end == u64::from(start) {
                    return Err(ConsistencyError::UncoalescedFree {
                        first: prev_start,
                        second: start,
                    });
                }
            }
            if is_used {
                used_total += len;
            } else {
                free_total += len;
            }
            previous = Some((start, end, is_used));
        }

        if used_total != self.used_slots {
            return Err(ConsistencyError::CounterMismatch {
                counter: "used_slots",
                cached: self.used_slots,
                actual: used_total,
            });
        }
        if u64::from(used_total) + u64::from(free_total) != u64::from(self.capacity) {
            return Err(ConsistencyError::SlotAccounting {
                used: used_total,
                free: free_total,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// Lowest free range at least `width` slots wide.
    fn first_fit(&self, width: u32) -> Option<u32> {
        self.free
            .iter()
            .find(|&(_, &len)| len >= width)
            .map(|(&start, _)| start)
    }

    /// Take the first `width` slots of the free range at `start`.
    fn carve(&mut self, start: u32, width: u32) {
        if let Some(len) = self.free.remove(&start) {
            debug_assert!(len >= width);
            if len > width {
                self.free.insert(start + width, len - width);
            }
        }
    }

    /// Extend capacity so that `width` slots fit at the old tail, and
    /// return the old tail.
    fn grow(
        &mut self,
        width: u32,
        callbacks: &mut impl AllocatorCallbacks,
    ) -> Result<u32, PoolError> {
        let old = self.capacity;
        let exact = u64::from(old) + u64::from(width);
        let max = u64::from(self.max_capacity);
        if exact > max {
            warn!(
                requested = exact,
                max = self.max_capacity,
                "slot pool capacity exhausted"
            );
            return Err(PoolError::CapacityExceeded {
                requested: exact,
                max: self.max_capacity,
            });
        }
        let stepped = (u64::from(old) + u64::from(width.max(self.growth_step))).min(max);
        // `stepped <= max < u32::MAX`, so the narrowing is lossless.
        let new_capacity = stepped as u32;

        callbacks.set_num_indices(new_capacity);
        self.capacity = new_capacity;
        let surplus_start = old + width;
        if new_capacity > surplus_start {
            self.free.insert(surplus_start, new_capacity - surplus_start);
        }
        debug!(old_capacity = old, new_capacity, "grew slot pool");
        Ok(old)
    }

    /// Insert a free range, merging it with touching neighbours.
    fn release(&mut self, start: u32, len: u32) {
        let mut start = start;
        let mut len = len;
        if let Some((&prev_start, &prev_len)) = self.free.range(..start).next_back() {
            if prev_start + prev_len == start {
                self.free.remove(&prev_start);
                start = prev_start;
                len += prev_len;
            }
        }
        if let Some(next_len) = self.free.remove(&(start + len)) {
            len += next_len;
        }
        self.free.insert(start, len);
    }
}

impl Default for IndexAllocator {
    fn default() -> Self {
        Self::new(&PoolConfig::default())
    }
}
