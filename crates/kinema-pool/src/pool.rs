//! Lifecycle coordination for one pool of motivator slots.
//!
//! [`SlotPool`] ties together the three parts that must move in lockstep:
//!
//! ```text
//! SlotPool<S>
//! ├── IndexAllocator   (free/used ranges, capacity)
//! ├── SlotTable        (base index ⇄ handle)
//! └── S: PayloadStore  (data columns, owned by the processor)
//! ```
//!
//! Allocator callbacks are routed through a short-lived forwarder that
//! updates the payload store first and the slot table second, so by the
//! time a handle's stored index changes its data is already in place.

use kinema_core::{
    AllocatorCallbacks, ConsistencyError, Dimension, HandleId, PayloadStore, PoolError, SlotIndex,
};
use tracing::debug;

use crate::allocator::{DefragReport, IndexAllocator};
use crate::config::{ConfigError, PoolConfig};
use crate::slot_table::SlotTable;

/// Routes allocator notifications to payload storage, then to the table.
struct Forwarder<'a, S> {
    store: &'a mut S,
    table: &'a mut SlotTable,
}

impl<S: PayloadStore> AllocatorCallbacks for Forwarder<'_, S> {
    fn set_num_indices(&mut self, num_indices: u32) {
        self.store.set_num_indices(num_indices);
        self.table.set_num_indices(num_indices);
    }

    fn move_index(&mut self, old: SlotIndex, new: SlotIndex, dimension: Dimension) {
        self.store.move_slots(old, new, dimension);
        self.table.move_index(old, new);
    }
}

/// A pool of variable-width slot ranges with handle back-references.
///
/// Every operation takes `&mut self`; a pool is driven by one caller at a
/// time and no operation re-enters another.
pub struct SlotPool<S> {
    allocator: IndexAllocator,
    table: SlotTable,
    store: S,
}

impl<S: PayloadStore> SlotPool<S> {
    /// Create a pool with the default configuration.
    pub fn new(store: S) -> Self {
        let config = PoolConfig::default();
        Self {
            allocator: IndexAllocator::new(&config),
            table: SlotTable::new(),
            store,
        }
    }

    /// Create a pool with an explicit configuration.
    ///
    /// The store and slot table are sized to `config.initial_capacity`.
    pub fn with_config(store: S, config: &PoolConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut pool = Self {
            allocator: IndexAllocator::new(config),
            table: SlotTable::new(),
            store,
        };
        if config.initial_capacity > 0 {
            pool.forwarder().set_num_indices(config.initial_capacity);
        }
        Ok(pool)
    }

    /// Allocate slots for a new entry, bind `handle` to them, and let the
    /// store write initial data.
    pub fn initialize(&mut self, init: &S::Init, handle: HandleId) -> Result<SlotIndex, PoolError> {
        if self.table.is_bound(handle) {
            return Err(PoolError::HandleInUse {
                handle,
                index: self.table.index_of(handle),
            });
        }
        let dimension = self.store.dimension(init);
        let mut forwarder = Forwarder {
            store: &mut self.store,
            table: &mut self.table,
        };
        let index = self.allocator.allocate(dimension, &mut forwarder)?;
        self.table.bind(index, handle)?;
        self.store.initialize(init, index, dimension);
        Ok(index)
    }

    /// Remove the entry based at `index`.
    ///
    /// The store resets the data while `index` is still live; then the
    /// range is freed and the owner unbound. Returns the unbound owner.
    pub fn remove(&mut self, index: SlotIndex) -> Result<Option<HandleId>, PoolError> {
        let dimension = self
            .allocator
            .count_for_index(index)
            .ok_or(PoolError::InvalidIndex { index })?;
        self.store.remove(index, dimension);
        self.allocator.free(index)?;
        Ok(self.table.unbind(index))
    }

    /// Remove whatever entry `handle` owns.
    pub fn remove_handle(&mut self, handle: HandleId) -> Result<SlotIndex, PoolError> {
        let index = self.table.index_of(handle);
        if !index.is_valid() {
            return Err(PoolError::InvalidIndex { index });
        }
        self.remove(index)?;
        Ok(index)
    }

    /// Hand the entry at `index` to `new_handle`, returning the previous
    /// owner. No payload or allocator state changes.
    pub fn transfer(&mut self, index: SlotIndex, new_handle: HandleId) -> Result<HandleId, PoolError> {
        if !self.valid_index(index) {
            return Err(PoolError::InvalidIndex { index });
        }
        self.table.transfer(index, new_handle)
    }

    /// Compact live entries towards index 0 and shrink capacity.
    pub fn defragment(&mut self) -> DefragReport {
        let mut forwarder = Forwarder {
            store: &mut self.store,
            table: &mut self.table,
        };
        self.allocator.defragment(&mut forwarder)
    }

    /// Remove every entry and shrink to zero slots.
    ///
    /// Returns the handles that were unbound.
    pub fn clear(&mut self) -> Vec<HandleId> {
        let live: Vec<(SlotIndex, Dimension)> = self.allocator.used_ranges().collect();
        let mut unbound = Vec::with_capacity(live.len());
        for (index, dimension) in live {
            self.store.remove(index, dimension);
            unbound.extend(self.table.unbind(index));
        }
        let mut forwarder = Forwarder {
            store: &mut self.store,
            table: &mut self.table,
        };
        self.allocator.reset(&mut forwarder);
        debug!(removed = unbound.len(), "cleared slot pool");
        unbound
    }

    /// Whether `index` is the base of a live entry.
    pub fn valid_index(&self, index: SlotIndex) -> bool {
        self.allocator.is_allocated(index)
    }

    /// Whether `index` is live and owned by `handle`.
    pub fn valid_handle(&self, index: SlotIndex, handle: HandleId) -> bool {
        self.valid_index(index) && self.table.handle(index) == Some(handle)
    }

    /// Slot count of the entry at `index`.
    pub fn dimensions(&self, index: SlotIndex) -> Option<Dimension> {
        self.allocator.count_for_index(index)
    }

    /// Current index of `handle`, or [`SlotIndex::INVALID`].
    pub fn index_of(&self, handle: HandleId) -> SlotIndex {
        self.table.index_of(handle)
    }

    /// Owner of the entry at `index`.
    pub fn handle_at(&self, index: SlotIndex) -> Option<HandleId> {
        self.table.handle(index)
    }

    /// Number of live entries.
    pub fn live_count(&self) -> usize {
        self.allocator.live_count()
    }

    /// Logical slot count.
    pub fn capacity(&self) -> u32 {
        self.allocator.capacity()
    }

    /// Slots covered by live entries.
    pub fn used_slots(&self) -> u32 {
        self.allocator.used_slots()
    }

    /// Live entries in ascending index order.
    pub fn entries(&self) -> impl Iterator<Item = (SlotIndex, Dimension)> + '_ {
        self.allocator.used_ranges()
    }

    /// The index allocator, for inspection.
    pub fn allocator(&self) -> &IndexAllocator {
        &self.allocator
    }

    /// The slot table, for inspection.
    pub fn table(&self) -> &SlotTable {
        &self.table
    }

    /// The payload store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The payload store, mutably. Layout changes must go through the pool.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Recompute and cross-check every allocator and slot table invariant.
    pub fn verify_internal_state(&self) -> Result<(), ConsistencyError> {
        self.allocator.verify()?;
        self.table.verify(&self.allocator)
    }

    /// Run [`verify_internal_state`](Self::verify_internal_state) in debug
    /// builds and panic on the first violation. Free in release builds.
    pub fn debug_verify(&self) {
        #[cfg(debug_assertions)]
        if let Err(e) = self.verify_internal_state() {
            panic!("kinema: slot pool consistency check failed: {e}");
        }
    }

    fn forwarder(&mut self) -> Forwarder<'_, S> {
        Forwarder {
            store: &mut self.store,
            table: &mut self.table,
        }
    }
}

impl<S: PayloadStore + Default> Default for SlotPool<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}
