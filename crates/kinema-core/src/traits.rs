//! Collaborator traits at the seam between an allocator and its storage.

use crate::id::{Dimension, SlotIndex};

/// Notifications an index allocator emits when it changes slot layout.
///
/// The allocator never owns payload data. Every externally visible
/// mutation (capacity change, relocation of a live range) is reported
/// through this trait, synchronously, while the allocator holds the
/// old layout.
pub trait AllocatorCallbacks {
    /// The logical slot count changed to `num_indices`.
    ///
    /// On growth, slots past the old count must be put into their reset
    /// state. On shrink, every slot past `num_indices` is already free.
    /// Always called before any allocation hands out a slot beyond the old
    /// count.
    fn set_num_indices(&mut self, num_indices: u32);

    /// Copy `dimension` slots starting at `old` to `new`.
    ///
    /// `new < old` and the destination is free, but the two ranges may
    /// overlap. Called before the allocator considers `old` released.
    fn move_index(&mut self, old: SlotIndex, new: SlotIndex, dimension: Dimension);
}

/// Per-slot payload storage owned by a pool.
///
/// Implemented by each processor family for its data columns. The pool
/// drives it through initialization, removal, relocation, and resizing;
/// the store never decides on its own where data lives.
pub trait PayloadStore {
    /// Parameters for initializing a new entry.
    type Init;

    /// Number of contiguous slots an entry built from `init` needs.
    fn dimension(&self, init: &Self::Init) -> Dimension;

    /// Write initial data for a freshly allocated range.
    fn initialize(&mut self, init: &Self::Init, index: SlotIndex, dimension: Dimension);

    /// Reset the data of a range that is about to be freed.
    ///
    /// `index` is still the live base when this is called.
    fn remove(&mut self, index: SlotIndex, dimension: Dimension);

    /// Copy a range from `old` to `new` during defragmentation.
    fn move_slots(&mut self, old: SlotIndex, new: SlotIndex, dimension: Dimension);

    /// Grow or truncate every column to `num_indices` slots.
    fn set_num_indices(&mut self, num_indices: u32);
}
