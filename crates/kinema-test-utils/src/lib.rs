//! Test utilities and mock types for Kinema development.
//!
//! Provides [`RecordingCallbacks`], a bare [`AllocatorCallbacks`] sink that
//! logs every notification, and [`RecordingStore`], a [`PayloadStore`]
//! whose slots carry a caller-chosen tag so tests can check that data
//! follows its entry through defragmentation.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use kinema_core::{AllocatorCallbacks, Dimension, PayloadStore, SlotIndex};

/// One notification received from an allocator or pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallbackEvent {
    SetNumIndices(u32),
    Move {
        old: SlotIndex,
        new: SlotIndex,
        dimension: Dimension,
    },
}

/// Allocator callback sink that only records what it was told.
#[derive(Debug, Default)]
pub struct RecordingCallbacks {
    pub events: Vec<CallbackEvent>,
    pub num_indices: u32,
}

impl RecordingCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves received so far, as `(old, new, dimension)` triples.
    pub fn moves(&self) -> Vec<(u32, u32, u16)> {
        self.events
            .iter()
            .filter_map(|e| match *e {
                CallbackEvent::Move {
                    old,
                    new,
                    dimension,
                } => Some((old.0, new.0, dimension.0)),
                CallbackEvent::SetNumIndices(_) => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl AllocatorCallbacks for RecordingCallbacks {
    fn set_num_indices(&mut self, num_indices: u32) {
        self.num_indices = num_indices;
        self.events.push(CallbackEvent::SetNumIndices(num_indices));
    }

    fn move_index(&mut self, old: SlotIndex, new: SlotIndex, dimension: Dimension) {
        self.events.push(CallbackEvent::Move {
            old,
            new,
            dimension,
        });
    }
}

/// Init parameters for [`RecordingStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaggedInit {
    pub tag: u64,
    pub dimension: Dimension,
}

impl TaggedInit {
    pub fn new(tag: u64, dimension: u16) -> Self {
        Self {
            tag,
            dimension: Dimension(dimension),
        }
    }
}

/// Payload of one slot: the owning entry's tag and the slot's offset
/// within that entry.
pub type TaggedSlot = Option<(u64, u16)>;

/// Payload store whose slots hold `(tag, offset)` pairs.
///
/// Reset slots hold `None`. Moves copy slot-by-slot in ascending order,
/// which is safe for the overlapping downward moves defragmentation makes.
#[derive(Debug, Default)]
pub struct RecordingStore {
    slots: Vec<TaggedSlot>,
    pub events: Vec<CallbackEvent>,
    pub removed: Vec<(SlotIndex, Dimension)>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, index: u32) -> TaggedSlot {
        self.slots.get(index as usize).copied().flatten()
    }

    /// Tag stored at a base index.
    pub fn tag_at(&self, index: SlotIndex) -> Option<u64> {
        self.slot(index.0).map(|(tag, _)| tag)
    }

    /// Whether `dimension` slots from `index` all carry `tag` with
    /// ascending offsets.
    pub fn holds_entry(&self, index: SlotIndex, dimension: Dimension, tag: u64) -> bool {
        (0..dimension.0).all(|offset| self.slot(index.0 + u32::from(offset)) == Some((tag, offset)))
    }

    /// Moves received so far, as `(old, new, dimension)` triples.
    pub fn moves(&self) -> Vec<(u32, u32, u16)> {
        self.events
            .iter()
            .filter_map(|e| match *e {
                CallbackEvent::Move {
                    old,
                    new,
                    dimension,
                } => Some((old.0, new.0, dimension.0)),
                CallbackEvent::SetNumIndices(_) => None,
            })
            .collect()
    }

    /// Capacity changes received so far.
    pub fn resizes(&self) -> Vec<u32> {
        self.events
            .iter()
            .filter_map(|e| match *e {
                CallbackEvent::SetNumIndices(n) => Some(n),
                CallbackEvent::Move { .. } => None,
            })
            .collect()
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
        self.removed.clear();
    }
}

impl PayloadStore for RecordingStore {
    type Init = TaggedInit;

    fn dimension(&self, init: &TaggedInit) -> Dimension {
        init.dimension
    }

    fn initialize(&mut self, init: &TaggedInit, index: SlotIndex, dimension: Dimension) {
        for offset in 0..dimension.0 {
            self.slots[index.as_usize() + usize::from(offset)] = Some((init.tag, offset));
        }
    }

    fn remove(&mut self, index: SlotIndex, dimension: Dimension) {
        self.removed.push((index, dimension));
        for offset in 0..dimension.0 {
            self.slots[index.as_usize() + usize::from(offset)] = None;
        }
    }

    fn move_slots(&mut self, old: SlotIndex, new: SlotIndex, dimension: Dimension) {
        self.events.push(CallbackEvent::Move {
            old,
            new,
            dimension,
        });
        for offset in 0..dimension.get() as usize {
            self.slots[new.as_usize() + offset] = self.slots[old.as_usize() + offset];
        }
    }

    fn set_num_indices(&mut self, num_indices: u32) {
        self.events.push(CallbackEvent::SetNumIndices(num_indices));
        self.slots.resize(num_indices as usize, None);
    }
}
