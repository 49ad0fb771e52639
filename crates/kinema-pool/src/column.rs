//! Dense per-slot payload columns.

use std::ops::{Index, IndexMut};

use kinema_core::{Dimension, SlotIndex};

/// A growable column holding one `T` per slot.
///
/// Processors keep one `SlotVec` per payload attribute (value, velocity,
/// target, ...) and forward pool callbacks to each. The reset state of a
/// slot is `T::default()`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SlotVec<T> {
    data: Vec<T>,
}

impl<T: Clone + Default> SlotVec<T> {
    /// Create an empty column.
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Grow (with reset slots) or truncate to `num_indices` slots.
    pub fn set_num_indices(&mut self, num_indices: u32) {
        self.data.resize(num_indices as usize, T::default());
    }

    /// Copy `dimension` slots from `old` to `new`.
    ///
    /// Copies in ascending order, which is correct for the downward,
    /// possibly overlapping moves defragmentation produces.
    pub fn move_slots(&mut self, old: SlotIndex, new: SlotIndex, dimension: Dimension) {
        debug_assert!(new <= old, "slot moves only go downward");
        let (old, new) = (old.as_usize(), new.as_usize());
        for offset in 0..dimension.get() as usize {
            self.data[new + offset] = self.data[old + offset].clone();
        }
    }

    /// Put `dimension` slots from `index` back into the reset state.
    pub fn reset(&mut self, index: SlotIndex, dimension: Dimension) {
        self.slice_mut(index, dimension).fill(T::default());
    }

    /// The slots of one entry.
    pub fn slice(&self, index: SlotIndex, dimension: Dimension) -> &[T] {
        let start = index.as_usize();
        &self.data[start..start + dimension.get() as usize]
    }

    /// The slots of one entry, mutably.
    pub fn slice_mut(&mut self, index: SlotIndex, dimension: Dimension) -> &mut [T] {
        let start = index.as_usize();
        &mut self.data[start..start + dimension.get() as usize]
    }

    /// Every slot, for batched processing.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Every slot, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the column has no slots.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<T> Index<usize> for SlotVec<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.data[index]
    }
}

impl<T> IndexMut<usize> for SlotVec<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.data[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grows_with_default_and_truncates() {
        let mut col: SlotVec<f32> = SlotVec::new();
        col.set_num_indices(3);
        assert_eq!(col.as_slice(), &[0.0, 0.0, 0.0]);
        col[2] = 5.0;
        col.set_num_indices(2);
        col.set_num_indices(3);
        assert_eq!(col[2], 0.0, "regrown slot is reset");
    }

    #[test]
    fn overlapping_move_preserves_values() {
        let mut col: SlotVec<u32> = SlotVec::new();
        col.set_num_indices(5);
        col.slice_mut(SlotIndex(2), Dimension(3))
            .copy_from_slice(&[7, 8, 9]);
        col.move_slots(SlotIndex(2), SlotIndex(1), Dimension(3));
        assert_eq!(col.slice(SlotIndex(1), Dimension(3)), &[7, 8, 9]);
    }

    #[test]
    fn reset_clears_entry_only() {
        let mut col: SlotVec<i32> = SlotVec::new();
        col.set_num_indices(4);
        col.as_mut_slice().copy_from_slice(&[1, 2, 3, 4]);
        col.reset(SlotIndex(1), Dimension(2));
        assert_eq!(col.as_slice(), &[1, 0, 0, 4]);
    }
}
