//! Handle back-references for a slot pool.
//!
//! [`SlotTable`] keeps the single-owner relation between live base indices
//! and the handles bound to them, in both directions:
//!
//! - `back_refs[index]` names the handle that owns `index` (base indices
//!   only; interior and free slots are `None`).
//! - `forward[handle]` is the index that handle currently resolves to.
//!
//! When the allocator relocates a range the table rewrites both sides, so a
//! handle never has to be reached through a pointer to learn its new index.

use indexmap::IndexMap;
use kinema_core::{ConsistencyError, HandleId, PoolError, SlotIndex};

use crate::allocator::IndexAllocator;

/// Two-way map between live base indices and bound handles.
#[derive(Clone, Debug, Default)]
pub struct SlotTable {
    back_refs: Vec<Option<HandleId>>,
    forward: IndexMap<HandleId, SlotIndex>,
}

impl SlotTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `handle` to the base index `index`.
    ///
    /// Rebinding the same pair is a no-op. Fails if another handle owns
    /// `index` or if `handle` already owns a different index.
    pub fn bind(&mut self, index: SlotIndex, handle: HandleId) -> Result<(), PoolError> {
        let slot = self
            .back_refs
            .get_mut(index.as_usize())
            .ok_or(PoolError::InvalidIndex { index })?;
        match *slot {
            Some(owner) if owner == handle => return Ok(()),
            Some(owner) => return Err(PoolError::AlreadyBound { index, owner }),
            None => {}
        }
        if let Some(&owned) = self.forward.get(&handle) {
            return Err(PoolError::HandleInUse {
                handle,
                index: owned,
            });
        }
        *slot = Some(handle);
        self.forward.insert(handle, index);
        Ok(())
    }

    /// Clear the back reference at `index`, returning the handle that was
    /// bound there.
    pub fn unbind(&mut self, index: SlotIndex) -> Option<HandleId> {
        let handle = self.back_refs.get_mut(index.as_usize())?.take()?;
        self.forward.swap_remove(&handle);
        Some(handle)
    }

    /// Hand ownership of `index` to `new_handle`.
    ///
    /// The previous owner is unbound (its index now resolves to
    /// [`SlotIndex::INVALID`]) and returned. Payload is untouched.
    pub fn transfer(
        &mut self,
        index: SlotIndex,
        new_handle: HandleId,
    ) -> Result<HandleId, PoolError> {
        let previous = self
            .handle(index)
            .ok_or(PoolError::NotBound { index })?;
        if previous == new_handle {
            return Ok(previous);
        }
        if let Some(&owned) = self.forward.get(&new_handle) {
            return Err(PoolError::HandleInUse {
                handle: new_handle,
                index: owned,
            });
        }
        self.forward.swap_remove(&previous);
        self.forward.insert(new_handle, index);
        self.back_refs[index.as_usize()] = Some(new_handle);
        Ok(previous)
    }

    /// Handle bound at `index`, if any.
    pub fn handle(&self, index: SlotIndex) -> Option<HandleId> {
        self.back_refs.get(index.as_usize()).copied().flatten()
    }

    /// Index `handle` resolves to, or [`SlotIndex::INVALID`] if unbound.
    pub fn index_of(&self, handle: HandleId) -> SlotIndex {
        self.forward
            .get(&handle)
            .copied()
            .unwrap_or(SlotIndex::INVALID)
    }

    /// Whether `handle` owns an index in this table.
    pub fn is_bound(&self, handle: HandleId) -> bool {
        self.forward.contains_key(&handle)
    }

    /// Number of bound handles.
    pub fn bound_count(&self) -> usize {
        self.forward.len()
    }

    /// Length of the back-reference array (tracks allocator capacity).
    pub fn len(&self) -> usize {
        self.back_refs.len()
    }

    /// Whether the back-reference array is empty.
    pub fn is_empty(&self) -> bool {
        self.back_refs.is_empty()
    }

    /// Bound handles and their indices, in binding order.
    pub fn bindings(&self) -> impl Iterator<Item = (HandleId, SlotIndex)> + '_ {
        self.forward.iter().map(|(&h, &i)| (h, i))
    }

    /// Follow a relocation from `old` to `new`.
    ///
    /// The back reference moves with the range and the bound handle's
    /// stored index is rewritten.
    pub fn move_index(&mut self, old: SlotIndex, new: SlotIndex) {
        let Some(handle) = self
            .back_refs
            .get_mut(old.as_usize())
            .and_then(Option::take)
        else {
            return;
        };
        debug_assert!(
            self.handle(new).is_none(),
            "relocation target {new} is already bound"
        );
        if let Some(slot) = self.back_refs.get_mut(new.as_usize()) {
            *slot = Some(handle);
        }
        if let Some(stored) = self.forward.get_mut(&handle) {
            *stored = new;
        }
    }

    /// Resize the back-reference array to `num_indices` entries.
    ///
    /// New entries are unbound. Entries cut off by a shrink must already be
    /// unbound.
    pub fn set_num_indices(&mut self, num_indices: u32) {
        let len = num_indices as usize;
        debug_assert!(
            self.back_refs.iter().skip(len).all(Option::is_none),
            "shrinking slot table past a bound index"
        );
        self.back_refs.resize(len, None);
    }

    /// Drop every binding and every entry.
    pub fn clear(&mut self) {
        self.back_refs.clear();
        self.forward.clear();
    }

    /// Cross-check both directions against the allocator's live bases.
    ///
    /// Every back reference must sit on a live base and map forward to
    /// that same base; every forward entry must point at a live base whose
    /// back reference names it; every live base must have an owner.
    pub fn verify(&self, allocator: &IndexAllocator) -> Result<(), ConsistencyError> {
        if self.back_refs.len() != allocator.capacity() as usize {
            return Err(ConsistencyError::TableLength {
                table: self.back_refs.len(),
                capacity: allocator.capacity(),
            });
        }
        for (i, entry) in self.back_refs.iter().enumerate() {
            let Some(handle) = *entry else { continue };
            // `i < capacity <= u32::MAX - 1`.
            let index = SlotIndex(i as u32);
            if !allocator.is_allocated(index) {
                return Err(ConsistencyError::StrayBackReference { index, handle });
            }
            let forward = self.index_of(handle);
            if forward != index {
                return Err(ConsistencyError::BackReferenceMismatch {
                    index,
                    handle,
                    forward,
                });
            }
        }
        for (&handle, &index) in &self.forward {
            if !allocator.is_allocated(index) || self.handle(index) != Some(handle) {
                return Err(ConsistencyError::ForwardReferenceMismatch { handle, index });
            }
        }
        for (index, _) in allocator.used_ranges() {
            if self.handle(index).is_none() {
                return Err(ConsistencyError::UnownedBase { index });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;
    use kinema_core::Dimension;
    use kinema_test_utils::RecordingCallbacks;

    fn table(len: u32) -> SlotTable {
        let mut t = SlotTable::new();
        t.set_num_indices(len);
        t
    }

    #[test]
    fn bind_records_both_directions() {
        let mut t = table(4);
        let h = HandleId::next();
        t.bind(SlotIndex(2), h).unwrap();
        assert_eq!(t.handle(SlotIndex(2)), Some(h));
        assert_eq!(t.index_of(h), SlotIndex(2));
        assert_eq!(t.bound_count(), 1);
    }

    #[test]
    fn double_bind_rejected() {
        let mut t = table(4);
        let a = HandleId::next();
        let b = HandleId::next();
        t.bind(SlotIndex(0), a).unwrap();
        assert_eq!(
            t.bind(SlotIndex(0), b),
            Err(PoolError::AlreadyBound {
                index: SlotIndex(0),
                owner: a
            })
        );
        assert_eq!(t.bind(SlotIndex(0), a), Ok(()));
        assert_eq!(
            t.bind(SlotIndex(1), a),
            Err(PoolError::HandleInUse {
                handle: a,
                index: SlotIndex(0)
            })
        );
    }

    #[test]
    fn bind_out_of_range_rejected() {
        let mut t = table(1);
        assert!(matches!(
            t.bind(SlotIndex(5), HandleId::next()),
            Err(PoolError::InvalidIndex { .. })
        ));
    }

    #[test]
    fn unbind_clears_forward_entry() {
        let mut t = table(2);
        let h = HandleId::next();
        t.bind(SlotIndex(1), h).unwrap();
        assert_eq!(t.unbind(SlotIndex(1)), Some(h));
        assert_eq!(t.index_of(h), SlotIndex::INVALID);
        assert_eq!(t.unbind(SlotIndex(1)), None);
    }

    #[test]
    fn transfer_swaps_owner() {
        let mut t = table(2);
        let old = HandleId::next();
        let new = HandleId::next();
        t.bind(SlotIndex(1), old).unwrap();
        assert_eq!(t.transfer(SlotIndex(1), new), Ok(old));
        assert_eq!(t.index_of(old), SlotIndex::INVALID);
        assert_eq!(t.index_of(new), SlotIndex(1));
        assert_eq!(t.handle(SlotIndex(1)), Some(new));
    }

    #[test]
    fn transfer_unbound_rejected() {
        let mut t = table(2);
        assert_eq!(
            t.transfer(SlotIndex(0), HandleId::next()),
            Err(PoolError::NotBound {
                index: SlotIndex(0)
            })
        );
    }

    #[test]
    fn transfer_to_busy_handle_rejected() {
        let mut t = table(3);
        let a = HandleId::next();
        let b = HandleId::next();
        t.bind(SlotIndex(0), a).unwrap();
        t.bind(SlotIndex(2), b).unwrap();
        assert!(matches!(
            t.transfer(SlotIndex(0), b),
            Err(PoolError::HandleInUse { .. })
        ));
        assert_eq!(t.handle(SlotIndex(0)), Some(a));
    }

    #[test]
    fn move_rewrites_stored_index() {
        let mut t = table(6);
        let h = HandleId::next();
        t.bind(SlotIndex(5), h).unwrap();
        t.move_index(SlotIndex(5), SlotIndex(1));
        assert_eq!(t.handle(SlotIndex(5)), None);
        assert_eq!(t.handle(SlotIndex(1)), Some(h));
        assert_eq!(t.index_of(h), SlotIndex(1));
    }

    #[test]
    fn move_of_unbound_index_is_ignored() {
        let mut t = table(3);
        t.move_index(SlotIndex(2), SlotIndex(0));
        assert_eq!(t.bound_count(), 0);
    }

    /// An allocator with live bases at 0 (width 2) and 2 (width 1), and a
    /// table bound to match.
    fn consistent_pair() -> (IndexAllocator, SlotTable, HandleId, HandleId) {
        let mut allocator = IndexAllocator::new(&PoolConfig::new());
        let mut cb = RecordingCallbacks::new();
        let a = allocator.allocate(Dimension(2), &mut cb).unwrap();
        let b = allocator.allocate(Dimension(1), &mut cb).unwrap();
        let mut t = table(allocator.capacity());
        let (ha, hb) = (HandleId::next(), HandleId::next());
        t.bind(a, ha).unwrap();
        t.bind(b, hb).unwrap();
        t.verify(&allocator).unwrap();
        (allocator, t, ha, hb)
    }

    #[test]
    fn verify_catches_length_mismatch() {
        let (allocator, mut t, _, _) = consistent_pair();
        t.back_refs.push(None);
        assert_eq!(
            t.verify(&allocator),
            Err(ConsistencyError::TableLength {
                table: 4,
                capacity: 3
            })
        );
    }

    #[test]
    fn verify_catches_stray_back_reference() {
        let (allocator, mut t, _, _) = consistent_pair();
        let stray = HandleId::next();
        t.back_refs[1] = Some(stray);
        assert_eq!(
            t.verify(&allocator),
            Err(ConsistencyError::StrayBackReference {
                index: SlotIndex(1),
                handle: stray
            })
        );
    }

    #[test]
    fn verify_catches_back_reference_mismatch() {
        let (allocator, mut t, ha, _) = consistent_pair();
        t.forward.insert(ha, SlotIndex(2));
        assert_eq!(
            t.verify(&allocator),
            Err(ConsistencyError::BackReferenceMismatch {
                index: SlotIndex(0),
                handle: ha,
                forward: SlotIndex(2)
            })
        );
    }

    #[test]
    fn verify_catches_forward_reference_mismatch() {
        let (allocator, mut t, _, _) = consistent_pair();
        let ghost = HandleId::next();
        t.forward.insert(ghost, SlotIndex(2));
        assert_eq!(
            t.verify(&allocator),
            Err(ConsistencyError::ForwardReferenceMismatch {
                handle: ghost,
                index: SlotIndex(2)
            })
        );
    }

    #[test]
    fn verify_catches_unowned_live_base() {
        let (allocator, mut t, _, hb) = consistent_pair();
        assert_eq!(t.unbind(SlotIndex(2)), Some(hb));
        assert_eq!(
            t.verify(&allocator),
            Err(ConsistencyError::UnownedBase {
                index: SlotIndex(2)
            })
        );
    }
}
