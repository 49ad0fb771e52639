//! Error types for the Kinema pools.
//!
//! [`PoolError`] covers precondition failures a caller can observe and
//! react to. [`ConsistencyError`] is produced only by the diagnostic
//! verification passes and always indicates a bug in the pool itself or in
//! a collaborator that bypassed it.

use std::error::Error;
use std::fmt;

use crate::id::{Dimension, HandleId, SlotIndex};

/// Errors returned by pool, allocator, and slot table operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PoolError {
    /// An allocation of zero slots was requested.
    ZeroDimension,
    /// The index is not the base of a live allocation.
    InvalidIndex {
        /// The offending index.
        index: SlotIndex,
    },
    /// The base index is already owned by a different handle.
    AlreadyBound {
        /// The contested base index.
        index: SlotIndex,
        /// The handle currently bound there.
        owner: HandleId,
    },
    /// The handle already owns another base index in this pool.
    HandleInUse {
        /// The handle that was offered.
        handle: HandleId,
        /// The index it already owns.
        index: SlotIndex,
    },
    /// The base index has no bound handle.
    NotBound {
        /// The unbound index.
        index: SlotIndex,
    },
    /// Growing the pool would pass its configured slot ceiling.
    CapacityExceeded {
        /// Total slots the pool would need.
        requested: u64,
        /// The configured ceiling.
        max: u32,
    },
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroDimension => write!(f, "allocation dimension must be at least 1"),
            Self::InvalidIndex { index } => {
                write!(f, "index {index} is not a live allocation")
            }
            Self::AlreadyBound { index, owner } => {
                write!(f, "index {index} is already bound to {owner}")
            }
            Self::HandleInUse { handle, index } => {
                write!(f, "handle {handle} already owns index {index}")
            }
            Self::NotBound { index } => write!(f, "index {index} has no bound handle"),
            Self::CapacityExceeded { requested, max } => {
                write!(
                    f,
                    "pool capacity exceeded: requested {requested} slots, max {max} slots"
                )
            }
        }
    }
}

impl Error for PoolError {}

/// An invariant violation found by a verification pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConsistencyError {
    /// A range reaches past the logical capacity.
    OutOfBounds {
        /// Start of the range.
        start: u32,
        /// Length of the range in slots.
        len: u32,
        /// Logical capacity of the pool.
        capacity: u32,
    },
    /// Two ranges (used or free) overlap.
    Overlap {
        /// Start of the earlier range.
        first: u32,
        /// Start of the later range.
        second: u32,
    },
    /// Two free ranges touch but were not coalesced.
    UncoalescedFree {
        /// Start of the earlier free range.
        first: u32,
        /// Start of the later free range.
        second: u32,
    },
    /// Used plus free slots do not add up to the capacity.
    SlotAccounting {
        /// Sum of used range lengths.
        used: u32,
        /// Sum of free range lengths.
        free: u32,
        /// Logical capacity.
        capacity: u32,
    },
    /// A cached counter disagrees with the recomputed value.
    CounterMismatch {
        /// Which counter.
        counter: &'static str,
        /// The cached value.
        cached: u32,
        /// The recomputed value.
        actual: u32,
    },
    /// A used range has zero width.
    ZeroWidth {
        /// Base index of the range.
        index: SlotIndex,
        /// The recorded dimension.
        dimension: Dimension,
    },
    /// The back-reference table length differs from the allocator capacity.
    TableLength {
        /// Back-reference table length.
        table: usize,
        /// Allocator capacity.
        capacity: u32,
    },
    /// A back reference sits on an index that is not a live base.
    StrayBackReference {
        /// The index carrying the back reference.
        index: SlotIndex,
        /// The handle recorded there.
        handle: HandleId,
    },
    /// A back reference's handle does not map forward to the same index.
    BackReferenceMismatch {
        /// The index carrying the back reference.
        index: SlotIndex,
        /// The handle recorded there.
        handle: HandleId,
        /// The index the forward map holds for that handle.
        forward: SlotIndex,
    },
    /// A handle's stored index does not carry a back reference to it.
    ForwardReferenceMismatch {
        /// The handle.
        handle: HandleId,
        /// The index it claims.
        index: SlotIndex,
    },
    /// A live base index has no bound handle.
    UnownedBase {
        /// The live base index.
        index: SlotIndex,
    },
}

impl fmt::Display for ConsistencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds {
                start,
                len,
                capacity,
            } => write!(
                f,
                "range [{start}, {}) exceeds capacity {capacity}",
                u64::from(*start) + u64::from(*len)
            ),
            Self::Overlap { first, second } => {
                write!(f, "ranges at {first} and {second} overlap")
            }
            Self::UncoalescedFree { first, second } => {
                write!(f, "free ranges at {first} and {second} are adjacent")
            }
            Self::SlotAccounting {
                used,
                free,
                capacity,
            } => write!(
                f,
                "used {used} + free {free} slots does not equal capacity {capacity}"
            ),
            Self::CounterMismatch {
                counter,
                cached,
                actual,
            } => write!(f, "{counter} counter is {cached}, recomputed {actual}"),
            Self::ZeroWidth { index, dimension } => {
                write!(f, "allocation at {index} has dimension {dimension}")
            }
            Self::TableLength { table, capacity } => write!(
                f,
                "back-reference table has {table} entries, capacity is {capacity}"
            ),
            Self::StrayBackReference { index, handle } => {
                write!(f, "{handle} is bound at {index}, which is not a live base")
            }
            Self::BackReferenceMismatch {
                index,
                handle,
                forward,
            } => write!(
                f,
                "{handle} is bound at {index} but its stored index is {forward}"
            ),
            Self::ForwardReferenceMismatch { handle, index } => {
                write!(f, "{handle} claims index {index}, which is not bound to it")
            }
            Self::UnownedBase { index } => write!(f, "live base {index} has no owner"),
        }
    }
}

impl Error for ConsistencyError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_message_names_both_sides() {
        let err = PoolError::CapacityExceeded {
            requested: 70_000,
            max: 65_536,
        };
        let msg = err.to_string();
        assert!(msg.contains("70000"));
        assert!(msg.contains("65536"));
    }

    #[test]
    fn out_of_bounds_message_does_not_overflow() {
        let err = ConsistencyError::OutOfBounds {
            start: u32::MAX,
            len: 2,
            capacity: 10,
        };
        assert!(err.to_string().contains("4294967297"));
    }
}
