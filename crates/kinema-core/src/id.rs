//! Strongly-typed identifiers for slots, handles, and processor types.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Time unit used when advancing processors.
///
/// The meaning of one unit is chosen by the caller (seconds, milliseconds,
/// frames); processors only require that it is consistent.
pub type MotiveTime = f32;

/// Base index of a contiguous slot range inside one pool.
///
/// A live allocation is identified by the first slot it occupies. The
/// remaining `dimension - 1` slots follow it directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotIndex(pub u32);

impl SlotIndex {
    /// Sentinel stored by handles that do not own any slot range.
    pub const INVALID: SlotIndex = SlotIndex(u32::MAX);

    /// Whether this is anything other than [`SlotIndex::INVALID`].
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }

    /// The index as a `usize`, for indexing payload columns.
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// One past the last slot of a range of `dimension` slots starting here.
    pub fn end(self, dimension: Dimension) -> u32 {
        self.0 + dimension.get()
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}", self.0)
        } else {
            write!(f, "invalid")
        }
    }
}

impl From<u32> for SlotIndex {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Number of contiguous slots one allocation occupies.
///
/// A scalar motivator uses 1, a 3D vector 3, a composite matrix motivator
/// however many child components it carries. Fixed for the lifetime of
/// the allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Dimension(pub u16);

impl Dimension {
    /// A single slot.
    pub const ONE: Dimension = Dimension(1);

    /// Slot count as `u32`, the width used for index arithmetic.
    pub fn get(self) -> u32 {
        u32::from(self.0)
    }

    /// Zero is never a valid allocation width.
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for Dimension {
    fn from(v: u16) -> Self {
        Self(v)
    }
}

/// Counter for unique [`HandleId`] allocation.
static HANDLE_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identity of a caller-owned handle.
///
/// Pools never hold references into handle objects. They record which
/// `HandleId` owns each base index and keep a forward map from id to
/// index, so a handle resolves its current slot through the pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(u64);

impl HandleId {
    /// Allocate a fresh, process-unique handle id. Thread-safe.
    pub fn next() -> Self {
        Self(HANDLE_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value, for diagnostics.
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "h{}", self.0)
    }
}

/// Type tag selecting a processor (animation algorithm) family.
///
/// An engine holds at most one processor per tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MotivatorType(pub &'static str);

impl MotivatorType {
    /// The tag's name.
    pub fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for MotivatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}
