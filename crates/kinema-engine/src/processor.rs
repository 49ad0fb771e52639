//! The [`Processor`] capability trait.
//!
//! A processor owns every motivator of one animation algorithm, stored in a
//! [`SlotPool`] so the algorithm can update them in one batched pass. The
//! engine only sees processors as `Box<dyn Processor>`; everything it needs
//! (lifecycle, validity, compaction, frame advance) goes through this trait.

use std::any::Any;

use kinema_core::{
    ConsistencyError, Dimension, HandleId, MotiveTime, MotivatorType, PayloadStore, PoolError,
    SlotIndex,
};
use kinema_pool::{DefragReport, SlotPool};

use crate::error::EngineError;

/// Object-safe view of a [`SlotPool`], independent of its payload type.
pub trait SlotAccess {
    /// See [`SlotPool::remove`].
    fn remove(&mut self, index: SlotIndex) -> Result<Option<HandleId>, PoolError>;
    /// See [`SlotPool::transfer`].
    fn transfer(&mut self, index: SlotIndex, new_handle: HandleId) -> Result<HandleId, PoolError>;
    /// See [`SlotPool::defragment`].
    fn defragment(&mut self) -> DefragReport;
    /// See [`SlotPool::clear`].
    fn clear(&mut self) -> Vec<HandleId>;
    /// See [`SlotPool::valid_index`].
    fn valid_index(&self, index: SlotIndex) -> bool;
    /// See [`SlotPool::valid_handle`].
    fn valid_handle(&self, index: SlotIndex, handle: HandleId) -> bool;
    /// See [`SlotPool::index_of`].
    fn index_of(&self, handle: HandleId) -> SlotIndex;
    /// See [`SlotPool::dimensions`].
    fn dimensions(&self, index: SlotIndex) -> Option<Dimension>;
    /// See [`SlotPool::live_count`].
    fn live_count(&self) -> usize;
    /// See [`SlotPool::capacity`].
    fn capacity(&self) -> u32;
    /// See [`SlotPool::verify_internal_state`].
    fn verify_internal_state(&self) -> Result<(), ConsistencyError>;
}

impl<S: PayloadStore> SlotAccess for SlotPool<S> {
    fn remove(&mut self, index: SlotIndex) -> Result<Option<HandleId>, PoolError> {
        SlotPool::remove(self, index)
    }

    fn transfer(&mut self, index: SlotIndex, new_handle: HandleId) -> Result<HandleId, PoolError> {
        SlotPool::transfer(self, index, new_handle)
    }

    fn defragment(&mut self) -> DefragReport {
        SlotPool::defragment(self)
    }

    fn clear(&mut self) -> Vec<HandleId> {
        SlotPool::clear(self)
    }

    fn valid_index(&self, index: SlotIndex) -> bool {
        SlotPool::valid_index(self, index)
    }

    fn valid_handle(&self, index: SlotIndex, handle: HandleId) -> bool {
        SlotPool::valid_handle(self, index, handle)
    }

    fn index_of(&self, handle: HandleId) -> SlotIndex {
        SlotPool::index_of(self, handle)
    }

    fn dimensions(&self, index: SlotIndex) -> Option<Dimension> {
        SlotPool::dimensions(self, index)
    }

    fn live_count(&self) -> usize {
        SlotPool::live_count(self)
    }

    fn capacity(&self) -> u32 {
        SlotPool::capacity(self)
    }

    fn verify_internal_state(&self) -> Result<(), ConsistencyError> {
        SlotPool::verify_internal_state(self)
    }
}

/// One animation algorithm and all the motivators that use it.
///
/// # Contract
///
/// - `type_tag()` and `priority()` never change. Lower priorities advance
///   first, so a processor whose output feeds another must have a lower
///   priority than its consumer.
/// - `initialize_motivator()` downcasts `init` to its own init type and
///   fails with [`EngineError::InitMismatch`] otherwise.
/// - Layout changes (allocation, removal, relocation) only happen through
///   the processor's [`SlotPool`].
///
/// # Object safety
///
/// This trait is object-safe; the engine stores processors as
/// `Box<dyn Processor>`.
pub trait Processor: Send + 'static {
    /// The type tag this processor is registered under.
    fn type_tag(&self) -> MotivatorType;

    /// Update order: lower values advance earlier.
    fn priority(&self) -> i32;

    /// Allocate and initialize a motivator owned by `handle`.
    fn initialize_motivator(
        &mut self,
        init: &dyn Any,
        handle: HandleId,
    ) -> Result<SlotIndex, EngineError>;

    /// Advance every live motivator by `delta_time`.
    fn advance_frame(&mut self, delta_time: MotiveTime);

    /// The processor's pool, type-erased.
    fn slots(&self) -> &dyn SlotAccess;

    /// The processor's pool, type-erased and mutable.
    fn slots_mut(&mut self) -> &mut dyn SlotAccess;

    /// Scalar query interface, if this processor drives `f32` values.
    fn as_processor_1f(&self) -> Option<&dyn Processor1f> {
        None
    }

    /// Mutable scalar interface, if this processor drives `f32` values.
    fn as_processor_1f_mut(&mut self) -> Option<&mut dyn Processor1f> {
        None
    }

    /// Downcasting support for concrete processor access.
    fn as_any(&self) -> &dyn Any;
}

/// A target for one scalar slot: reach `value` after `time` units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotiveTarget1f {
    /// Value to arrive at.
    pub value: f32,
    /// Time until arrival. Zero or less snaps immediately.
    pub time: MotiveTime,
}

impl MotiveTarget1f {
    /// Create a target.
    pub fn new(value: f32, time: MotiveTime) -> Self {
        Self { value, time }
    }
}

/// Queries for processors whose slots each hold one `f32`.
///
/// `index` addresses a single slot: the base index of a one-dimensional
/// motivator, or `base + child` for a component of a wider one.
pub trait Processor1f {
    /// Current value.
    fn value(&self, index: SlotIndex) -> f32;
    /// Current rate of change.
    fn velocity(&self, index: SlotIndex) -> f32;
    /// Value being approached.
    fn target_value(&self, index: SlotIndex) -> f32;
    /// Rate of change on arrival.
    fn target_velocity(&self, index: SlotIndex) -> f32;
    /// Remaining distance to the target.
    fn difference(&self, index: SlotIndex) -> f32 {
        self.target_value(index) - self.value(index)
    }
    /// Time until the target is reached.
    fn target_time(&self, index: SlotIndex) -> MotiveTime;
    /// Retarget one slot.
    fn set_target(&mut self, index: SlotIndex, target: MotiveTarget1f);
}
