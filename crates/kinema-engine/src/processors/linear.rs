//! Linear interpolation toward per-slot targets.
//!
//! Each slot moves at constant velocity so that it lands on its target
//! value exactly when the target time runs out. A motivator of dimension N
//! owns N independent slots (e.g. the x/y/z of a position).

use std::any::Any;

use kinema_core::{Dimension, HandleId, MotiveTime, MotivatorType, PayloadStore, SlotIndex};
use kinema_pool::{SlotPool, SlotVec};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::processor::{MotiveTarget1f, Processor, Processor1f, SlotAccess};

/// Init parameters for [`LinearProcessor`].
#[derive(Clone, Debug, PartialEq)]
pub struct LinearInit {
    /// Starting value of each slot; the length is the dimension.
    pub values: Vec<f32>,
    /// Optional target applied to every slot at creation.
    pub target: Option<MotiveTarget1f>,
}

impl LinearInit {
    /// Slots start at `values` and hold still.
    pub fn new(values: Vec<f32>) -> Self {
        Self {
            values,
            target: None,
        }
    }

    /// A single scalar slot.
    pub fn scalar(value: f32) -> Self {
        Self::new(vec![value])
    }

    /// Head every slot toward `target` from the start.
    pub fn with_target(mut self, target: MotiveTarget1f) -> Self {
        self.target = Some(target);
        self
    }
}

/// Payload columns for [`LinearProcessor`].
#[derive(Clone, Debug, Default)]
pub struct LinearStore {
    value: SlotVec<f32>,
    velocity: SlotVec<f32>,
    target: SlotVec<f32>,
    target_time: SlotVec<MotiveTime>,
}

impl LinearStore {
    fn retarget(&mut self, i: usize, target: MotiveTarget1f) {
        self.target[i] = target.value;
        if target.time > 0.0 {
            self.velocity[i] = (target.value - self.value[i]) / target.time;
            self.target_time[i] = target.time;
        } else {
            self.value[i] = target.value;
            self.velocity[i] = 0.0;
            self.target_time[i] = 0.0;
        }
    }

    /// Step every slot. Reset slots have zero target time and stay put.
    fn advance(&mut self, delta_time: MotiveTime) {
        let values = self.value.as_mut_slice();
        let velocities = self.velocity.as_mut_slice();
        let targets = self.target.as_slice();
        let times = self.target_time.as_mut_slice();
        for (((value, velocity), &target), time) in values
            .iter_mut()
            .zip(velocities.iter_mut())
            .zip(targets)
            .zip(times.iter_mut())
        {
            if *time <= 0.0 {
                continue;
            }
            if delta_time >= *time {
                *value = target;
                *velocity = 0.0;
                *time = 0.0;
            } else {
                *value += *velocity * delta_time;
                *time -= delta_time;
            }
        }
    }
}

impl PayloadStore for LinearStore {
    type Init = LinearInit;

    fn dimension(&self, init: &LinearInit) -> Dimension {
        // Oversized inits are rejected in `initialize_motivator`.
        Dimension(u16::try_from(init.values.len()).unwrap_or(0))
    }

    fn initialize(&mut self, init: &LinearInit, index: SlotIndex, dimension: Dimension) {
        self.value
            .slice_mut(index, dimension)
            .copy_from_slice(&init.values);
        self.target
            .slice_mut(index, dimension)
            .copy_from_slice(&init.values);
        self.velocity.reset(index, dimension);
        self.target_time.reset(index, dimension);
        if let Some(target) = init.target {
            let start = index.as_usize();
            for i in start..start + dimension.get() as usize {
                self.retarget(i, target);
            }
        }
    }

    fn remove(&mut self, index: SlotIndex, dimension: Dimension) {
        self.value.reset(index, dimension);
        self.velocity.reset(index, dimension);
        self.target.reset(index, dimension);
        self.target_time.reset(index, dimension);
    }

    fn move_slots(&mut self, old: SlotIndex, new: SlotIndex, dimension: Dimension) {
        self.value.move_slots(old, new, dimension);
        self.velocity.move_slots(old, new, dimension);
        self.target.move_slots(old, new, dimension);
        self.target_time.move_slots(old, new, dimension);
        // Stale source slots past the new range must not keep animating.
        let tail_start = new.end(dimension).max(old.0);
        let tail_len = old.end(dimension) - tail_start;
        if tail_len > 0 {
            // `tail_len <= dimension`, which fits in u16.
            let tail = Dimension(tail_len as u16);
            self.target_time.reset(SlotIndex(tail_start), tail);
            self.velocity.reset(SlotIndex(tail_start), tail);
        }
    }

    fn set_num_indices(&mut self, num_indices: u32) {
        self.value.set_num_indices(num_indices);
        self.velocity.set_num_indices(num_indices);
        self.target.set_num_indices(num_indices);
        self.target_time.set_num_indices(num_indices);
    }
}

/// Drives `f32` slots linearly toward their targets.
pub struct LinearProcessor {
    pool: SlotPool<LinearStore>,
}

impl LinearProcessor {
    /// Type tag under which this processor registers.
    pub const TYPE: MotivatorType = MotivatorType("linear");

    /// Create an empty processor.
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        Ok(Self {
            pool: SlotPool::with_config(LinearStore::default(), &config.pool)?,
        })
    }

    /// [`ProcessorFactory`](crate::ProcessorFactory) for the registry.
    pub fn factory(config: &EngineConfig) -> Result<Box<dyn Processor>, EngineError> {
        Ok(Box::new(Self::new(config)?))
    }

    /// The underlying pool.
    pub fn pool(&self) -> &SlotPool<LinearStore> {
        &self.pool
    }

    /// Every value slot, including free ones, for batched reads.
    pub fn values(&self) -> &[f32] {
        self.pool.store().value.as_slice()
    }
}

impl Processor for LinearProcessor {
    fn type_tag(&self) -> MotivatorType {
        Self::TYPE
    }

    fn priority(&self) -> i32 {
        0
    }

    fn initialize_motivator(
        &mut self,
        init: &dyn Any,
        handle: HandleId,
    ) -> Result<SlotIndex, EngineError> {
        let init = init
            .downcast_ref::<LinearInit>()
            .ok_or(EngineError::InitMismatch {
                type_tag: Self::TYPE,
            })?;
        if init.values.len() > usize::from(u16::MAX) {
            return Err(EngineError::InitTooWide {
                type_tag: Self::TYPE,
                requested: init.values.len(),
            });
        }
        self.pool
            .initialize(init, handle)
            .map_err(EngineError::pool(Self::TYPE))
    }

    fn advance_frame(&mut self, delta_time: MotiveTime) {
        self.pool.store_mut().advance(delta_time);
    }

    fn slots(&self) -> &dyn SlotAccess {
        &self.pool
    }

    fn slots_mut(&mut self) -> &mut dyn SlotAccess {
        &mut self.pool
    }

    fn as_processor_1f(&self) -> Option<&dyn Processor1f> {
        Some(self)
    }

    fn as_processor_1f_mut(&mut self) -> Option<&mut dyn Processor1f> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Processor1f for LinearProcessor {
    fn value(&self, index: SlotIndex) -> f32 {
        self.pool.store().value[index.as_usize()]
    }

    fn velocity(&self, index: SlotIndex) -> f32 {
        self.pool.store().velocity[index.as_usize()]
    }

    fn target_value(&self, index: SlotIndex) -> f32 {
        self.pool.store().target[index.as_usize()]
    }

    fn target_velocity(&self, _index: SlotIndex) -> f32 {
        0.0
    }

    fn target_time(&self, index: SlotIndex) -> MotiveTime {
        self.pool.store().target_time[index.as_usize()]
    }

    fn set_target(&mut self, index: SlotIndex, target: MotiveTarget1f) {
        self.pool.store_mut().retarget(index.as_usize(), target);
    }
}
