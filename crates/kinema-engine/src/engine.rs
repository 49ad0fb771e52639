//! The engine context: one processor per motivator type.
//!
//! [`MotiveEngine`] replaces a process-wide singleton. It is built from a
//! [`ProcessorRegistry`], creates each processor the first time its type is
//! used, advances processors in static priority order, and drops them when
//! it is dropped.

use std::any::Any;

use indexmap::IndexMap;
use kinema_core::{Dimension, HandleId, MotiveTime, MotivatorType, SlotIndex};
use tracing::{debug, trace};

use crate::config::{DefragmentPolicy, EngineConfig};
use crate::error::EngineError;
use crate::processor::{Processor, Processor1f};
use crate::registry::ProcessorRegistry;

/// Summary of one [`MotiveEngine::advance_frame`] call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Frame counter after this call (starts at 1).
    pub frame: u64,
    /// Processors advanced.
    pub processors: usize,
    /// Slot ranges relocated by defragmentation this frame.
    pub relocations: usize,
}

/// Owns and schedules every processor for one simulation.
pub struct MotiveEngine {
    config: EngineConfig,
    registry: ProcessorRegistry,
    processors: IndexMap<MotivatorType, Box<dyn Processor>>,
    /// Processor tags sorted by ascending priority (stable on ties).
    order: Vec<MotivatorType>,
    frame: u64,
}

impl MotiveEngine {
    /// Create an engine. Processors are instantiated lazily.
    pub fn new(registry: ProcessorRegistry, config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            config,
            registry,
            processors: IndexMap::new(),
            order: Vec::new(),
            frame: 0,
        })
    }

    /// An engine with the built-in processors and default configuration.
    pub fn with_builtin() -> Self {
        Self {
            config: EngineConfig::default(),
            registry: ProcessorRegistry::with_builtin(),
            processors: IndexMap::new(),
            order: Vec::new(),
            frame: 0,
        }
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Frames advanced so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// The processor for `type_tag`, created on first use.
    pub fn processor_mut(
        &mut self,
        type_tag: MotivatorType,
    ) -> Result<&mut dyn Processor, EngineError> {
        if !self.processors.contains_key(&type_tag) {
            let processor = self.registry.create(type_tag, &self.config)?;
            self.insert(type_tag, processor);
        }
        match self.processors.get_mut(&type_tag) {
            Some(p) => Ok(p.as_mut()),
            None => Err(EngineError::UnknownType { type_tag }),
        }
    }

    /// The processor for `type_tag`, if it has been created.
    pub fn processor(&self, type_tag: MotivatorType) -> Option<&dyn Processor> {
        self.processors.get(&type_tag).map(|p| p.as_ref())
    }

    /// The processor for `type_tag`, downcast to its concrete type.
    pub fn processor_as<P: Processor>(&self, type_tag: MotivatorType) -> Option<&P> {
        self.processor(type_tag)?.as_any().downcast_ref::<P>()
    }

    /// Scalar query interface of the processor for `type_tag`.
    pub fn processor_1f(&self, type_tag: MotivatorType) -> Option<&dyn Processor1f> {
        self.processor(type_tag)?.as_processor_1f()
    }

    /// Mutable scalar interface of the processor for `type_tag`.
    pub fn processor_1f_mut(&mut self, type_tag: MotivatorType) -> Option<&mut dyn Processor1f> {
        self.processors.get_mut(&type_tag)?.as_processor_1f_mut()
    }

    /// Create a motivator owned by `handle` in the processor for `type_tag`.
    pub fn initialize_motivator(
        &mut self,
        type_tag: MotivatorType,
        init: &dyn Any,
        handle: HandleId,
    ) -> Result<SlotIndex, EngineError> {
        let index = self
            .processor_mut(type_tag)?
            .initialize_motivator(init, handle)?;
        trace!(%type_tag, %handle, %index, "initialized motivator");
        Ok(index)
    }

    /// Remove the motivator owned by `handle`, returning the index it held.
    pub fn remove_motivator(
        &mut self,
        type_tag: MotivatorType,
        handle: HandleId,
    ) -> Result<SlotIndex, EngineError> {
        let slots = self.existing_mut(type_tag)?.slots_mut();
        let index = slots.index_of(handle);
        slots
            .remove(index)
            .map_err(EngineError::pool(type_tag))?;
        Ok(index)
    }

    /// Rebind the motivator at `index` to `new_handle`, returning the
    /// previous owner.
    pub fn transfer_motivator(
        &mut self,
        type_tag: MotivatorType,
        index: SlotIndex,
        new_handle: HandleId,
    ) -> Result<HandleId, EngineError> {
        self.existing_mut(type_tag)?
            .slots_mut()
            .transfer(index, new_handle)
            .map_err(EngineError::pool(type_tag))
    }

    /// Whether `handle` owns the live motivator at `index`.
    pub fn valid_motivator(&self, type_tag: MotivatorType, index: SlotIndex, handle: HandleId) -> bool {
        self.processor(type_tag)
            .is_some_and(|p| p.slots().valid_handle(index, handle))
    }

    /// Current index of `handle`, or [`SlotIndex::INVALID`].
    pub fn index_of(&self, type_tag: MotivatorType, handle: HandleId) -> SlotIndex {
        self.processor(type_tag)
            .map_or(SlotIndex::INVALID, |p| p.slots().index_of(handle))
    }

    /// Slot count of the motivator at `index`.
    pub fn dimensions(&self, type_tag: MotivatorType, index: SlotIndex) -> Option<Dimension> {
        self.processor(type_tag)?.slots().dimensions(index)
    }

    /// Advance every processor by `delta_time`, lowest priority first.
    ///
    /// Under [`DefragmentPolicy::EveryFrame`] each processor compacts its
    /// pool before advancing.
    pub fn advance_frame(&mut self, delta_time: MotiveTime) -> Result<FrameReport, EngineError> {
        let mut report = FrameReport::default();
        for &type_tag in &self.order {
            let Some(processor) = self.processors.get_mut(&type_tag) else {
                continue;
            };
            if self.config.defragment_policy == DefragmentPolicy::EveryFrame {
                report.relocations += processor.slots_mut().defragment().moves();
            }
            processor.advance_frame(delta_time);
            if self.config.verify_each_frame {
                processor
                    .slots()
                    .verify_internal_state()
                    .map_err(|source| EngineError::Consistency { type_tag, source })?;
            }
            report.processors += 1;
        }
        self.frame += 1;
        report.frame = self.frame;
        trace!(
            frame = report.frame,
            relocations = report.relocations,
            "advanced frame"
        );
        Ok(report)
    }

    /// Defragment every processor now, returning the number of relocations.
    pub fn defragment_all(&mut self) -> usize {
        let mut moves = 0;
        for &type_tag in &self.order {
            if let Some(processor) = self.processors.get_mut(&type_tag) {
                moves += processor.slots_mut().defragment().moves();
            }
        }
        debug!(moves, "defragmented all processors");
        moves
    }

    /// Cross-check every processor's pool.
    pub fn verify_internal_state(&self) -> Result<(), EngineError> {
        for (&type_tag, processor) in &self.processors {
            processor
                .slots()
                .verify_internal_state()
                .map_err(|source| EngineError::Consistency { type_tag, source })?;
        }
        Ok(())
    }

    /// Remove every motivator from every processor.
    ///
    /// Returns the number of handles unbound. Processors stay registered.
    pub fn clear(&mut self) -> usize {
        let unbound: usize = self
            .processors
            .values_mut()
            .map(|p| p.slots_mut().clear().len())
            .sum();
        debug!(unbound, "cleared engine");
        unbound
    }

    /// Live motivators across all processors.
    pub fn live_count(&self) -> usize {
        self.processors.values().map(|p| p.slots().live_count()).sum()
    }

    /// Instantiated processor tags in update order.
    pub fn update_order(&self) -> &[MotivatorType] {
        &self.order
    }

    fn existing_mut(&mut self, type_tag: MotivatorType) -> Result<&mut dyn Processor, EngineError> {
        match self.processors.get_mut(&type_tag) {
            Some(p) => Ok(p.as_mut()),
            None => Err(EngineError::UnknownType { type_tag }),
        }
    }

    fn insert(&mut self, type_tag: MotivatorType, processor: Box<dyn Processor>) {
        debug!(%type_tag, priority = processor.priority(), "created processor");
        self.processors.insert(type_tag, processor);
        self.order.push(type_tag);
        let processors = &self.processors;
        self.order
            .sort_by_key(|t| processors.get(t).map_or(0, |p| p.priority()));
    }
}
