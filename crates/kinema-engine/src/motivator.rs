//! Caller-side motivator handles.

use std::any::Any;

use kinema_core::{Dimension, HandleId, MotivatorType, SlotIndex};

use crate::engine::MotiveEngine;
use crate::error::EngineError;
use crate::processor::MotiveTarget1f;

/// A caller's handle to one motivator living inside a [`MotiveEngine`].
///
/// The handle stores only its identity and the type of processor that holds
/// its data. The current slot index is looked up on every access, so the
/// handle stays valid across defragmentation.
///
/// Dropping a `Motivator` does not free its slots; call
/// [`invalidate`](Self::invalidate) first.
#[derive(Debug)]
pub struct Motivator {
    id: HandleId,
    type_tag: Option<MotivatorType>,
}

impl Motivator {
    /// An unbound handle.
    pub fn new() -> Self {
        Self {
            id: HandleId::next(),
            type_tag: None,
        }
    }

    /// Identity used by the engine's slot tables.
    pub fn id(&self) -> HandleId {
        self.id
    }

    /// The processor type holding this motivator, if bound.
    pub fn type_tag(&self) -> Option<MotivatorType> {
        self.type_tag
    }

    /// Bind to a new motivator of `type_tag`, releasing any previous one.
    pub fn initialize(
        &mut self,
        engine: &mut MotiveEngine,
        type_tag: MotivatorType,
        init: &dyn Any,
    ) -> Result<SlotIndex, EngineError> {
        self.invalidate(engine);
        let index = engine.initialize_motivator(type_tag, init, self.id)?;
        self.type_tag = Some(type_tag);
        Ok(index)
    }

    /// Release the motivator's slots. Returns whether anything was freed.
    pub fn invalidate(&mut self, engine: &mut MotiveEngine) -> bool {
        match self.type_tag.take() {
            Some(type_tag) => engine.remove_motivator(type_tag, self.id).is_ok(),
            None => false,
        }
    }

    /// Whether this handle still owns live slots in `engine`.
    pub fn is_valid(&self, engine: &MotiveEngine) -> bool {
        self.type_tag.is_some_and(|type_tag| {
            let index = engine.index_of(type_tag, self.id);
            engine.valid_motivator(type_tag, index, self.id)
        })
    }

    /// Current base index, or [`SlotIndex::INVALID`] when unbound.
    pub fn index(&self, engine: &MotiveEngine) -> SlotIndex {
        self.type_tag
            .map_or(SlotIndex::INVALID, |type_tag| engine.index_of(type_tag, self.id))
    }

    /// Number of slots this motivator spans.
    pub fn dimensions(&self, engine: &MotiveEngine) -> Option<Dimension> {
        let type_tag = self.type_tag?;
        engine.dimensions(type_tag, engine.index_of(type_tag, self.id))
    }

    /// Move ownership to a fresh handle, leaving `self` unbound.
    ///
    /// The data stays where it is; only the owner recorded in the slot table
    /// changes.
    pub fn take(&mut self, engine: &mut MotiveEngine) -> Result<Motivator, EngineError> {
        let type_tag = self.type_tag.ok_or(EngineError::Unbound)?;
        let index = engine.index_of(type_tag, self.id);
        let successor = Motivator {
            id: HandleId::next(),
            type_tag: Some(type_tag),
        };
        engine.transfer_motivator(type_tag, index, successor.id)?;
        self.type_tag = None;
        Ok(successor)
    }

    /// Current value of the first slot.
    pub fn value(&self, engine: &MotiveEngine) -> Option<f32> {
        self.child_value(engine, 0)
    }

    /// Current value of slot `child` within this motivator.
    pub fn child_value(&self, engine: &MotiveEngine, child: u16) -> Option<f32> {
        let index = self.child_index(engine, child)?;
        Some(engine.processor_1f(self.type_tag?)?.value(index))
    }

    /// Current velocity of slot `child`.
    pub fn child_velocity(&self, engine: &MotiveEngine, child: u16) -> Option<f32> {
        let index = self.child_index(engine, child)?;
        Some(engine.processor_1f(self.type_tag?)?.velocity(index))
    }

    /// Retarget every slot of this motivator.
    pub fn set_target(
        &self,
        engine: &mut MotiveEngine,
        target: MotiveTarget1f,
    ) -> Result<(), EngineError> {
        let dimension = self.dimensions(engine).ok_or(EngineError::Unbound)?;
        for child in 0..dimension.0 {
            self.set_child_target(engine, child, target)?;
        }
        Ok(())
    }

    /// Retarget slot `child` of this motivator.
    pub fn set_child_target(
        &self,
        engine: &mut MotiveEngine,
        child: u16,
        target: MotiveTarget1f,
    ) -> Result<(), EngineError> {
        let type_tag = self.type_tag.ok_or(EngineError::Unbound)?;
        let index = self.child_index(engine, child).ok_or(EngineError::Unbound)?;
        let processor = engine
            .processor_1f_mut(type_tag)
            .ok_or(EngineError::NotScalar { type_tag })?;
        processor.set_target(index, target);
        Ok(())
    }

    fn child_index(&self, engine: &MotiveEngine, child: u16) -> Option<SlotIndex> {
        let dimension = self.dimensions(engine)?;
        if child >= dimension.0 {
            return None;
        }
        Some(SlotIndex(self.index(engine).0 + u32::from(child)))
    }
}

impl Default for Motivator {
    fn default() -> Self {
        Self::new()
    }
}
