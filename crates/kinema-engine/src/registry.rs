//! Processor factories keyed by type tag.

use indexmap::IndexMap;
use kinema_core::MotivatorType;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::processor::Processor;
use crate::processors::LinearProcessor;

/// Builds a fresh processor for an engine.
pub type ProcessorFactory = fn(&EngineConfig) -> Result<Box<dyn Processor>, EngineError>;

/// Maps each [`MotivatorType`] to the factory that builds its processor.
///
/// A registry is built once and handed to [`MotiveEngine::new`](crate::MotiveEngine::new);
/// the engine instantiates processors lazily, on first use of their type.
#[derive(Clone, Debug, Default)]
pub struct ProcessorRegistry {
    factories: IndexMap<MotivatorType, ProcessorFactory>,
}

impl ProcessorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-populated with the processors shipped in this crate.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.factories.insert(LinearProcessor::TYPE, LinearProcessor::factory);
        registry
    }

    /// Register `factory` under `type_tag`.
    pub fn register(
        &mut self,
        type_tag: MotivatorType,
        factory: ProcessorFactory,
    ) -> Result<(), EngineError> {
        if self.factories.contains_key(&type_tag) {
            return Err(EngineError::DuplicateType { type_tag });
        }
        self.factories.insert(type_tag, factory);
        Ok(())
    }

    /// Whether a factory exists for `type_tag`.
    pub fn contains(&self, type_tag: MotivatorType) -> bool {
        self.factories.contains_key(&type_tag)
    }

    /// Registered tags, in registration order.
    pub fn types(&self) -> impl Iterator<Item = MotivatorType> + '_ {
        self.factories.keys().copied()
    }

    /// Build the processor for `type_tag`.
    pub fn create(
        &self,
        type_tag: MotivatorType,
        config: &EngineConfig,
    ) -> Result<Box<dyn Processor>, EngineError> {
        let factory = self
            .factories
            .get(&type_tag)
            .ok_or(EngineError::UnknownType { type_tag })?;
        factory(config)
    }
}
