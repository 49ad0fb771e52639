//! Processor scheduling and lifecycle coordination for Kinema motivators.
//!
//! A [`MotiveEngine`] owns one [`Processor`] per motivator type, created on
//! first use from a [`ProcessorRegistry`]. Each frame it compacts every
//! processor's pool (per [`DefragmentPolicy`]) and advances the processors
//! in ascending priority order. Callers hold [`Motivator`] handles, which
//! resolve their slot index through the engine on every access.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod engine;
pub mod error;
pub mod motivator;
pub mod processor;
pub mod processors;
pub mod registry;

pub use config::{DefragmentPolicy, EngineConfig};
pub use engine::{FrameReport, MotiveEngine};
pub use error::EngineError;
pub use motivator::Motivator;
pub use processor::{MotiveTarget1f, Processor, Processor1f, SlotAccess};
pub use processors::{LinearInit, LinearProcessor, LinearStore};
pub use registry::{ProcessorFactory, ProcessorRegistry};
