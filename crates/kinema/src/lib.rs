//! Kinema: pooled, defragmenting storage for batched motivator simulation.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! Kinema sub-crates. For most users, adding `kinema` as a single dependency
//! is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use kinema::prelude::*;
//!
//! let mut engine = MotiveEngine::with_builtin();
//!
//! let mut position = Motivator::new();
//! position
//!     .initialize(&mut engine, LinearProcessor::TYPE, &LinearInit::new(vec![0.0, 0.0]))
//!     .unwrap();
//! position
//!     .set_target(&mut engine, MotiveTarget1f::new(10.0, 2.0))
//!     .unwrap();
//!
//! engine.advance_frame(1.0).unwrap();
//! assert_eq!(position.child_value(&engine, 1), Some(5.0));
//!
//! position.invalidate(&mut engine);
//! assert_eq!(engine.live_count(), 0);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `kinema-core` | IDs, error enums, allocator and payload traits |
//! | [`pool`] | `kinema-pool` | Index allocator, slot table, `SlotPool`, `SlotVec` |
//! | [`engine`] | `kinema-engine` | Processors, registry, `MotiveEngine`, `Motivator` |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and IDs (`kinema-core`).
///
/// Contains [`types::SlotIndex`], [`types::HandleId`], the error enums, and
/// the collaborator traits [`types::AllocatorCallbacks`] and
/// [`types::PayloadStore`].
pub use kinema_core as types;

/// Slot allocation and lifecycle (`kinema-pool`).
///
/// [`pool::SlotPool`] is the unit a processor owns; [`pool::IndexAllocator`]
/// and [`pool::SlotTable`] are available for custom compositions.
pub use kinema_pool as pool;

/// Processor scheduling and motivator handles (`kinema-engine`).
///
/// Implement [`engine::Processor`] for a new algorithm and register it with
/// an [`engine::ProcessorRegistry`].
pub use kinema_engine as engine;

/// Common imports for typical Kinema usage.
///
/// ```rust
/// use kinema::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use kinema_core::{Dimension, HandleId, MotiveTime, MotivatorType, PayloadStore, SlotIndex};

    // Errors
    pub use kinema_core::{ConsistencyError, PoolError};

    // Pool
    pub use kinema_pool::{PoolConfig, SlotPool, SlotVec};

    // Engine
    pub use kinema_engine::{
        DefragmentPolicy, EngineConfig, EngineError, LinearInit, LinearProcessor, MotiveEngine,
        MotiveTarget1f, Motivator, Processor, Processor1f, ProcessorRegistry, SlotAccess,
    };
}
