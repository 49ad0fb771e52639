//! Core types and traits for the Kinema motivator pools.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by every other crate in the workspace: slot and
//! handle identifiers, the error enums, and the two collaborator traits
//! ([`AllocatorCallbacks`] and [`PayloadStore`]) through which an index
//! allocator talks to the storage it manages.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod traits;

pub use error::{ConsistencyError, PoolError};
pub use id::{Dimension, HandleId, MotiveTime, MotivatorType, SlotIndex};
pub use traits::{AllocatorCallbacks, PayloadStore};
