//! Pooled slot allocation for batched motivator processing.
//!
//! A pool hands out contiguous, variable-width slot ranges, records which
//! handle owns each range, and periodically compacts live ranges towards
//! index 0 so that per-frame processing can scan `[0, used_slots)` without
//! holes. No handle is ever left pointing at data that moved.
//!
//! # Architecture
//!
//! ```text
//! SlotPool<S: PayloadStore> (lifecycle: initialize / remove / transfer)
//! ├── IndexAllocator  first-fit ranges, coalescing free list, defragment
//! │     └── AllocatorCallbacks ──► payload first, then SlotTable
//! ├── SlotTable       base index ⇄ HandleId, both directions
//! └── S               processor-owned payload columns (often SlotVec<T>)
//! ```
//!
//! # Example
//!
//! ```
//! use kinema_core::{Dimension, HandleId, PayloadStore, SlotIndex};
//! use kinema_pool::{SlotPool, SlotVec};
//!
//! #[derive(Default)]
//! struct Values(SlotVec<f32>);
//!
//! impl PayloadStore for Values {
//!     type Init = Vec<f32>;
//!     fn dimension(&self, init: &Vec<f32>) -> Dimension {
//!         Dimension(init.len() as u16)
//!     }
//!     fn initialize(&mut self, init: &Vec<f32>, index: SlotIndex, dim: Dimension) {
//!         self.0.slice_mut(index, dim).copy_from_slice(init);
//!     }
//!     fn remove(&mut self, index: SlotIndex, dim: Dimension) {
//!         self.0.reset(index, dim);
//!     }
//!     fn move_slots(&mut self, old: SlotIndex, new: SlotIndex, dim: Dimension) {
//!         self.0.move_slots(old, new, dim);
//!     }
//!     fn set_num_indices(&mut self, n: u32) {
//!         self.0.set_num_indices(n);
//!     }
//! }
//!
//! let mut pool = SlotPool::new(Values::default());
//! let (a, b) = (HandleId::next(), HandleId::next());
//! let ia = pool.initialize(&vec![1.0], a).unwrap();
//! pool.initialize(&vec![2.0, 3.0, 4.0], b).unwrap();
//! pool.remove(ia).unwrap();
//!
//! let report = pool.defragment();
//! assert_eq!(report.moves(), 1);
//! assert_eq!(pool.index_of(b), SlotIndex(0));
//! assert_eq!(pool.store().0.as_slice(), &[2.0, 3.0, 4.0]);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod allocator;
pub mod column;
pub mod config;
pub mod pool;
pub mod slot_table;

pub use allocator::{DefragReport, IndexAllocator, Relocation};
pub use column::SlotVec;
pub use config::{ConfigError, PoolConfig};
pub use pool::SlotPool;
pub use slot_table::SlotTable;
