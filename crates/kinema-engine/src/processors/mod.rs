//! Processors shipped with the engine.

pub mod linear;

pub use linear::{LinearInit, LinearProcessor, LinearStore};
