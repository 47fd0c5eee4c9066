//! Engine adapters
//!
//! Ready-made [`OrmEngine`](crate::engine::OrmEngine) implementations:
//! - Memory: an in-process engine that checks the merged wiring and hands
//!   out collection handles, for tests and local development

pub mod memory;

pub use memory::{MemoryCollection, MemoryEngine};
