//! Durable document storage
//!
//! One JSON document per store, written with a temp-file-then-rename
//! discipline so a crash mid-write never leaves a torn document, and mutated
//! only through a strict FIFO single-writer queue.

mod document;
mod errors;

pub use document::DocumentStore;
pub use errors::{StoreError, StoreResult};
