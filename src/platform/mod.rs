//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Time (wall clock milliseconds)
//! - Storage (LocalStorage on web, in-memory on native)

pub mod storage;
pub mod time;

pub use storage::{KeyValueStore, MemoryStore};
pub use time::now_ms;
