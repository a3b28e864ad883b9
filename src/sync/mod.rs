//! Concurrency primitives
//!
//! The reader/writer lock guarding the shared index and the fixed-size
//! worker pool that coordinates crawl and query tasks.

pub mod queue;
pub mod rwlock;
