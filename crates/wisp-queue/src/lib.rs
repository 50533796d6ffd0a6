//! Keyed job queue for the Wisp stack.
//!
//! Serializes and deduplicates asynchronous work by key: at most one job
//! runs per key at a time, and callers that submit under a key that is
//! already running share the in-flight result instead of starting new work.
//!
//! Keys are plain strings. The result type is chosen per call, not per
//! queue, so one queue can host jobs of unrelated types.

pub mod error;
pub mod queue;

pub use error::JobError;
pub use queue::KeyedJobQueue;
