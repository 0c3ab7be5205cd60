//! Timing module for the capture loop
//!
//! The recorder state machine is pure and takes explicit instants; this
//! module provides the monotonic clock the live capture loop feeds it with,
//! plus a manually-driven clock for deterministic tests.

pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};
