//! Flow Admission
//!
//! Two ways of deciding whether a packet may be forwarded:
//!
//! - [`SourceThresholds`]: exact per-source packet budget, fail closed
//! - [`HeavyHitterSketch`]: approximate per-flow counting over two hash
//!   slots, dropping a flow only when both slots are over the threshold
//!
//! Both only mutate counters, via relaxed atomic fetch-and-add, so they
//! can be shared across workers behind an `Arc`.

pub mod sketch;
pub mod threshold;

pub use sketch::{HeavyHitterSketch, Observation, SketchConfig};
pub use threshold::{SourceThresholds, ThresholdRecord};
