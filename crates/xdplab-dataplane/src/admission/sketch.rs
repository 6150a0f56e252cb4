//! Two-hash heavy-hitter sketch
//!
//! A count-min style table of atomic counters. Each flow key maps to one
//! slot per hash function; both slots are incremented on every packet and
//! the flow is declared heavy only when both counts exceed the threshold,
//! so a light flow colliding with a heavy one in a single slot still gets
//! through.

use crate::flow::FlowKey;
use crate::hash::{fasthash32, jhash};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use xdplab_common::PolicyViolation;

/// Default number of sketch slots
pub const DEFAULT_ENTRIES: usize = 4096;
/// Default per-slot threshold
pub const DEFAULT_THRESHOLD: u64 = 50;
/// Default jhash seed
pub const DEFAULT_JHASH_SEED: u32 = 0x2d31e867;
/// Default fast-hash seed
pub const DEFAULT_FASTHASH_SEED: u64 = 0xdeadbeef;

/// Sketch dimensions and seeds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SketchConfig {
    /// Number of counter slots
    pub entries: usize,
    /// Count above which a slot is hot
    pub threshold: u64,
    /// Seed for the first hash
    pub jhash_seed: u32,
    /// Seed for the second hash
    pub fasthash_seed: u64,
}

impl Default for SketchConfig {
    fn default() -> Self {
        Self {
            entries: DEFAULT_ENTRIES,
            threshold: DEFAULT_THRESHOLD,
            jhash_seed: DEFAULT_JHASH_SEED,
            fasthash_seed: DEFAULT_FASTHASH_SEED,
        }
    }
}

/// Counts seen by one admitted packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    /// Slot picked by jhash
    pub first_slot: usize,
    /// Slot picked by fast-hash
    pub second_slot: usize,
    /// Count in the first slot after this packet
    pub first: u64,
    /// Count in the second slot after this packet
    pub second: u64,
}

/// Heavy-hitter sketch
pub struct HeavyHitterSketch {
    slots: Box<[AtomicU64]>,
    config: SketchConfig,
}

impl HeavyHitterSketch {
    /// Allocate a zeroed sketch
    ///
    /// A zero `entries` is raised to one slot; configuration loading
    /// rejects it before it gets here.
    pub fn new(config: SketchConfig) -> Self {
        let entries = config.entries.max(1);
        let slots = (0..entries).map(|_| AtomicU64::new(0)).collect();
        Self { slots, config }
    }

    /// Sketch configuration
    pub fn config(&self) -> &SketchConfig {
        &self.config
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false; a sketch has at least one slot
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot indices for `key`, one per hash function
    #[inline]
    pub fn slots_for(&self, key: &FlowKey) -> (usize, usize) {
        let bytes = key.as_bytes();
        let n = self.slots.len();
        let first = jhash(&bytes, self.config.jhash_seed) as usize % n;
        let second = fasthash32(&bytes, self.config.fasthash_seed) as usize % n;
        (first, second)
    }

    /// Count one packet of `key` and decide
    ///
    /// When both hashes land on the same slot it is incremented once.
    #[inline]
    pub fn admit(&self, key: &FlowKey) -> Result<Observation, PolicyViolation> {
        let (first_slot, second_slot) = self.slots_for(key);

        let first = self.slots[first_slot].fetch_add(1, Ordering::Relaxed) + 1;
        let second = if second_slot == first_slot {
            first
        } else {
            self.slots[second_slot].fetch_add(1, Ordering::Relaxed) + 1
        };

        let threshold = self.config.threshold;
        if first > threshold && second > threshold {
            return Err(PolicyViolation::HeavyHitter {
                first,
                second,
                threshold,
            });
        }

        Ok(Observation {
            first_slot,
            second_slot,
            first,
            second,
        })
    }

    /// Current count of one slot
    pub fn count(&self, slot: usize) -> Option<u64> {
        self.slots.get(slot).map(|c| c.load(Ordering::Relaxed))
    }

    /// Zero every slot
    pub fn reset(&self) {
        for slot in self.slots.iter() {
            slot.store(0, Ordering::Relaxed);
        }
    }
}

impl std::fmt::Debug for HeavyHitterSketch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeavyHitterSketch")
            .field("entries", &self.slots.len())
            .field("threshold", &self.config.threshold)
            .finish()
    }
}
