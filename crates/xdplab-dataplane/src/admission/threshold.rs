//! Exact per-source threshold

use dashmap::DashMap;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicU64, Ordering};
use xdplab_common::PolicyViolation;

/// Per-source budget and running count
#[derive(Debug)]
pub struct ThresholdRecord {
    /// Packets admitted before the source is cut off
    pub threshold: u64,
    /// Packets seen so far, including rejected ones
    pub received: AtomicU64,
}

impl ThresholdRecord {
    /// New record with nothing received
    pub fn new(threshold: u64) -> Self {
        Self {
            threshold,
            received: AtomicU64::new(0),
        }
    }
}

/// Source IP → threshold record
///
/// Records are installed at startup and never removed while packets flow.
#[derive(Debug, Default)]
pub struct SourceThresholds {
    records: DashMap<Ipv4Addr, ThresholdRecord>,
}

impl SourceThresholds {
    /// Empty table; every source is rejected until configured
    pub fn new() -> Self {
        Self::default()
    }

    /// Install (or reset) the budget for `source`
    pub fn set_threshold(&self, source: Ipv4Addr, threshold: u64) {
        self.records.insert(source, ThresholdRecord::new(threshold));
    }

    /// Count one packet from `source` and decide
    ///
    /// Returns the updated count if admitted. A source with no record is
    /// rejected.
    #[inline]
    pub fn admit(&self, source: Ipv4Addr) -> Result<u64, PolicyViolation> {
        let record = self
            .records
            .get(&source)
            .ok_or(PolicyViolation::NoThresholdConfigured(source))?;

        let received = record.received.fetch_add(1, Ordering::Relaxed) + 1;
        if received > record.threshold {
            return Err(PolicyViolation::OverThreshold {
                src: source,
                received,
                threshold: record.threshold,
            });
        }

        Ok(received)
    }

    /// Packets counted for `source`
    pub fn received(&self, source: Ipv4Addr) -> Option<u64> {
        self.records
            .get(&source)
            .map(|r| r.received.load(Ordering::Relaxed))
    }

    /// Number of configured sources
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
