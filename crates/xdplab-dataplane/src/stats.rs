//! Per-interface Statistics
//!
//! Lock-free packet and byte counters, one record per ingress interface.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use xdplab_common::LookupMiss;

/// Number of stats slots (interface indices `0..STATS_SLOTS`)
pub const STATS_SLOTS: usize = 1024;

/// Per-interface counters (cache-line aligned)
#[repr(C, align(64))]
#[derive(Debug, Default)]
pub struct DataRec {
    /// Packets received
    pub rx_packets: AtomicU64,
    /// Bytes received
    pub rx_bytes: AtomicU64,
}

impl DataRec {
    #[inline(always)]
    fn record_rx(&self, bytes: u64) {
        self.rx_packets.fetch_add(1, Ordering::Relaxed);
        self.rx_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Stats snapshot
    pub fn snapshot(&self) -> DataRecSnapshot {
        DataRecSnapshot {
            rx_packets: self.rx_packets.load(Ordering::Relaxed),
            rx_bytes: self.rx_bytes.load(Ordering::Relaxed),
        }
    }
}

/// Stats snapshot (non-atomic)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DataRecSnapshot {
    /// Packets received
    pub rx_packets: u64,
    /// Bytes received
    pub rx_bytes: u64,
}

impl DataRecSnapshot {
    /// Check if nothing was recorded
    pub fn is_zero(&self) -> bool {
        self.rx_packets == 0 && self.rx_bytes == 0
    }
}

/// Array of per-interface records
pub struct StatsMap {
    slots: Box<[DataRec]>,
}

impl Default for StatsMap {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsMap {
    /// Zeroed map with [`STATS_SLOTS`] records
    pub fn new() -> Self {
        let slots = (0..STATS_SLOTS).map(|_| DataRec::default()).collect();
        Self { slots }
    }

    /// Count one packet of `bytes` against slot `key`
    #[inline(always)]
    pub fn record(&self, key: u32, bytes: u64) -> Result<(), LookupMiss> {
        let rec = self
            .slots
            .get(key as usize)
            .ok_or(LookupMiss::StatsSlot(key))?;
        rec.record_rx(bytes);
        Ok(())
    }

    /// Snapshot of one slot
    pub fn snapshot(&self, key: u32) -> Option<DataRecSnapshot> {
        self.slots.get(key as usize).map(DataRec::snapshot)
    }

    /// Every slot that has seen traffic, by key
    pub fn active(&self) -> Vec<(u32, DataRecSnapshot)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(key, rec)| (key as u32, rec.snapshot()))
            .filter(|(_, snap)| !snap.is_zero())
            .collect()
    }

    /// Sum over all slots
    pub fn total(&self) -> DataRecSnapshot {
        let mut total = DataRecSnapshot::default();
        for rec in self.slots.iter() {
            let s = rec.snapshot();
            total.rx_packets += s.rx_packets;
            total.rx_bytes += s.rx_bytes;
        }
        total
    }
}

impl std::fmt::Debug for StatsMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsMap")
            .field("slots", &self.slots.len())
            .field("total", &self.total())
            .finish()
    }
}
