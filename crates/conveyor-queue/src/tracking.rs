//! Lightweight throughput and high-water-mark tracking.
//!
//! Counters are bumped from inside the queue's critical section but read
//! without the lock, so a `QueueStats` snapshot is advisory.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

#[derive(Default)]
pub struct PeakTracker {
    peak: AtomicUsize,
}

impl PeakTracker {
    pub fn new() -> Self {
        Self {
            peak: AtomicUsize::new(0),
        }
    }

    /// Record a new occupancy value; updates peak if higher.
    pub fn record(&self, occupancy: usize) {
        let mut cur = self.peak.load(Ordering::Relaxed);
        while occupancy > cur {
            match self.peak.compare_exchange(
                cur,
                occupancy,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(observed) => cur = observed,
            }
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Relaxed)
    }
}

/// Counters owned by one queue instance.
#[derive(Default)]
pub(crate) struct QueueCounters {
    put: AtomicU64,
    taken: AtomicU64,
    occupancy: PeakTracker,
}

impl QueueCounters {
    pub(crate) fn record_put(&self, occupancy: usize) {
        self.put.fetch_add(1, Ordering::Relaxed);
        self.occupancy.record(occupancy);
        #[cfg(feature = "tracing")]
        tracing::trace!(occupancy, peak = self.occupancy.peak(), "queue put");
    }

    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    pub(crate) fn record_taken(&self, count: usize, occupancy: usize) {
        self.taken.fetch_add(count as u64, Ordering::Relaxed);
        #[cfg(feature = "tracing")]
        tracing::trace!(count, occupancy, "queue take");
    }

    pub(crate) fn snapshot(&self) -> QueueStats {
        QueueStats {
            put: self.put.load(Ordering::Relaxed),
            taken: self.taken.load(Ordering::Relaxed),
            peak_occupancy: self.occupancy.peak(),
        }
    }
}

/// Point-in-time counters for a queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Items accepted by `put`/`try_put`, markers included.
    pub put: u64,
    /// Items handed out by `take`/`try_take`/`drain`, markers included.
    pub taken: u64,
    /// Highest occupancy observed right after an insert.
    pub peak_occupancy: usize,
}
