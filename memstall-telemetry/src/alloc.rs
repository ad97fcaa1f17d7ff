//! Allocation counters backed by a wrapping global allocator, and the
//! production [`MetricSource`] built on top of them.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use memstall_common::{MetricSample, ALLOC_RATE};

use crate::MetricSource;

static ALLOCATED_BYTES: AtomicU64 = AtomicU64::new(0);
static FREED_BYTES: AtomicU64 = AtomicU64::new(0);

/// Global allocator wrapper that counts every byte handed out or returned.
/// Install in the binary with `#[global_allocator]`.
pub struct CountingAllocator;

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        ALLOCATED_BYTES.fetch_add(layout.size() as u64, Ordering::Relaxed);
        System.alloc(layout)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        FREED_BYTES.fetch_add(layout.size() as u64, Ordering::Relaxed);
        System.dealloc(ptr, layout)
    }
}

/// Total bytes allocated through [`CountingAllocator`] since process start.
pub fn allocated_bytes() -> u64 {
    ALLOCATED_BYTES.load(Ordering::Relaxed)
}

/// Total bytes freed through [`CountingAllocator`] since process start.
pub fn freed_bytes() -> u64 {
    FREED_BYTES.load(Ordering::Relaxed)
}

/// Metric source reporting the allocation rate observed between polls.
///
/// Collector-specific metrics are never produced here; their snapshot
/// fields simply retain their last known value.
pub struct AllocStatsSource {
    interval: Duration,
    last_allocated: AtomicU64,
}

impl AllocStatsSource {
    /// `interval` must match the subscription interval so the byte delta
    /// per poll converts to a per-second rate.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_allocated: AtomicU64::new(allocated_bytes()),
        }
    }
}

impl MetricSource for AllocStatsSource {
    fn poll(&self) -> Vec<MetricSample> {
        let now = allocated_bytes();
        let prev = self.last_allocated.swap(now, Ordering::Relaxed);
        let rate = now.saturating_sub(prev) as f64 / self.interval.as_secs_f64();
        vec![MetricSample::mean(ALLOC_RATE, rate)]
    }
}
