use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use memstall_common::{
    MetricSample, MetricSnapshot, Result, SampleKind, TelemetryError, ALLOC_RATE,
    COLLECTION_INDEX, GEN0_COLLECTIONS, GEN1_COLLECTIONS, GEN2_COLLECTIONS, PAUSE_MS,
    TIME_IN_COLLECTION,
};

pub mod alloc;

/// Abstraction over runtime memory-management counters for testability.
///
/// Implementations are polled from the sampler thread at the subscription
/// interval and report whatever they observed since the previous poll.
pub trait MetricSource: Send + Sync {
    fn poll(&self) -> Vec<MetricSample>;
}

/// Shared snapshot state, one atomic per field. Floating-point fields hold
/// `f64` bit patterns. Single writer (the sampler thread); readers take
/// plain copies, never holding a lock.
#[derive(Default)]
struct SnapshotCells {
    time_in_collection_pct: AtomicU64,
    gen0_collections: AtomicU64,
    gen1_collections: AtomicU64,
    gen2_collections: AtomicU64,
    alloc_rate_bytes: AtomicU64,
    last_pause_ms: AtomicU64,
    collection_index: AtomicU64,
}

impl SnapshotCells {
    fn read(&self) -> MetricSnapshot {
        MetricSnapshot {
            time_in_collection_pct: f64::from_bits(
                self.time_in_collection_pct.load(Ordering::Relaxed),
            ),
            gen0_collections: self.gen0_collections.load(Ordering::Relaxed),
            gen1_collections: self.gen1_collections.load(Ordering::Relaxed),
            gen2_collections: self.gen2_collections.load(Ordering::Relaxed),
            alloc_rate_bytes: f64::from_bits(self.alloc_rate_bytes.load(Ordering::Relaxed)),
            last_pause_ms: f64::from_bits(self.last_pause_ms.load(Ordering::Relaxed)),
            collection_index: self.collection_index.load(Ordering::Relaxed),
        }
    }

    /// Apply one sample. Returns `false` (leaving the snapshot untouched)
    /// for unrecognized names, kind mismatches, and non-finite values.
    fn apply(&self, sample: &MetricSample) -> bool {
        if !sample.value.is_finite() {
            return false;
        }
        match (sample.name.as_str(), sample.kind) {
            (TIME_IN_COLLECTION, SampleKind::Mean) => {
                self.time_in_collection_pct
                    .store(sample.value.to_bits(), Ordering::Relaxed);
            }
            (GEN0_COLLECTIONS, SampleKind::Sum) => {
                self.gen0_collections
                    .fetch_add(sample.value as u64, Ordering::Relaxed);
            }
            (GEN1_COLLECTIONS, SampleKind::Sum) => {
                self.gen1_collections
                    .fetch_add(sample.value as u64, Ordering::Relaxed);
            }
            (GEN2_COLLECTIONS, SampleKind::Sum) => {
                self.gen2_collections
                    .fetch_add(sample.value as u64, Ordering::Relaxed);
            }
            (ALLOC_RATE, SampleKind::Mean) => {
                self.alloc_rate_bytes
                    .store(sample.value.to_bits(), Ordering::Relaxed);
            }
            (PAUSE_MS, SampleKind::Mean) => {
                self.last_pause_ms
                    .store(sample.value.to_bits(), Ordering::Relaxed);
            }
            (COLLECTION_INDEX, SampleKind::Sum) => {
                self.collection_index
                    .fetch_add(sample.value as u64, Ordering::Relaxed);
            }
            _ => return false,
        }
        true
    }
}

/// Opaque handle returned by [`Telemetry::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

struct Sampler {
    id: SubscriptionId,
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

/// The telemetry sink: owns the metric snapshot and the sampler lifecycle.
///
/// At most one subscription may be live at a time; violating that is a
/// usage error, not a runtime condition, and callers are expected to treat
/// it as fatal.
pub struct Telemetry {
    source: Arc<dyn MetricSource>,
    cells: Arc<SnapshotCells>,
    active: Option<Sampler>,
    next_id: u64,
    print_every: u32,
}

impl Telemetry {
    pub fn new(source: Arc<dyn MetricSource>, print_every: u32) -> Self {
        Self {
            source,
            cells: Arc::new(SnapshotCells::default()),
            active: None,
            next_id: 0,
            print_every,
        }
    }

    /// Start the sampler thread, polling the source every `interval`.
    pub fn subscribe(&mut self, interval: Duration) -> Result<SubscriptionId> {
        if self.active.is_some() {
            return Err(TelemetryError::AlreadySubscribed);
        }

        let stop = Arc::new(AtomicBool::new(false));
        let thread = {
            let source = Arc::clone(&self.source);
            let cells = Arc::clone(&self.cells);
            let stop = Arc::clone(&stop);
            let print_every = self.print_every;
            std::thread::spawn(move || sample_loop(source, cells, stop, interval, print_every))
        };

        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.active = Some(Sampler { id, stop, thread });
        println!("[telemetry] Registered metric subscription.");
        Ok(id)
    }

    /// Stop the sampler thread and wait for it to exit.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> Result<()> {
        let sampler = match self.active.take() {
            Some(s) if s.id == id => s,
            other => {
                self.active = other;
                return Err(TelemetryError::NotSubscribed);
            }
        };
        sampler.stop.store(true, Ordering::Relaxed);
        let _ = sampler.thread.join();
        Ok(())
    }

    pub fn is_subscribed(&self) -> bool {
        self.active.is_some()
    }

    /// Current values of every known metric.
    pub fn snapshot(&self) -> MetricSnapshot {
        self.cells.read()
    }

    /// Apply one sample to the snapshot as the sampler thread would.
    /// Exposed for deterministic testing.
    pub fn apply_sample(&self, sample: &MetricSample) -> bool {
        self.cells.apply(sample)
    }
}

impl Drop for Telemetry {
    fn drop(&mut self) {
        if let Some(sampler) = self.active.take() {
            sampler.stop.store(true, Ordering::Relaxed);
            let _ = sampler.thread.join();
        }
    }
}

fn sample_loop(
    source: Arc<dyn MetricSource>,
    cells: Arc<SnapshotCells>,
    stop: Arc<AtomicBool>,
    interval: Duration,
    print_every: u32,
) {
    let mut recognized: u32 = 0;
    loop {
        std::thread::sleep(interval);
        if stop.load(Ordering::Relaxed) {
            return;
        }

        for sample in source.poll() {
            if cells.apply(&sample) {
                recognized += 1;
            }
        }

        if print_every > 0 && recognized >= print_every {
            let snap = cells.read();
            println!(
                "[telemetry] Time={:.1}% Gen0={} Gen1={} Gen2={}",
                snap.time_in_collection_pct,
                snap.gen0_collections,
                snap.gen1_collections,
                snap.gen2_collections,
            );
            recognized = 0;
        }
    }
}
