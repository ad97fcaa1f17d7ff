use serde::Serialize;
use thiserror::Error;

/// Fraction of runtime spent in collection, as a percentage. Mean-kind.
pub const TIME_IN_COLLECTION: &str = "time-in-collection";
/// Generation-0 collections completed. Sum-kind (per-interval increments).
pub const GEN0_COLLECTIONS: &str = "gen-0-collections";
/// Generation-1 collections completed. Sum-kind.
pub const GEN1_COLLECTIONS: &str = "gen-1-collections";
/// Generation-2 collections completed. Sum-kind.
pub const GEN2_COLLECTIONS: &str = "gen-2-collections";
/// Allocation rate in bytes per second. Mean-kind.
pub const ALLOC_RATE: &str = "alloc-rate";
/// Pause duration of the most recent collection, in milliseconds. Mean-kind.
pub const PAUSE_MS: &str = "pause-ms";
/// Monotonic collection counter. Sum-kind.
pub const COLLECTION_INDEX: &str = "collection-index";

/// How a sampled value combines with the running snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SampleKind {
    /// Per-interval increment; accumulated into the snapshot.
    Sum,
    /// Point-in-time level; replaces the previous value.
    Mean,
}

/// One named measurement produced by a metric source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSample {
    pub name: String,
    pub kind: SampleKind,
    pub value: f64,
}

impl MetricSample {
    pub fn sum(name: &str, value: f64) -> Self {
        Self { name: name.to_string(), kind: SampleKind::Sum, value }
    }

    pub fn mean(name: &str, value: f64) -> Self {
        Self { name: name.to_string(), kind: SampleKind::Mean, value }
    }
}

/// Plain-value copy of the telemetry state at one instant.
///
/// Every field starts at zero and keeps its last observed value when a
/// source stops producing the corresponding metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MetricSnapshot {
    pub time_in_collection_pct: f64,
    pub gen0_collections: u64,
    pub gen1_collections: u64,
    pub gen2_collections: u64,
    pub alloc_rate_bytes: f64,
    pub last_pause_ms: f64,
    pub collection_index: u64,
}

/// Error types for the telemetry subscription lifecycle
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TelemetryError {
    #[error("Telemetry already subscribed")]
    AlreadySubscribed,

    #[error("Telemetry not subscribed")]
    NotSubscribed,
}

/// Result type for telemetry operations
pub type Result<T> = std::result::Result<T, TelemetryError>;
