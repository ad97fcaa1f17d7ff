use std::sync::Arc;
use std::time::Duration;

use memstall_common::{
    MetricSample, ALLOC_RATE, COLLECTION_INDEX, GEN0_COLLECTIONS, PAUSE_MS, TIME_IN_COLLECTION,
};
use memstall_harness::runner::{self, RunConfig};
use memstall_telemetry::{MetricSource, Telemetry};

/// Emits the same scripted payload on every poll, like a runtime whose
/// counters tick once per interval.
struct ScriptedSource(Vec<MetricSample>);

impl MetricSource for ScriptedSource {
    fn poll(&self) -> Vec<MetricSample> {
        self.0.clone()
    }
}

fn short_config() -> RunConfig {
    RunConfig {
        duration: Duration::from_millis(200),
        window_capacity: 8,
        growth_batch: 50,
        growth_period: Duration::from_millis(40),
        // effectively disabled so scheduler jitter cannot flake the run
        outlier_ratio: 1e12,
        warmup_iterations: 10,
    }
}

#[test]
fn test_end_to_end_run_with_scripted_telemetry() {
    let source = ScriptedSource(vec![
        MetricSample::mean(TIME_IN_COLLECTION, 3.5),
        MetricSample::sum(GEN0_COLLECTIONS, 1.0),
        MetricSample::sum(COLLECTION_INDEX, 1.0),
        MetricSample::mean(PAUSE_MS, 0.8),
        MetricSample::mean(ALLOC_RATE, 1024.0),
    ]);
    let mut telemetry = Telemetry::new(Arc::new(source), 4);
    let id = telemetry
        .subscribe(Duration::from_millis(10))
        .expect("subscribe");

    let summary = runner::run(&short_config(), &telemetry);
    telemetry.unsubscribe(id).expect("unsubscribe");

    // the workload executed faithfully
    assert_eq!(summary.checksum, 0);
    assert!(summary.iterations > 0);

    // growth is additive: every batch adds exactly growth_batch entries
    assert!(summary.growth_batches >= 1);
    assert_eq!(summary.entries_total, summary.growth_batches as usize * 50);

    // the threshold was set impossibly high; nothing may have fired
    assert!(summary.outliers.is_empty());

    // the sampler observed the scripted metrics; Sum kinds accumulated
    let snap = telemetry.snapshot();
    assert_eq!(snap.time_in_collection_pct, 3.5);
    assert_eq!(snap.last_pause_ms, 0.8);
    assert_eq!(snap.alloc_rate_bytes, 1024.0);
    assert!(snap.gen0_collections >= 1);
    assert!(snap.collection_index >= 1);
}

#[test]
fn test_missing_metrics_retain_defaults() {
    // a source that only knows the allocation rate leaves every collector
    // field at its zero default
    let source = ScriptedSource(vec![MetricSample::mean(ALLOC_RATE, 2048.0)]);
    let mut telemetry = Telemetry::new(Arc::new(source), 4);
    let id = telemetry
        .subscribe(Duration::from_millis(5))
        .expect("subscribe");
    std::thread::sleep(Duration::from_millis(60));
    telemetry.unsubscribe(id).expect("unsubscribe");

    let snap = telemetry.snapshot();
    assert_eq!(snap.alloc_rate_bytes, 2048.0);
    assert_eq!(snap.gen0_collections, 0);
    assert_eq!(snap.time_in_collection_pct, 0.0);
    assert_eq!(snap.last_pause_ms, 0.0);
    assert_eq!(snap.collection_index, 0);
}

#[test]
fn test_subscription_contract_is_enforced_end_to_end() {
    let mut telemetry = Telemetry::new(Arc::new(ScriptedSource(Vec::new())), 4);
    let id = telemetry
        .subscribe(Duration::from_millis(10))
        .expect("subscribe");
    assert!(telemetry.subscribe(Duration::from_millis(10)).is_err());
    telemetry.unsubscribe(id).expect("unsubscribe");
    assert!(telemetry.unsubscribe(id).is_err());
}
