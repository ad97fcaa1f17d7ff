use std::time::Duration;

use memstall_common::ALLOC_RATE;
use memstall_telemetry::alloc::{allocated_bytes, AllocStatsSource, CountingAllocator};
use memstall_telemetry::MetricSource;

// The counters only move when the wrapper is the process allocator, so this
// test binary installs it the same way the harness binary does.
#[global_allocator]
static ALLOC: CountingAllocator = CountingAllocator;

#[test]
fn test_allocation_moves_the_counter() {
    let before = allocated_bytes();
    let buf = vec![0u8; 64 * 1024];
    std::hint::black_box(&buf);
    assert!(allocated_bytes() >= before + 64 * 1024);
}

#[test]
fn test_source_reports_alloc_rate() {
    let source = AllocStatsSource::new(Duration::from_secs(1));
    let _churn = vec![7u8; 10_000];
    let samples = source.poll();
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].name, ALLOC_RATE);
    assert!(samples[0].value >= 10_000.0);
}

#[test]
fn test_rate_resets_between_polls() {
    let source = AllocStatsSource::new(Duration::from_secs(1));
    let _churn = vec![7u8; 1_000_000];
    let first = source.poll();
    assert!(first[0].value >= 1_000_000.0);

    // nothing comparable allocated since the last poll; the margin leaves
    // room for allocations made by tests running in sibling threads
    let second = source.poll();
    assert!(second[0].value < 500_000.0);
}
