use std::path::Path;
use std::time::{Duration, Instant};

use memstall_telemetry::Telemetry;
use serde::Serialize;

use crate::store::{AnchorRegistry, EphemeralStore};
use crate::window::MedianWindow;
use crate::workload;

/// Everything the stress loop needs to know about a run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub duration: Duration,
    pub window_capacity: usize,
    pub growth_batch: usize,
    pub growth_period: Duration,
    pub outlier_ratio: f64,
    pub warmup_iterations: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(100),
            window_capacity: 20,
            growth_batch: 10_000,
            growth_period: Duration::from_secs(1),
            outlier_ratio: 100.0,
            warmup_iterations: 100,
        }
    }
}

/// One latency anomaly, with the telemetry state observed when it fired.
#[derive(Debug, Clone, Serialize)]
pub struct OutlierEvent {
    pub iteration: u64,
    pub duration_us: f64,
    pub ratio: f64,
    pub median_us: f64,
    pub pause_ms: f64,
    pub collection_index: u64,
}

/// Final accounting for a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub iterations: u64,
    pub checksum: u64,
    pub entries_total: usize,
    pub growth_batches: u64,
    pub elapsed_secs: f64,
    pub outliers: Vec<OutlierEvent>,
}

/// Returns the duration/median ratio when the iteration qualifies as an
/// outlier, `None` otherwise. Exposed for deterministic testing.
///
/// Never fires during warm-up (`iteration <= warmup`), for an undefined
/// ratio (median of 0, or NaN from degenerate samples), or at exactly the
/// threshold: the comparison is strictly greater-than.
pub fn evaluate_outlier(
    iteration: u64,
    duration_us: f64,
    median_us: f64,
    warmup: u64,
    threshold: f64,
) -> Option<f64> {
    if iteration <= warmup {
        return None;
    }
    if median_us <= 0.0 {
        return None;
    }
    let ratio = duration_us / median_us;
    if ratio > threshold {
        Some(ratio)
    } else {
        None
    }
}

/// Drive the workload for `cfg.duration`, printing growth and outlier lines
/// as they happen and recording everything in the returned summary.
pub fn run(cfg: &RunConfig, telemetry: &Telemetry) -> RunSummary {
    let mut registry = AnchorRegistry::new();
    let mut store = EphemeralStore::new();
    let mut window = MedianWindow::new(cfg.window_capacity);
    let mut outliers: Vec<OutlierEvent> = Vec::new();

    let run_start = Instant::now();
    let mut growth_timer = Instant::now();
    let mut iteration: u64 = 0;
    let mut checksum: u64 = 0;
    let mut growth_batches: u64 = 0;

    while run_start.elapsed() < cfg.duration {
        if growth_timer.elapsed() >= cfg.growth_period {
            store.grow(&mut registry, cfg.growth_batch);
            growth_batches += 1;
            growth_timer = Instant::now();
            println!("Ephemeral entries: {}", store.len());
        }

        let pass_start = Instant::now();
        checksum = workload::steady_pass(workload::ROUNDS_PER_PASS, workload::BUFFER_LEN, checksum);
        let duration_us = pass_start.elapsed().as_secs_f64() * 1e6;

        let median_us = window.insert(duration_us);

        if let Some(ratio) = evaluate_outlier(
            iteration,
            duration_us,
            median_us,
            cfg.warmup_iterations,
            cfg.outlier_ratio,
        ) {
            let snapshot = telemetry.snapshot();
            let event = OutlierEvent {
                iteration,
                duration_us,
                ratio,
                median_us,
                pause_ms: snapshot.last_pause_ms,
                collection_index: snapshot.collection_index,
            };
            println!(
                "Latency outlier (iteration={}): {:.1}ms (x{:.0}, median={}us) pause={:.1}ms collection={}",
                event.iteration,
                event.duration_us / 1_000.0,
                event.ratio,
                event.median_us as u64,
                event.pause_ms,
                event.collection_index,
            );
            outliers.push(event);
        }

        iteration += 1;
    }

    RunSummary {
        iterations: iteration,
        checksum,
        entries_total: store.len(),
        growth_batches,
        elapsed_secs: run_start.elapsed().as_secs_f64(),
        outliers,
    }
}

/// Write `summary` as pretty-printed JSON to `path`.
pub fn write_json_report(path: &Path, summary: &RunSummary) -> Result<(), Box<dyn std::error::Error>> {
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, summary)?;
    Ok(())
}
