use clap::Parser;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use memstall_harness::runner::{self, RunConfig, RunSummary};
use memstall_telemetry::alloc::{AllocStatsSource, CountingAllocator};
use memstall_telemetry::Telemetry;

#[global_allocator]
static ALLOC: CountingAllocator = CountingAllocator;

#[derive(Parser)]
#[command(name = "memstall", about = "Memory-pressure latency stall harness")]
struct Args {
    /// How long to run (seconds)
    #[arg(long, default_value_t = 100)]
    duration: u64,

    /// Rolling median window capacity
    #[arg(long, default_value_t = 20)]
    window: usize,

    /// Anchors added to the ephemeral store per growth step
    #[arg(long, default_value_t = 10_000)]
    growth_batch: usize,

    /// Milliseconds between growth steps
    #[arg(long, default_value_t = 1_000)]
    growth_period_ms: u64,

    /// Duration/median ratio beyond which an iteration is an outlier
    #[arg(long, default_value_t = 100.0)]
    outlier_ratio: f64,

    /// Iterations to wait before evaluating outliers
    #[arg(long, default_value_t = 100)]
    warmup: u64,

    /// Milliseconds between telemetry samples
    #[arg(long, default_value_t = 1_000)]
    sample_interval_ms: u64,

    /// Print an aggregated telemetry line every this many metric updates
    #[arg(long, default_value_t = 4)]
    print_every: u32,

    /// Write the run summary as JSON to this path
    #[arg(long)]
    report: Option<std::path::PathBuf>,
}

fn main() {
    let args = Args::parse();

    let sample_interval = Duration::from_millis(args.sample_interval_ms);
    let source = Arc::new(AllocStatsSource::new(sample_interval));
    let mut telemetry = Telemetry::new(source, args.print_every);

    let subscription = telemetry.subscribe(sample_interval).unwrap_or_else(|e| {
        eprintln!("Failed to subscribe to telemetry: {e}");
        process::exit(3);
    });

    let cfg = RunConfig {
        duration: Duration::from_secs(args.duration),
        window_capacity: args.window,
        growth_batch: args.growth_batch,
        growth_period: Duration::from_millis(args.growth_period_ms),
        outlier_ratio: args.outlier_ratio,
        warmup_iterations: args.warmup,
    };

    println!(
        "Running {}s stress loop (growth batch {}, window {})",
        args.duration, args.growth_batch, args.window,
    );

    let summary = runner::run(&cfg, &telemetry);

    if let Err(e) = telemetry.unsubscribe(subscription) {
        eprintln!("Failed to unsubscribe from telemetry: {e}");
        process::exit(3);
    }

    print_report(&summary);

    if let Some(path) = &args.report {
        if let Err(e) = runner::write_json_report(path, &summary) {
            eprintln!("Failed to write report {}: {e}", path.display());
            process::exit(1);
        }
    }
}

fn print_report(summary: &RunSummary) {
    println!();
    println!("Memstall Run Results");
    println!("====================");
    println!("Elapsed:            {:.1} s", summary.elapsed_secs);
    println!("Iterations:         {}", summary.iterations);
    println!("Ephemeral entries:  {}", summary.entries_total);
    println!("Growth batches:     {}", summary.growth_batches);
    println!("Outliers:           {}", summary.outliers.len());
    println!("Workload checksum:  {}", summary.checksum);
}
