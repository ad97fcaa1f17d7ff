use std::hint::black_box;

/// Inner repetitions per stress-loop iteration.
pub const ROUNDS_PER_PASS: usize = 20;

/// Elements in each scratch buffer.
pub const BUFFER_LEN: usize = 200;

/// One fixed-cost unit of allocation-heavy work.
///
/// Each round heap-allocates a buffer, fills it with `i * i`, scans the
/// whole buffer for its minimum, and folds the minimum into the running
/// checksum. Returning the checksum (the binary prints it after the run)
/// keeps the allocations and the full scan from being optimized away; the
/// `black_box` shields the buffer itself. For this formula the minimum is
/// always 0, so the checksum stays 0 across runs of any length.
pub fn steady_pass(rounds: usize, buffer_len: usize, checksum: u64) -> u64 {
    let mut sum = checksum;
    for _ in 0..rounds {
        let buffer: Vec<u64> = (0..buffer_len as u64).map(|i| i * i).collect();
        sum += black_box(&buffer).iter().copied().min().unwrap_or(0);
    }
    sum
}
