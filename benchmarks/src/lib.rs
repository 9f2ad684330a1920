//! Shared workloads for the Plait benchmarks.

use criterion::black_box;

/// Input sizes exercised by every comparison.
pub const INPUT_SIZES: &[usize] = &[100, 1_000, 10_000, 100_000];

/// Thread counts exercised by the scaling benchmarks.
pub const THREAD_COUNTS: &[usize] = &[1, 2, 4, 8];

/// CPU-bound work whose cost grows with `iterations`.
#[must_use]
pub fn cpu_work(seed: u64, iterations: u64) -> u64 {
    let mut acc = seed;
    for i in 0..iterations {
        acc = acc.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(i);
    }
    black_box(acc)
}

/// Deterministic input of `len` pseudo-random values.
#[must_use]
pub fn input(len: usize) -> Vec<u64> {
    (0..len as u64).map(|i| cpu_work(i, 4)).collect()
}
