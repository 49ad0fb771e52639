//! Benchmark workloads for the Kinema pool allocator.
//!
//! Provides deterministic churn scripts shared by the benches:
//!
//! - [`churn_widths`]: pseudo-random motivator widths from a seed
//! - [`populate_engine`]: an engine filled with linear motivators
//! - [`punch_holes`]: invalidate every `stride`-th motivator

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use kinema_engine::{LinearInit, LinearProcessor, MotiveEngine, MotiveTarget1f, Motivator};

/// Generate `n` deterministic widths in `1..=max_width`.
///
/// Uses the same LCG constants for every call so runs are comparable.
pub fn churn_widths(n: usize, max_width: u16, seed: u64) -> Vec<u16> {
    let max_width = u64::from(max_width.max(1));
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            // max_width <= u16::MAX, so the cast is lossless.
            1 + ((state >> 33) % max_width) as u16
        })
        .collect()
}

/// Build an engine with one linear motivator per entry of `widths`, each
/// heading toward a target so `advance_frame` does real work.
pub fn populate_engine(widths: &[u16]) -> (MotiveEngine, Vec<Motivator>) {
    let mut engine = MotiveEngine::with_builtin();
    let motivators = widths
        .iter()
        .enumerate()
        .map(|(i, &width)| {
            let mut m = Motivator::new();
            let init = LinearInit::new(vec![i as f32; usize::from(width)])
                .with_target(MotiveTarget1f::new(0.0, 1_000.0));
            m.initialize(&mut engine, LinearProcessor::TYPE, &init)
                .expect("linear processor is built in");
            m
        })
        .collect();
    (engine, motivators)
}

/// Invalidate every `stride`-th motivator, returning how many were freed.
pub fn punch_holes(engine: &mut MotiveEngine, motivators: &mut [Motivator], stride: usize) -> usize {
    motivators
        .iter_mut()
        .step_by(stride.max(1))
        .map(|m| m.invalidate(engine))
        .filter(|&freed| freed)
        .count()
}
