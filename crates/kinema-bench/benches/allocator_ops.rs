//! Criterion micro-benchmarks for index allocation, free, and defragment.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kinema_bench::churn_widths;
use kinema_core::{AllocatorCallbacks, Dimension, HandleId, SlotIndex};
use kinema_pool::{IndexAllocator, PoolConfig, SlotPool};
use kinema_test_utils::{RecordingStore, TaggedInit};

/// Callback sink that discards everything, so only allocator cost is measured.
struct NullCallbacks;

impl AllocatorCallbacks for NullCallbacks {
    fn set_num_indices(&mut self, _num_indices: u32) {}
    fn move_index(&mut self, _old: SlotIndex, _new: SlotIndex, _dimension: Dimension) {}
}

/// Allocate 10K ranges of mixed width into a fresh allocator.
fn fill_allocator(widths: &[u16]) -> (IndexAllocator, Vec<SlotIndex>) {
    let mut allocator = IndexAllocator::new(&PoolConfig::new());
    let indices = widths
        .iter()
        .map(|&w| allocator.allocate(Dimension(w), &mut NullCallbacks).unwrap())
        .collect();
    (allocator, indices)
}

/// Benchmark: 10K allocations with growth.
fn bench_allocate_10k(c: &mut Criterion) {
    let widths = churn_widths(10_000, 4, 42);
    c.bench_function("allocate_10k", |b| {
        b.iter(|| {
            let (allocator, _) = fill_allocator(&widths);
            black_box(allocator.capacity());
        });
    });
}

/// Benchmark: free every other range, then re-allocate into the holes.
fn bench_free_reallocate_10k(c: &mut Criterion) {
    let widths = churn_widths(10_000, 1, 42);
    c.bench_function("free_reallocate_10k", |b| {
        b.iter_batched(
            || fill_allocator(&widths),
            |(mut allocator, indices)| {
                for &index in indices.iter().step_by(2) {
                    allocator.free(index).unwrap();
                }
                for _ in indices.iter().step_by(2) {
                    black_box(allocator.allocate(Dimension::ONE, &mut NullCallbacks).unwrap());
                }
            },
            criterion::BatchSize::LargeInput,
        );
    });
}

/// Benchmark: compact a 10K-range allocator with every third range freed.
fn bench_defragment_10k(c: &mut Criterion) {
    let widths = churn_widths(10_000, 4, 7);
    c.bench_function("defragment_10k", |b| {
        b.iter_batched(
            || {
                let (mut allocator, indices) = fill_allocator(&widths);
                for &index in indices.iter().step_by(3) {
                    allocator.free(index).unwrap();
                }
                allocator
            },
            |mut allocator| black_box(allocator.defragment(&mut NullCallbacks).moves()),
            criterion::BatchSize::LargeInput,
        );
    });
}

/// Benchmark: full pool defragment including slot table and payload moves.
fn bench_pool_defragment_1k(c: &mut Criterion) {
    let widths = churn_widths(1_000, 4, 9);
    c.bench_function("pool_defragment_1k", |b| {
        b.iter_batched(
            || {
                let mut pool = SlotPool::new(RecordingStore::new());
                let handles: Vec<HandleId> = widths
                    .iter()
                    .enumerate()
                    .map(|(i, &w)| {
                        let handle = HandleId::next();
                        pool.initialize(&TaggedInit::new(i as u64, w), handle)
                            .unwrap();
                        handle
                    })
                    .collect();
                for &handle in handles.iter().step_by(3) {
                    pool.remove_handle(handle).unwrap();
                }
                pool.store_mut().clear_events();
                pool
            },
            |mut pool| black_box(pool.defragment().moves()),
            criterion::BatchSize::LargeInput,
        );
    });
}

criterion_group!(
    benches,
    bench_allocate_10k,
    bench_free_reallocate_10k,
    bench_defragment_10k,
    bench_pool_defragment_1k
);
criterion_main!(benches);
