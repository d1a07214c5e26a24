//! Pool checkout benchmark suite.
//!
//! - Checkout/return round trip on a warm pool, single and contended
//! - Worker invoke latency, blocking and suspending
//!
//! Run with: cargo bench --bench pool_checkout
//! Results saved to: target/criterion/

use std::hint::black_box;
use std::sync::Arc;
use std::thread;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use dib_gateway::{ResourcePool, WorkerPool};
use tokio::runtime::Runtime;

// ============================================================================
// Benchmark Parameters
// ============================================================================

const CONTENDERS: &[usize] = &[2, 4, 8];
const CHECKOUTS_PER_THREAD: usize = 1_000;

// ============================================================================
// Benchmark: Checkout / Return
// ============================================================================

fn bench_checkout(c: &mut Criterion) {
    let mut group = c.benchmark_group("checkout");

    let pool: ResourcePool<usize> = ResourcePool::new(0, Ok);
    let warm = pool.get().unwrap();
    pool.put(warm).unwrap();

    group.bench_function("uncontended", |b| {
        b.iter(|| {
            let r = pool.get().unwrap();
            pool.put(black_box(r)).unwrap();
        });
    });

    for &threads in CONTENDERS {
        group.bench_with_input(
            BenchmarkId::new("contended", threads),
            &threads,
            |b, &threads| {
                // Fewer slots than threads so getters block.
                let pool: Arc<ResourcePool<usize>> = Arc::new(ResourcePool::new(threads / 2, Ok));
                b.iter(|| run_contended(&pool, threads));
            },
        );
    }

    group.finish();
}

fn run_contended(pool: &Arc<ResourcePool<usize>>, threads: usize) {
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let pool = Arc::clone(pool);
            thread::spawn(move || {
                for _ in 0..CHECKOUTS_PER_THREAD {
                    let r = pool.get().unwrap();
                    pool.put(r).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

// ============================================================================
// Benchmark: Worker Invoke
// ============================================================================

fn bench_invoke(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("invoke");

    let pool = WorkerPool::workers(1, "bench");
    let worker = pool.get().unwrap();

    group.bench_function("blocking", |b| {
        b.iter(|| worker.invoke(|| Ok(black_box(1) + 1)).unwrap());
    });

    group.bench_function("async", |b| {
        b.to_async(&rt)
            .iter(|| async { worker.invoke_async(|| Ok(black_box(1) + 1)).await.unwrap() });
    });

    group.finish();

    pool.put(worker).unwrap();
    pool.shutdown(false);
}

criterion_group!(benches, bench_checkout, bench_invoke);
criterion_main!(benches);
