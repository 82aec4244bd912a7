//! Command channel benchmark suite.
//!
//! Measures admission cost under saturation and the push/pop round trip:
//! - Capacities: 1, 3, 16
//!
//! Run with: cargo bench --bench command_channel
//! Results saved to: target/criterion/

use std::hint::black_box;
use std::sync::Arc;

use armhub::{Command, CommandChannel};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use tokio::runtime::Runtime;

// ============================================================================
// Benchmark Parameters
// ============================================================================

const CAPACITIES: &[usize] = &[1, 3, 16];
const BURST: u8 = 64;

// ============================================================================
// Benchmark: Saturated Push
// ============================================================================

fn bench_saturated_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("saturated_push");

    for &capacity in CAPACITIES {
        group.bench_with_input(
            BenchmarkId::new("burst", capacity),
            &capacity,
            |b, &capacity| {
                b.iter(|| {
                    let channel = CommandChannel::new(capacity);
                    for byte in 0..BURST {
                        black_box(channel.push(Command::raw(byte)));
                    }
                    channel
                });
            },
        );
    }

    group.finish();
}

// ============================================================================
// Benchmark: Push/Pop Round Trip
// ============================================================================

fn bench_round_trip(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let channel = Arc::new(CommandChannel::default());

    c.bench_function("push_pop", |b| {
        b.to_async(&rt).iter(|| {
            let channel = Arc::clone(&channel);
            async move {
                channel.push(Command::raw(1));
                black_box(channel.pop().await)
            }
        });
    });
}

criterion_group!(benches, bench_saturated_push, bench_round_trip);
criterion_main!(benches);
