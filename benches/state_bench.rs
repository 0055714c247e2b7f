//! Performance benchmarks for the operation state machine.
//!
//! Every session call passes through the state gate, so its overhead must
//! stay negligible next to a capture that spends seconds of sensor time.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench state_bench
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use ridgescan_session::{OperationState, StateCell};
use std::hint::black_box;

/// Benchmark one full operation cycle: gated start plus completion.
///
/// The history ring fills after the first iterations, so this measures the
/// steady state where every transition also evicts the oldest entry.
fn bench_transition_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("state_transitions");
    group.throughput(Throughput::Elements(2));

    group.bench_function("start_and_complete", |b| {
        let cell = StateCell::new();
        b.iter(|| {
            cell.request_start(
                "enroll",
                &[OperationState::ReadyToProcess],
                OperationState::ProcessInProgress,
            )
            .ok();
            black_box(cell.complete(OperationState::ReadyToProcess));
        });
    });

    group.finish();
}

/// Benchmark the gate alone: a passing read check and a rejected start.
///
/// The rejected path allocates an error message, so expect it to read
/// slower than the allowed check.
fn bench_state_gate(c: &mut Criterion) {
    let mut group = c.benchmark_group("state_gate");
    group.throughput(Throughput::Elements(1));

    group.bench_function("allowed_check", |b| {
        let cell = StateCell::new();
        b.iter(|| {
            black_box(cell.require("template", &[OperationState::ReadyToProcess])).ok();
        });
    });

    group.bench_function("rejected_start", |b| {
        let cell = StateCell::new();
        cell.complete(OperationState::ProcessInProgress);
        b.iter(|| {
            let result = cell.request_start(
                "enroll",
                &[OperationState::ReadyToProcess],
                OperationState::ProcessInProgress,
            );
            black_box(result).ok();
        });
    });

    group.finish();
}

/// Benchmark snapshotting the transition history at different depths.
fn bench_history_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("state_history");

    for transitions in [2u32, 16, 64] {
        // The window is capped, so deep pasts snapshot the same amount.
        group.throughput(Throughput::Elements(u64::from(transitions.min(32))));
        group.bench_with_input(
            BenchmarkId::new("snapshot", transitions),
            &transitions,
            |b, &transitions| {
                let cell = StateCell::new();
                for _ in 0..transitions / 2 {
                    cell.complete(OperationState::ProcessInProgress);
                    cell.complete(OperationState::ReadyToProcess);
                }
                b.iter(|| black_box(cell.history()));
            },
        );
    }

    group.finish();
}

/// Benchmark serializing a full history window to JSON, the diagnostics
/// export path.
fn bench_history_export(c: &mut Criterion) {
    let cell = StateCell::new();
    for _ in 0..16 {
        cell.complete(OperationState::ProcessInProgress);
        cell.complete(OperationState::ReadyToProcess);
    }
    let history = cell.history();

    c.bench_function("history_to_json", |b| {
        b.iter(|| {
            let json = serde_json::to_string(black_box(&history)).unwrap();
            black_box(json)
        });
    });
}

criterion_group!(
    benches,
    bench_transition_cycle,
    bench_state_gate,
    bench_history_snapshot,
    bench_history_export,
);

criterion_main!(benches);
