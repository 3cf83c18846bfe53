//! Benchmarks for flow execution.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use forkflow::cancellation::FlowContext;
use forkflow::executor::{create_async_executor, create_sync_executor};
use forkflow::pipeline::{fork_join_failing_fast, ExecutionFlow, ExecutionFlowBuilder};
use forkflow::testing::{Recorder, RecordingComponent};

fn build_flow(branches: usize, per_branch: usize) -> ExecutionFlow {
    let recorder = Recorder::new();
    let mut builder = ExecutionFlowBuilder::new();
    for branch in 0..branches {
        if branch > 0 {
            builder = builder.next_branch();
        }
        for i in 0..per_branch {
            let component = RecordingComponent::new(i, &recorder);
            builder = if i % 2 == 0 {
                builder.append(create_sync_executor(component))
            } else {
                builder.append(create_async_executor(component))
            };
        }
    }
    builder.build()
}

fn fork_join_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("runtime");

    let mut group = c.benchmark_group("fork_join_failing_fast");
    for branches in [1, 4, 16] {
        group.bench_with_input(BenchmarkId::from_parameter(branches), &branches, |b, &branches| {
            b.iter(|| {
                // Tasks are one-shot, so every iteration needs a fresh flow.
                let flow = build_flow(branches, 8);
                runtime.block_on(async {
                    black_box(fork_join_failing_fast(&FlowContext::new(), &flow).await)
                })
            });
        });
    }
    group.finish();
}

criterion_group!(benches, fork_join_benchmark);
criterion_main!(benches);
