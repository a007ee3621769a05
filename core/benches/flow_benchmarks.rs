use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use tokio::runtime::Runtime;
use zahroflow::{Flow, FlowContext, FlowControl, FlowError, FlowOutcome, FlowRegistry, KeyedLocks, StageDef};

#[derive(Clone, Debug, Default)]
struct BenchData {
  counter: u64,
  shipped: bool,
}

fn build_flow(num_stages: usize, skip_every_other: bool) -> Flow<BenchData, FlowError> {
  let stages = (0..num_stages).map(|i| {
    let stage = StageDef::required(format!("stage_{}", i));
    if skip_every_other && i % 2 == 1 {
      stage.skip_if(|data: &BenchData| !data.shipped)
    } else {
      stage
    }
  });
  let mut flow = Flow::new("bench", stages);
  for i in 0..num_stages {
    flow
      .on(&format!("stage_{}", i), |ctx: FlowContext<BenchData>| async move {
        ctx.update(|data| data.counter = data.counter.wrapping_add(1));
        Ok::<_, FlowError>(FlowControl::Continue)
      })
      .expect("stage exists");
  }
  flow
}

fn bench_flow_run(c: &mut Criterion) {
  let rt = Runtime::new().expect("tokio runtime");
  let mut group = c.benchmark_group("FlowRun");

  for num_stages in [1usize, 5, 10, 25].iter() {
    let flow = build_flow(*num_stages, false);
    group.bench_with_input(BenchmarkId::new("stages", num_stages), num_stages, |b, _| {
      b.to_async(&rt).iter(|| async {
        let ctx = FlowContext::new(BenchData::default());
        let outcome = flow.run(ctx).await.expect("flow run");
        assert_eq!(outcome, FlowOutcome::Completed);
      });
    });
  }

  let skipping = build_flow(10, true);
  group.bench_function("stages_10_half_skipped", |b| {
    b.to_async(&rt).iter(|| async {
      skipping.run(FlowContext::new(BenchData::default())).await.expect("flow run");
    });
  });

  group.finish();
}

fn bench_registry_dispatch(c: &mut Criterion) {
  let rt = Runtime::new().expect("tokio runtime");
  let registry = FlowRegistry::<FlowError>::new();
  registry.register(build_flow(5, false));

  c.bench_function("FlowRegistry::run", |b| {
    b.to_async(&rt).iter(|| async {
      registry.run(FlowContext::new(BenchData::default())).await.expect("dispatch");
    });
  });
}

fn bench_keyed_locks(c: &mut Criterion) {
  let rt = Runtime::new().expect("tokio runtime");
  let locks = Arc::new(KeyedLocks::<u64>::new());
  let mut key = 0u64;

  c.bench_function("KeyedLocks::acquire_uncontended", |b| {
    b.to_async(&rt).iter(|| {
      key = key.wrapping_add(1);
      let locks = locks.clone();
      let k = key % 64;
      async move {
        let _guard = locks.acquire(k).await;
      }
    });
  });
}

criterion_group!(benches, bench_flow_run, bench_registry_dispatch, bench_keyed_locks);
criterion_main!(benches);
