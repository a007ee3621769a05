// tests/context_management_tests.rs
mod common;

use common::*;
use serial_test::serial;
use zahroflow::{Flow, FlowContext, FlowControl, StageDef};

#[tokio::test]
#[serial]
async fn test_context_is_shared_between_stages() {
  setup_tracing();
  let mut flow = Flow::<TestContext, TestError>::new(
    "shared",
    [StageDef::required("write"), StageDef::required("read_modify")],
  );
  flow
    .on("write", |ctx: FlowContext<TestContext>| async move {
      ctx.update(|data| {
        data.counter = 10;
        data.message = "SetByWrite".to_string();
      });
      Ok::<_, TestError>(FlowControl::Continue)
    })
    .unwrap();
  flow
    .on("read_modify", |ctx: FlowContext<TestContext>| async move {
      let counter = *ctx.map_read(|d| &d.counter);
      if counter != 10 {
        return Err(TestError::Handler(format!("unexpected counter {}", counter)));
      }
      ctx.update(|data| {
        data.counter += 5;
        data.message.push_str("_ThenModified");
      });
      Ok(FlowControl::Continue)
    })
    .unwrap();

  let ctx = FlowContext::new(TestContext::default());
  flow.run(ctx.clone()).await.unwrap();

  let snapshot = ctx.snapshot();
  assert_eq!(snapshot.counter, 15);
  assert_eq!(snapshot.message, "SetByWrite_ThenModified");
}

#[tokio::test]
#[serial]
async fn test_context_clone_shares_data() {
  setup_tracing();
  let original = FlowContext::new(TestContext {
    counter: 1,
    ..Default::default()
  });
  let cloned = original.clone();

  original.write().counter = 5;
  assert_eq!(cloned.read().counter, 5);

  cloned.write().counter = 10;
  assert_eq!(original.read().counter, 10);
}

#[tokio::test]
#[serial]
async fn test_snapshot_is_detached() {
  setup_tracing();
  let ctx = FlowContext::new(TestContext::default());
  let mut snapshot = ctx.snapshot();
  snapshot.counter = 42;
  assert_eq!(ctx.read().counter, 0);
}

#[tokio::test]
#[serial]
async fn test_guards_released_before_await() {
  setup_tracing();
  let ctx = FlowContext::new(TestContext::default());

  let initial = ctx.read().counter;
  tokio::time::sleep(std::time::Duration::from_millis(1)).await;
  ctx.update(|data| data.counter = initial + 1);

  assert_eq!(ctx.read().counter, 1);
}
