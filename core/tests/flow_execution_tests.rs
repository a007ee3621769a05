// tests/flow_execution_tests.rs
mod common;

use common::*;
use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use zahroflow::{Flow, FlowContext, FlowControl, FlowError, FlowOutcome, StageDef};

fn flow_of(stages: &[&str]) -> Flow<TestContext, TestError> {
  Flow::new("test_flow", stages.iter().map(|s| StageDef::required(*s)))
}

#[tokio::test]
#[serial]
async fn test_flow_runs_stages_in_order() {
  setup_tracing();
  let mut flow = flow_of(&["stage1", "stage2", "stage3"]);
  flow.on("stage1", recording_handler("stage1", " S1")).unwrap();
  flow.on("stage2", recording_handler("stage2", " S2")).unwrap();
  flow.on("stage3", recording_handler("stage3", " S3")).unwrap();

  let ctx = FlowContext::new(TestContext::default());
  let outcome = flow.run(ctx.clone()).await.unwrap();

  assert_eq!(outcome, FlowOutcome::Completed);
  let guard = ctx.read();
  assert_eq!(guard.counter, 3);
  assert_eq!(guard.message, " S1 S2 S3");
  assert_eq!(guard.stages_executed, vec!["stage1", "stage2", "stage3"]);
}

#[tokio::test]
#[serial]
async fn test_flow_halts_on_halt_signal() {
  setup_tracing();
  let mut flow = flow_of(&["stageA", "halting", "stageC"]);
  flow.on("stageA", recording_handler("stageA", "A")).unwrap();
  flow.on("halting", recording_handler("halting", "H")).unwrap();
  flow.on("stageC", recording_handler("stageC", "C")).unwrap();

  let ctx = FlowContext::new(TestContext {
    halt_at: Some("halting".to_string()),
    ..Default::default()
  });
  let outcome = flow.run(ctx.clone()).await.unwrap();

  assert_eq!(outcome, FlowOutcome::Halted);
  assert!(!outcome.is_completed());
  let guard = ctx.read();
  assert_eq!(guard.message, "AH");
  assert_eq!(guard.stages_executed, vec!["stageA", "halting"]);
}

#[tokio::test]
#[serial]
async fn test_flow_propagates_handler_error() {
  setup_tracing();
  let mut flow = flow_of(&["good", "bad", "never"]);
  flow.on("good", recording_handler("good", "Good")).unwrap();
  flow.on("bad", failing_handler("bad", "I am a bad stage!")).unwrap();
  flow.on("never", recording_handler("never", "NeverRun")).unwrap();

  let ctx = FlowContext::new(TestContext::default());
  let result = flow.run(ctx.clone()).await;

  assert_eq!(result, Err(TestError::Handler("I am a bad stage!".to_string())));
  let guard = ctx.read();
  assert_eq!(guard.counter, 1);
  assert_eq!(guard.stages_executed, vec!["good", "bad"]);
}

#[tokio::test]
#[serial]
async fn test_skip_condition_skips_stage() {
  setup_tracing();
  let mut flow = Flow::<TestContext, TestError>::new(
    "skipping",
    [
      StageDef::required("first"),
      StageDef::required("side_effect").skip_if(|data: &TestContext| data.skip_side_effects),
      StageDef::required("last"),
    ],
  );
  flow.on("first", recording_handler("first", "1")).unwrap();
  flow.on("side_effect", recording_handler("side_effect", "X")).unwrap();
  flow.on("last", recording_handler("last", "3")).unwrap();

  let ctx = FlowContext::new(TestContext {
    skip_side_effects: true,
    ..Default::default()
  });
  assert_eq!(flow.run(ctx.clone()).await.unwrap(), FlowOutcome::Completed);
  assert_eq!(ctx.read().stages_executed, vec!["first", "last"]);

  let ctx = FlowContext::new(TestContext::default());
  flow.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().stages_executed, vec!["first", "side_effect", "last"]);
}

#[tokio::test]
#[serial]
async fn test_skip_condition_sees_data_written_by_earlier_stage() {
  setup_tracing();
  let mut flow = Flow::<TestContext, TestError>::new(
    "late_decision",
    [
      StageDef::required("decide"),
      StageDef::required("maybe").skip_if(|data: &TestContext| data.skip_side_effects),
    ],
  );
  flow
    .on("decide", |ctx: FlowContext<TestContext>| async move {
      ctx.write().skip_side_effects = true;
      Ok::<_, TestError>(FlowControl::Continue)
    })
    .unwrap();
  flow.on("maybe", recording_handler("maybe", "M")).unwrap();

  let ctx = FlowContext::new(TestContext::default());
  flow.run(ctx.clone()).await.unwrap();
  assert!(ctx.read().stages_executed.is_empty());
}

#[tokio::test]
#[serial]
async fn test_required_stage_without_handler_fails() {
  setup_tracing();
  let flow = flow_of(&["no_handler"]);
  let result = flow.run(FlowContext::new(TestContext::default())).await;

  match result {
    Err(TestError::Flow(s)) => {
      assert!(s.contains("HandlerMissing"));
      assert!(s.contains("no_handler"));
    }
    other => panic!("Expected HandlerMissing, got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn test_optional_stage_without_handler_is_skipped() {
  setup_tracing();
  let mut flow = Flow::<TestContext, TestError>::new(
    "optional",
    [StageDef::optional("extra"), StageDef::required("main")],
  );
  flow.on("main", recording_handler("main", "M")).unwrap();

  let ctx = FlowContext::new(TestContext::default());
  assert_eq!(flow.run(ctx.clone()).await.unwrap(), FlowOutcome::Completed);
  assert_eq!(ctx.read().stages_executed, vec!["main"]);
}

#[tokio::test]
#[serial]
async fn test_before_on_after_execution_order() {
  setup_tracing();
  let mut flow = flow_of(&["main"]);
  flow.after("main", recording_handler("after_main", "After;")).unwrap();
  flow.on("main", recording_handler("on_main", "On;")).unwrap();
  flow.before("main", recording_handler("before_main", "Before;")).unwrap();

  let ctx = FlowContext::new(TestContext::default());
  flow.run(ctx.clone()).await.unwrap();

  let guard = ctx.read();
  assert_eq!(guard.message, "Before;On;After;");
  assert_eq!(guard.stages_executed, vec!["before_main", "on_main", "after_main"]);
}

#[tokio::test]
#[serial]
async fn test_best_effort_stage_failure_does_not_fail_run() {
  setup_tracing();
  let mut flow = Flow::<TestContext, TestError>::new(
    "notify_then_finish",
    [
      StageDef::required("work"),
      StageDef::required("notify").best_effort(),
      StageDef::required("finish"),
    ],
  );
  let after_notify = Arc::new(AtomicUsize::new(0));
  flow.on("work", recording_handler("work", "W")).unwrap();
  flow.on("notify", failing_handler("notify", "push gateway down")).unwrap();
  flow.after("notify", counting_handler(after_notify.clone())).unwrap();
  flow.on("finish", recording_handler("finish", "F")).unwrap();

  let ctx = FlowContext::new(TestContext::default());
  let outcome = flow.run(ctx.clone()).await.unwrap();

  assert_eq!(outcome, FlowOutcome::Completed);
  assert_eq!(ctx.read().stages_executed, vec!["work", "notify", "finish"]);
  // The rest of a failed best-effort stage is abandoned.
  assert_eq!(after_notify.load(Ordering::SeqCst), 0);
}

#[tokio::test]
#[serial]
async fn test_multiple_handlers_run_in_registration_order() {
  setup_tracing();
  let mut flow = flow_of(&["multi"]);
  flow.on("multi", recording_handler("first", "1")).unwrap();
  flow.on("multi", recording_handler("second", "2")).unwrap();

  let ctx = FlowContext::new(TestContext::default());
  flow.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().message, "12");
}

#[tokio::test]
#[serial]
async fn test_structural_edits() {
  setup_tracing();
  let mut flow = flow_of(&["a", "c"]);
  flow.insert_after("a", StageDef::required("b")).unwrap();
  flow.insert_before("a", StageDef::optional("pre")).unwrap();
  assert_eq!(flow.stage_names(), vec!["pre", "a", "b", "c"]);

  assert!(matches!(
    flow.insert_after("a", StageDef::required("c")),
    Err(FlowError::DuplicateStage { .. })
  ));
  assert!(matches!(
    flow.insert_before("zzz", StageDef::required("y")),
    Err(FlowError::StageNotFound { .. })
  ));
  assert!(matches!(
    flow.on("missing", recording_handler("missing", "")),
    Err(FlowError::StageNotFound { .. })
  ));

  flow.on("c", recording_handler("c", "C")).unwrap();
  flow.remove_stage("c");
  assert_eq!(flow.stage_names(), vec!["pre", "a", "b"]);
}
