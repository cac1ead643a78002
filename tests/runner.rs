//! Tests for the execution adapter and the in-process plan runner.
mod common;
use common::*;
use hensei::adapter::{async_op, blocking_op, ExecutionAdapter, InvocationSet, Payload};
use hensei::prelude::*;
use hensei::runner::{CancellationToken, PlanRunner, StepStatus};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn bind(
    adapter: &ExecutionAdapter,
    handles: &mut InvocationSet,
    compilation: &Compilation,
    name: &str,
    body: hensei::adapter::OperationBody,
) {
    let leaf = compilation
        .hierarchy
        .leaf_by_name(name)
        .unwrap_or_else(|| panic!("operation '{name}' is registered"));
    handles.bind(
        adapter
            .adapt(&leaf.descriptor, body)
            .expect("body kind matches descriptor"),
    );
}

#[tokio::test]
async fn test_chain_executes_in_order_with_wired_inputs() {
    let compilation = compile(chain_catalog());
    assert!(compilation.is_clean(), "{}", compilation.diagnostics);

    let adapter = ExecutionAdapter::new(2).unwrap();
    let mut handles = InvocationSet::new();

    bind(
        &adapter,
        &mut handles,
        &compilation,
        "etl.extract",
        async_op(|_| async move { Ok(json!({"rows": 3})) }),
    );
    bind(
        &adapter,
        &mut handles,
        &compilation,
        "etl.transform",
        async_op(|input: Payload| async move {
            // The producer's output arrives under the parameter name.
            let rows = input["raw"]["rows"].as_i64().unwrap_or(0);
            Ok(json!({"clean_rows": rows}))
        }),
    );
    bind(
        &adapter,
        &mut handles,
        &compilation,
        "etl.load",
        blocking_op(|input: Payload| {
            assert_eq!(input["clean"]["clean_rows"], json!(3));
            Ok(Payload::Null)
        }),
    );

    let runner = PlanRunner::new(compilation.plan, handles);
    let report = runner
        .run(json!({}), &CancellationToken::new())
        .await
        .expect("root plan runs");

    assert!(report.completed);
    let load = report.outcome("etl.load").expect("load ran");
    assert!(load.status.is_completed());
}

#[tokio::test]
async fn test_nested_groups_feed_parent_merge() {
    let compilation = compile(fetch_merge_catalog());
    assert!(compilation.is_clean(), "{}", compilation.diagnostics);

    let adapter = ExecutionAdapter::new(2).unwrap();
    let mut handles = InvocationSet::new();

    bind(
        &adapter,
        &mut handles,
        &compilation,
        "jobs.stepstone.fetch",
        async_op(|_| async move { Ok(json!("stepstone-page")) }),
    );
    bind(
        &adapter,
        &mut handles,
        &compilation,
        "jobs.indeed.fetch",
        async_op(|_| async move { Ok(json!("indeed-page")) }),
    );
    bind(
        &adapter,
        &mut handles,
        &compilation,
        "jobs.merge",
        async_op(|input: Payload| async move {
            let pages = input["pages"].as_array().cloned().unwrap_or_default();
            Ok(json!({ "merged": pages.len() }))
        }),
    );

    let runner = PlanRunner::new(compilation.plan, handles);
    let report = runner
        .run(json!({}), &CancellationToken::new())
        .await
        .expect("root plan runs");

    assert!(report.completed, "report: {report:?}");
    let merge = report.outcome("jobs.merge").expect("merge ran");
    match &merge.status {
        StepStatus::Completed(value) => assert_eq!(value["merged"], json!(2)),
        other => panic!("merge did not complete: {other:?}"),
    }
}

#[tokio::test]
async fn test_blocking_operations_share_the_bounded_pool() {
    let catalog = Catalog::builder()
        .register(
            OperationDescriptor::source("g.slow_a", TypeSignature::named("T"))
                .blocking()
                .terminal(),
        )
        .register(
            OperationDescriptor::source("g.slow_b", TypeSignature::named("T"))
                .blocking()
                .terminal(),
        )
        .build();
    let compilation = compile(catalog);
    assert!(compilation.is_clean(), "{}", compilation.diagnostics);

    // Pool of one: both blocking calls still complete, serialized by the
    // semaphore rather than stalling the runtime.
    let adapter = ExecutionAdapter::new(1).unwrap();
    let mut handles = InvocationSet::new();
    let calls = Arc::new(AtomicUsize::new(0));

    for name in ["g.slow_a", "g.slow_b"] {
        let calls = Arc::clone(&calls);
        bind(
            &adapter,
            &mut handles,
            &compilation,
            name,
            blocking_op(move |_| {
                std::thread::sleep(Duration::from_millis(20));
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(json!("done"))
            }),
        );
    }

    let runner = PlanRunner::new(compilation.plan, handles);
    let report = runner
        .run(json!({}), &CancellationToken::new())
        .await
        .expect("root plan runs");

    assert!(report.completed);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_adapter_rejects_mismatched_bodies() {
    let compilation = compile(chain_catalog());
    let adapter = ExecutionAdapter::new(1).unwrap();

    // etl.load is declared blocking; an async body must be refused.
    let load = compilation.hierarchy.leaf_by_name("etl.load").unwrap();
    let mismatch = adapter.adapt(
        &load.descriptor,
        async_op(|_| async move { Ok(Payload::Null) }),
    );
    assert!(matches!(
        mismatch,
        Err(AdapterError::DispatchMismatch { .. })
    ));

    // And the other way around.
    let extract = compilation.hierarchy.leaf_by_name("etl.extract").unwrap();
    let mismatch = adapter.adapt(&extract.descriptor, blocking_op(|_| Ok(Payload::Null)));
    assert!(matches!(
        mismatch,
        Err(AdapterError::DispatchMismatch { .. })
    ));
}

#[tokio::test]
async fn test_failure_skips_later_batches_but_keeps_batch_outcomes() {
    let compilation = compile(chain_catalog());
    let adapter = ExecutionAdapter::new(1).unwrap();
    let mut handles = InvocationSet::new();

    bind(
        &adapter,
        &mut handles,
        &compilation,
        "etl.extract",
        async_op(|_| async move {
            Err(ExecutionError::OperationFailed {
                operation: "etl.extract".to_string(),
                message: "upstream unavailable".to_string(),
            })
        }),
    );
    bind(
        &adapter,
        &mut handles,
        &compilation,
        "etl.transform",
        async_op(|_| async move { Ok(Payload::Null) }),
    );
    bind(
        &adapter,
        &mut handles,
        &compilation,
        "etl.load",
        blocking_op(|_| Ok(Payload::Null)),
    );

    let runner = PlanRunner::new(compilation.plan, handles);
    let report = runner
        .run(json!({}), &CancellationToken::new())
        .await
        .expect("root plan runs");

    assert!(!report.completed);
    assert!(matches!(
        report.outcome("etl.extract").unwrap().status,
        StepStatus::Failed(_)
    ));
    assert!(matches!(
        report.outcome("etl.transform").unwrap().status,
        StepStatus::Skipped
    ));
    assert!(matches!(
        report.outcome("etl.load").unwrap().status,
        StepStatus::Skipped
    ));
}

#[tokio::test]
async fn test_cancellation_is_batch_granular() {
    let catalog = Catalog::builder()
        .register(OperationDescriptor::source(
            "g.first",
            TypeSignature::named("T"),
        ))
        .register(
            OperationDescriptor::new(
                "g.second",
                InputSignature::of(vec![Parameter::required(
                    "t",
                    TypeSignature::named("T"),
                )]),
                TypeSignature::Unit,
            ),
        )
        .build();
    let compilation = compile(catalog);
    assert!(compilation.is_clean(), "{}", compilation.diagnostics);

    let adapter = ExecutionAdapter::new(1).unwrap();
    let mut handles = InvocationSet::new();
    let cancel = CancellationToken::new();

    let cancel_from_op = cancel.clone();
    bind(
        &adapter,
        &mut handles,
        &compilation,
        "g.first",
        async_op(move |_| {
            let cancel = cancel_from_op.clone();
            async move {
                // Cancel mid-flight, then linger: the select in the
                // runner should interrupt this member.
                cancel.cancel();
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(json!("unreachable"))
            }
        }),
    );
    bind(
        &adapter,
        &mut handles,
        &compilation,
        "g.second",
        async_op(|_| async move { Ok(Payload::Null) }),
    );

    let runner = PlanRunner::new(compilation.plan, handles);
    let report = runner
        .run(json!({}), &cancel)
        .await
        .expect("root plan runs");

    assert!(!report.completed);
    assert!(matches!(
        report.outcome("g.first").unwrap().status,
        StepStatus::Cancelled
    ));
    // The dependent batch is never dispatched.
    assert!(matches!(
        report.outcome("g.second").unwrap().status,
        StepStatus::Skipped
    ));
}

#[tokio::test]
async fn test_external_inputs_reach_entry_operations() {
    let catalog = Catalog::builder()
        .register(
            OperationDescriptor::new(
                "g.entry",
                InputSignature::of(vec![Parameter::external(
                    "query",
                    TypeSignature::named("Query"),
                )]),
                TypeSignature::Unit,
            ),
        )
        .build();
    let compilation = compile(catalog);
    assert!(compilation.is_clean(), "{}", compilation.diagnostics);

    let adapter = ExecutionAdapter::new(1).unwrap();
    let mut handles = InvocationSet::new();
    bind(
        &adapter,
        &mut handles,
        &compilation,
        "g.entry",
        async_op(|input: Payload| async move {
            assert_eq!(input["query"], json!("rust jobs"));
            Ok(Payload::Null)
        }),
    );

    let runner = PlanRunner::new(compilation.plan, handles);
    let report = runner
        .run(json!({"query": "rust jobs"}), &CancellationToken::new())
        .await
        .expect("root plan runs");
    assert!(report.completed, "report: {report:?}");
}

#[tokio::test]
async fn test_unbound_operation_fails_its_step_only() {
    let compilation = compile(independent_catalog());
    let adapter = ExecutionAdapter::new(1).unwrap();
    let mut handles = InvocationSet::new();
    bind(
        &adapter,
        &mut handles,
        &compilation,
        "p.one",
        async_op(|_| async move { Ok(json!("ok")) }),
    );
    // p.two is intentionally left unbound.

    let runner = PlanRunner::new(compilation.plan, handles);
    let report = runner
        .run(json!({}), &CancellationToken::new())
        .await
        .expect("root plan runs");

    assert!(!report.completed);
    assert!(report.outcome("p.one").unwrap().status.is_completed());
    assert!(matches!(
        report.outcome("p.two").unwrap().status,
        StepStatus::Failed(_)
    ));
}
