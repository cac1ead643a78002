//! End-to-end tests covering compilation scenarios and the plan-level
//! guarantees: determinism, batch partitioning, topological soundness
//! and artifact round-trips.
mod common;
use common::*;
use hensei::diagnostics::DiagnosticCode;
use hensei::prelude::*;

#[test]
fn test_scenario_fan_in_across_nested_groups() {
    // Two fetcher groups and a merge whose input matches both outputs:
    // the fetches run in parallel, the merge afterwards.
    let compilation = compile(fetch_merge_catalog());
    assert!(compilation.is_clean(), "{}", compilation.diagnostics);

    let expanded = compilation
        .plan
        .expanded_batches("jobs")
        .expect("jobs plan emitted");
    assert_eq!(
        expanded,
        vec![
            vec![
                "jobs.stepstone.fetch".to_string(),
                "jobs.indeed.fetch".to_string()
            ],
            vec!["jobs.merge".to_string()],
        ]
    );
}

#[test]
fn test_scenario_unrelated_siblings_run_fully_parallel() {
    let compilation = compile(independent_catalog());
    assert!(compilation.is_clean(), "{}", compilation.diagnostics);
    assert_eq!(
        batch_ids(&compilation.plan, "p"),
        vec![vec!["p.one".to_string(), "p.two".to_string()]]
    );
}

#[test]
fn test_scenario_mutual_dependency_fails_the_group() {
    let compilation = compile(cyclic_catalog());
    let cycle = compilation
        .diagnostics
        .errors()
        .find(|d| d.code == DiagnosticCode::CyclicDependency)
        .expect("cycle diagnostic");
    assert!(cycle.message.contains("s.alpha"));
    assert!(cycle.message.contains("s.beta"));
    assert!(compilation.plan.group("s").is_none());
}

#[test]
fn test_scenario_empty_segment_is_rejected() {
    let catalog = Catalog::builder()
        .register(OperationDescriptor::source(
            "x..y",
            TypeSignature::named("Out"),
        ))
        .build();
    let compilation = compile(catalog);
    assert!(compilation
        .diagnostics
        .errors()
        .any(|d| d.code == DiagnosticCode::InvalidName));
    assert!(compilation.hierarchy.leaf_by_name("x..y").is_none());
}

#[test]
fn test_scenario_duplicate_name_spares_sibling_groups() {
    let compilation = compile(duplicate_catalog());
    assert!(compilation
        .diagnostics
        .errors()
        .any(|d| d.code == DiagnosticCode::DuplicateOperation));
    assert!(compilation.plan.group("svc").is_none());
    assert!(compilation.plan.group("other").is_some());
}

#[test]
fn test_compilation_is_deterministic() {
    let first = compile(fetch_merge_catalog());
    let second = compile(fetch_merge_catalog());
    assert_eq!(first.plan, second.plan);

    let chain_first = compile(chain_catalog());
    let chain_second = compile(chain_catalog());
    assert_eq!(chain_first.plan, chain_second.plan);
}

#[test]
fn test_partition_invariant() {
    // The union of a group's batches is exactly its direct step set,
    // without duplicates or omissions.
    let compilation = compile(fetch_merge_catalog());
    for group_plan in &compilation.plan.groups {
        let mut planned: Vec<&str> = group_plan.step_ids();
        planned.sort_unstable();
        assert!(
            planned.windows(2).all(|w| w[0] != w[1]),
            "duplicate step in group '{}'",
            group_plan.path
        );

        let mut expected: Vec<String> = compilation
            .hierarchy
            .steps_of(&group_plan.path)
            .iter()
            .map(|step| step.id.clone())
            .collect();
        expected.sort_unstable();
        assert_eq!(planned, expected, "group '{}'", group_plan.path);
    }
}

#[test]
fn test_topological_soundness() {
    // Every producer's batch index is strictly smaller than its
    // consumer's.
    let compilation = compile(fetch_merge_catalog());
    for group_plan in &compilation.plan.groups {
        let batch_of = |id: &str| {
            group_plan
                .batches
                .iter()
                .position(|batch| batch.steps.iter().any(|step| step.id() == id))
        };
        for edge in &group_plan.edges {
            let producer = batch_of(&edge.producer).expect("producer scheduled");
            let consumer = batch_of(&edge.consumer).expect("consumer scheduled");
            assert!(
                producer < consumer,
                "{} must run before {}",
                edge.producer,
                edge.consumer
            );
        }
    }
}

#[test]
fn test_plan_artifact_round_trip() {
    let compilation = compile(fetch_merge_catalog());
    let bytes = compilation.plan.to_bytes().expect("plan encodes");
    let restored = OrchestrationPlan::from_bytes(&bytes).expect("plan decodes");
    assert_eq!(compilation.plan, restored);
}

#[test]
fn test_replanning_from_plan_names_reproduces_the_hierarchy() {
    // Re-registering the operations named by the emitted plan yields the
    // same groups and the same batches: compile is idempotent over its
    // own output.
    let compilation = compile(fetch_merge_catalog());

    let mut builder = Catalog::builder();
    let original = fetch_merge_catalog();
    for path in compilation.plan.expanded_batches("jobs").unwrap().concat() {
        let descriptor = original.get(&path).expect("plan names a registered op");
        builder = builder.register(descriptor.clone());
    }
    let recompiled = compile(builder.build());

    assert_eq!(
        compilation.plan.group_paths(),
        recompiled.plan.group_paths()
    );
    assert_eq!(
        compilation.plan.expanded_batches("jobs"),
        recompiled.plan.expanded_batches("jobs")
    );
}

#[test]
fn test_plan_renders_for_display() {
    let compilation = compile(fetch_merge_catalog());
    let rendered = hensei::plan::render(&compilation.plan);
    assert!(rendered.contains("group jobs"));
    assert!(rendered.contains("jobs.merge"));
    assert!(rendered.contains("batch 0"));
}

#[test]
fn test_warnings_never_block_emission() {
    let catalog = Catalog::builder()
        .register(OperationDescriptor::source(
            "g.forgotten",
            TypeSignature::named("T"),
        ))
        .build();
    let compilation = compile(catalog);
    assert!(compilation.diagnostics.warnings().count() > 0);
    assert!(compilation.is_clean());
    assert!(compilation.plan.group("g").is_some());
}
