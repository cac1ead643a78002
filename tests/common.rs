//! Common test utilities for building operation catalogs.
use hensei::prelude::*;

/// Scenario: two fetcher groups and a merge step.
///
/// `jobs.merge` consumes the pages both nested fetchers produce, so the
/// fetch groups form the first batch and the merge the second.
#[allow(dead_code)]
pub fn fetch_merge_catalog() -> Catalog {
    Catalog::builder()
        .register(OperationDescriptor::source(
            "jobs.stepstone.fetch",
            TypeSignature::named("JobPage"),
        ))
        .register(OperationDescriptor::source(
            "jobs.indeed.fetch",
            TypeSignature::named("JobPage"),
        ))
        .register(
            OperationDescriptor::new(
                "jobs.merge",
                InputSignature::of(vec![Parameter::required(
                    "pages",
                    TypeSignature::list_of(TypeSignature::named("JobPage")),
                )]),
                TypeSignature::named("JobIndex"),
            )
            .terminal(),
        )
        .build()
}

/// Two independent operations in one group; fully parallel.
#[allow(dead_code)]
pub fn independent_catalog() -> Catalog {
    Catalog::builder()
        .register(
            OperationDescriptor::source("p.one", TypeSignature::named("Alpha")).terminal(),
        )
        .register(
            OperationDescriptor::source("p.two", TypeSignature::named("Beta")).terminal(),
        )
        .build()
}

/// Mutually dependent siblings: `alpha` consumes `beta`'s output and
/// vice versa.
#[allow(dead_code)]
pub fn cyclic_catalog() -> Catalog {
    Catalog::builder()
        .register(OperationDescriptor::new(
            "s.alpha",
            InputSignature::of(vec![Parameter::required(
                "b",
                TypeSignature::named("B"),
            )]),
            TypeSignature::named("A"),
        ))
        .register(OperationDescriptor::new(
            "s.beta",
            InputSignature::of(vec![Parameter::required(
                "a",
                TypeSignature::named("A"),
            )]),
            TypeSignature::named("B"),
        ))
        .build()
}

/// The same name registered twice, next to an unaffected sibling group.
#[allow(dead_code)]
pub fn duplicate_catalog() -> Catalog {
    Catalog::builder()
        .register(
            OperationDescriptor::source("svc.run", TypeSignature::named("Out")).terminal(),
        )
        .register(
            OperationDescriptor::source("svc.run", TypeSignature::named("Out")).terminal(),
        )
        .register(
            OperationDescriptor::source("other.run", TypeSignature::named("Out")).terminal(),
        )
        .build()
}

/// A linear three-step chain in one group: extract -> transform -> load.
#[allow(dead_code)]
pub fn chain_catalog() -> Catalog {
    Catalog::builder()
        .register(OperationDescriptor::source(
            "etl.extract",
            TypeSignature::named("Raw"),
        ))
        .register(OperationDescriptor::new(
            "etl.transform",
            InputSignature::of(vec![Parameter::required(
                "raw",
                TypeSignature::named("Raw"),
            )]),
            TypeSignature::named("Clean"),
        ))
        .register(
            OperationDescriptor::new(
                "etl.load",
                InputSignature::of(vec![Parameter::required(
                    "clean",
                    TypeSignature::named("Clean"),
                )]),
                TypeSignature::Unit,
            )
            .blocking(),
        )
        .build()
}

#[allow(dead_code)]
pub fn compile(catalog: Catalog) -> Compilation {
    Compiler::builder(catalog).build().compile()
}

/// Batch membership of one group as plain step-id lists.
#[allow(dead_code)]
pub fn batch_ids(plan: &OrchestrationPlan, group: &str) -> Vec<Vec<String>> {
    plan.group(group)
        .map(|group_plan| {
            group_plan
                .batches
                .iter()
                .map(|batch| {
                    batch
                        .steps
                        .iter()
                        .map(|step| step.id().to_string())
                        .collect()
                })
                .collect()
        })
        .unwrap_or_default()
}
