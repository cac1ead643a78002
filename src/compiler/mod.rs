use crate::catalog::Catalog;
use crate::diagnostics::DiagnosticReport;
use crate::entity::{EntityRegistry, StaticEntityRegistry};
use crate::plan::{GroupPlan, OrchestrationPlan};
use tracing::debug;

pub mod hierarchy;
pub mod inference;
pub mod schedule;
pub mod validate;

pub use hierarchy::{GroupNode, HierarchyGraph, LeafNode, StepKind, StepRef, ROOT_PATH};
pub use inference::{DependencyEdge, EdgesByGroup};

/// Everything one compilation pass produces: the plan for every group
/// that validated cleanly, the containment graph for introspection, and
/// the complete diagnostic report.
///
/// Error-severity diagnostics withhold only their own group's plan;
/// sibling groups still compile, so one malformed branch never masks the
/// diagnostics (or the plans) of the rest of the catalog.
#[derive(Debug)]
pub struct Compilation {
    pub plan: OrchestrationPlan,
    pub hierarchy: HierarchyGraph,
    pub diagnostics: DiagnosticReport,
}

impl Compilation {
    /// True when no error-severity diagnostic was produced. Warnings do
    /// not count; they never block emission.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_clean()
    }
}

/// Builder for a compilation pass over one catalog snapshot.
pub struct CompilerBuilder {
    catalog: Catalog,
    entities: Box<dyn EntityRegistry>,
}

impl CompilerBuilder {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            // Unresolvable by default: declared entity references without
            // a registry fail loudly instead of silently passing.
            entities: Box::new(StaticEntityRegistry::default()),
        }
    }

    /// Supplies the external entity-schema resolver consulted during
    /// validation.
    pub fn with_entity_registry(mut self, entities: impl EntityRegistry + 'static) -> Self {
        self.entities = Box::new(entities);
        self
    }

    pub fn build(self) -> Compiler {
        Compiler {
            catalog: self.catalog,
            entities: self.entities,
        }
    }
}

/// Compiles a frozen operation catalog into a validated hierarchy graph
/// and a parallel orchestration plan.
///
/// Compilation is synchronous and single-threaded over the snapshot; the
/// catalog is only borrowed, never mutated. All expected domain
/// conditions (bad names, duplicates, missing dependencies, cycles)
/// surface as diagnostics; `compile` itself cannot fail.
pub struct Compiler {
    catalog: Catalog,
    entities: Box<dyn EntityRegistry>,
}

impl Compiler {
    pub fn builder(catalog: Catalog) -> CompilerBuilder {
        CompilerBuilder::new(catalog)
    }

    pub fn compile(self) -> Compilation {
        let (graph, mut report) = HierarchyGraph::build(&self.catalog);
        debug!(
            operations = self.catalog.len(),
            groups = graph.groups().count(),
            "hierarchy graph built"
        );

        let (edges_by_group, inference_report) = inference::infer(&graph, self.catalog.relations());
        report.extend(inference_report);
        debug!(
            edges = edges_by_group.values().map(Vec::len).sum::<usize>(),
            "dependency edges inferred"
        );

        report.extend(validate::validate(
            &graph,
            &edges_by_group,
            self.catalog.relations(),
            self.entities.as_ref(),
        ));

        // Schedule every group, then gate emission per group: an error
        // anywhere in a group withholds that group's batches only.
        let mut candidates: Vec<GroupPlan> = Vec::new();
        for group in graph.groups() {
            let edges = edges_by_group
                .get(&group.path)
                .cloned()
                .unwrap_or_default();
            let (batches, schedule_report) = schedule::partition(&graph, &group.path, &edges);
            report.extend(schedule_report);
            if let Some(batches) = batches {
                candidates.push(GroupPlan {
                    path: group.path.clone(),
                    batches,
                    edges,
                });
            }
        }

        let groups: Vec<GroupPlan> = candidates
            .into_iter()
            .filter(|candidate| !report.group_has_errors(&candidate.path))
            .collect();
        debug!(
            emitted = groups.len(),
            errors = report.errors().count(),
            warnings = report.warnings().count(),
            "compilation finished"
        );

        let plan = OrchestrationPlan { groups };

        #[cfg(feature = "debug-tools")]
        self.write_debug_files(&plan, &report);

        Compilation {
            plan,
            hierarchy: graph,
            diagnostics: report,
        }
    }

    #[cfg(feature = "debug-tools")]
    fn write_debug_files(&self, plan: &OrchestrationPlan, report: &DiagnosticReport) {
        use std::fs;
        if fs::create_dir_all("tmp").is_err() {
            return;
        }
        let _ = fs::write("tmp/orchestration_plan.txt", crate::plan::render(plan));
        let _ = fs::write("tmp/diagnostics.txt", report.to_string());
    }
}
