use super::hierarchy::{HierarchyGraph, StepKind, StepRef};
use crate::catalog::{MatchKind, ParamMatch, TypeRelations, TypeSignature};
use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticReport};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A directed produces-before-consumes edge between two sibling steps of
/// one group. The producer may be an operation or a nested group (matched
/// through its aggregate output); the consumer is always an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub producer: String,
    pub consumer: String,
    /// The consumer parameter this edge feeds.
    pub param: String,
    pub kind: MatchKind,
    /// Field chain into the producer's aggregate record, empty unless
    /// `kind` is `Aggregate`.
    #[serde(default)]
    pub access: Vec<String>,
    /// True when this producer supplies one element of a list parameter.
    #[serde(default)]
    pub element: bool,
}

/// Edges grouped by the enclosing group path, in deterministic order.
pub type EdgesByGroup = BTreeMap<String, Vec<DependencyEdge>>;

/// Infers type-directed dependency edges for every group in the graph.
///
/// Scope is deliberately per-group and pairwise: operations never depend
/// across group boundaries implicitly. Cross-group flow goes through a
/// parent-level operation consuming the child group's aggregate output.
pub fn infer(graph: &HierarchyGraph, relations: &TypeRelations) -> (EdgesByGroup, DiagnosticReport) {
    let mut edges_by_group = EdgesByGroup::new();
    let mut report = DiagnosticReport::new();

    for group in graph.groups() {
        let steps = graph.steps_of(&group.path);
        let mut edges = Vec::new();

        for consumer in steps.iter().filter(|s| s.kind == StepKind::Operation) {
            let leaf = graph
                .leaf_by_name(&consumer.id)
                .expect("operation steps resolve to leaves");

            for param in &leaf.descriptor.input.params {
                if param.external {
                    continue;
                }

                let matched = match_param(&steps, consumer, &param.ty, relations);

                if matched.is_empty() {
                    if param.required {
                        report.push(Diagnostic::new(
                            DiagnosticCode::UnsatisfiedDependency,
                            &consumer.id,
                            &group.path,
                            format!(
                                "required input '{}' of type {} matches no sibling output and is not declared external",
                                param.name, param.ty
                            ),
                        ));
                    }
                    continue;
                }

                // Scalar parameters with several candidate producers are
                // ambiguous; list parameters aggregate by design.
                let aggregating = matches!(param.ty, TypeSignature::List(_));
                if matched.len() > 1 && !aggregating {
                    let producers: Vec<&str> =
                        matched.iter().map(|(step, _)| step.id.as_str()).collect();
                    report.push(Diagnostic::new(
                        DiagnosticCode::AmbiguousDependency,
                        &consumer.id,
                        &group.path,
                        format!(
                            "input '{}' of type {} is satisfiable by several siblings ({}); depending on all of them",
                            param.name,
                            param.ty,
                            producers.join(", ")
                        ),
                    ));
                }

                for (producer, param_match) in matched {
                    edges.push(DependencyEdge {
                        producer: producer.id.clone(),
                        consumer: consumer.id.clone(),
                        param: param.name.clone(),
                        kind: param_match.kind,
                        access: param_match.access,
                        element: param_match.element,
                    });
                }
            }
        }

        edges_by_group.insert(group.path.clone(), edges);
    }

    (edges_by_group, report)
}

/// Candidate producers for one parameter, in declaration order.
fn match_param<'a>(
    steps: &'a [StepRef],
    consumer: &StepRef,
    param_ty: &TypeSignature,
    relations: &TypeRelations,
) -> Vec<(&'a StepRef, ParamMatch)> {
    steps
        .iter()
        .filter(|candidate| candidate.id != consumer.id)
        .filter_map(|candidate| {
            relations
                .satisfies(&candidate.output, param_ty)
                .map(|m| (candidate, m))
        })
        .collect()
}
