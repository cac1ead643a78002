use super::hierarchy::{HierarchyGraph, StepKind};
use super::inference::EdgesByGroup;
use crate::catalog::TypeRelations;
use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticReport};
use crate::entity::EntityRegistry;
use crate::name::ParsedName;
use ahash::AHashSet;

/// Structural and semantic checks across the three graph views. Always
/// walks everything and returns the complete finding set; nothing
/// short-circuits. Unsatisfied and ambiguous dependencies are reported
/// by the inferencer that discovers them; this pass adds the cross-graph
/// and defense-in-depth checks on top.
pub fn validate(
    graph: &HierarchyGraph,
    edges_by_group: &EdgesByGroup,
    relations: &TypeRelations,
    entities: &dyn EntityRegistry,
) -> DiagnosticReport {
    let mut report = DiagnosticReport::new();
    check_hierarchy(graph, &mut report);
    check_entity_refs(graph, entities, &mut report);
    check_data_flow(graph, edges_by_group, relations, &mut report);
    report
}

/// Hierarchy view: identifier rules and containment shape. Name and
/// duplicate violations surface while the graph is built (the offending
/// nodes never attach); what remains here are guards that re-assert the
/// invariants on the finished structure, plus the empty-group warning.
fn check_hierarchy(graph: &HierarchyGraph, report: &mut DiagnosticReport) {
    for leaf in graph.leaves() {
        // Re-parse as a guard: a leaf that got attached under a name the
        // parser rejects would mean the build loop regressed.
        if ParsedName::parse(leaf.parsed.full()).is_err() {
            report.push(Diagnostic::new(
                DiagnosticCode::InvalidName,
                leaf.parsed.full(),
                leaf.parsed.parent_path(),
                "attached operation name fails identifier validation",
            ));
        }
        if graph.group(&leaf.parsed.parent_path()).is_none() {
            report.push(Diagnostic::new(
                DiagnosticCode::InvalidName,
                leaf.parsed.full(),
                leaf.parsed.parent_path(),
                format!(
                    "operation is attached to parent group '{}' which does not exist",
                    leaf.parsed.parent_path()
                ),
            ));
        }
    }

    for group in graph.groups() {
        if group.is_empty() {
            report.push(Diagnostic::new(
                DiagnosticCode::EmptyGroup,
                &group.path,
                &group.path,
                "group contains no operations and no subgroups",
            ));
        }

        // Containment is acyclic by construction (a name cannot be its
        // own prefix); re-checked explicitly in case the naming rule is
        // ever relaxed.
        let mut seen: AHashSet<&str> = AHashSet::new();
        for subgroup in &group.subgroups {
            if subgroup == &group.path || !seen.insert(subgroup) {
                report.push(
                    Diagnostic::new(
                        DiagnosticCode::CyclicDependency,
                        subgroup,
                        &group.path,
                        "containment edge repeats or points at the group itself",
                    )
                    .in_view(crate::diagnostics::GraphView::Hierarchy),
                );
            }
        }
    }
}

/// Entity view: every declared entity reference must resolve against the
/// external schema registry. The registry is consulted read-only.
fn check_entity_refs(
    graph: &HierarchyGraph,
    entities: &dyn EntityRegistry,
    report: &mut DiagnosticReport,
) {
    for leaf in graph.leaves() {
        for entity in &leaf.descriptor.entity_refs {
            if !entities.resolve(entity) {
                report.push(Diagnostic::new(
                    DiagnosticCode::MissingEntityReference,
                    leaf.parsed.full(),
                    leaf.parsed.parent_path(),
                    format!("declared entity reference '{entity}' does not resolve in the entity-schema registry"),
                ));
            }
        }
    }
}

/// The path itself, then each ancestor up to (excluding) the root.
fn self_and_ancestors(path: &str) -> impl Iterator<Item = &str> {
    let mut current = Some(path);
    std::iter::from_fn(move || {
        let path = current?;
        current = path.rfind('.').map(|dot| &path[..dot]);
        Some(path)
    })
}

/// Data-flow view: re-verify every inferred edge (defense in depth) and
/// surface outputs nothing consumes.
fn check_data_flow(
    graph: &HierarchyGraph,
    edges_by_group: &EdgesByGroup,
    relations: &TypeRelations,
    report: &mut DiagnosticReport,
) {
    // Step names each group exports upward: a parent-level edge that
    // consumes the group's aggregate keeps the contributing members from
    // being flagged as dead. An empty access path consumes the whole
    // aggregate.
    let mut exported_all: AHashSet<String> = AHashSet::new();
    let mut exported_names: AHashSet<(String, String)> = AHashSet::new();
    for edges in edges_by_group.values() {
        for edge in edges {
            if graph.group(&edge.producer).is_none() {
                continue;
            }
            // Walk the access chain down through nested subgroups to the
            // member that actually feeds the consumer.
            let mut current = edge.producer.clone();
            let mut segments = edge.access.iter();
            loop {
                match segments.next() {
                    None => {
                        exported_all.insert(current);
                        break;
                    }
                    Some(segment) => {
                        let child_path = if current.is_empty() {
                            segment.clone()
                        } else {
                            format!("{current}.{segment}")
                        };
                        if graph.group(&child_path).is_some() {
                            current = child_path;
                        } else {
                            exported_names.insert((current, segment.clone()));
                            break;
                        }
                    }
                }
            }
        }
    }

    for group in graph.groups() {
        let steps = graph.steps_of(&group.path);
        let edges = edges_by_group
            .get(&group.path)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let mut producers_used: AHashSet<&str> = AHashSet::new();
        for edge in edges {
            producers_used.insert(edge.producer.as_str());

            let producer = steps.iter().find(|s| s.id == edge.producer);
            let consumer = graph.leaf_by_name(&edge.consumer);
            let param_ty = consumer.and_then(|leaf| {
                leaf.descriptor
                    .input
                    .params
                    .iter()
                    .find(|p| p.name == edge.param)
                    .map(|p| &p.ty)
            });

            let verified = match (producer, param_ty) {
                (Some(producer), Some(param_ty)) => {
                    relations.satisfies(&producer.output, param_ty).is_some()
                }
                _ => false,
            };
            if !verified {
                report.push(Diagnostic::new(
                    DiagnosticCode::UnsatisfiedDependency,
                    &edge.consumer,
                    &group.path,
                    format!(
                        "edge {} -> {} (param '{}') failed re-verification against the declared type signatures",
                        edge.producer, edge.consumer, edge.param
                    ),
                ));
            }
        }

        // Dead outputs: a non-terminal operation producing a value no
        // sibling consumes is a likely naming or wiring mistake.
        for step in steps.iter().filter(|s| s.kind == StepKind::Operation) {
            let leaf = graph
                .leaf_by_name(&step.id)
                .expect("operation steps resolve to leaves");
            if leaf.descriptor.output.is_unit() || leaf.descriptor.terminal {
                continue;
            }
            // A wholly-consumed aggregate covers every contributing
            // descendant, so check the group and all its ancestors.
            let ancestry_exported = self_and_ancestors(&group.path)
                .any(|path| exported_all.contains(path));
            let exported = ancestry_exported
                || exported_names
                    .contains(&(group.path.clone(), step.step_name.clone()));
            if !producers_used.contains(step.id.as_str()) && !exported {
                report.push(Diagnostic::new(
                    DiagnosticCode::DeadOutput,
                    &step.id,
                    &group.path,
                    format!(
                        "output of type {} is never consumed by a sibling and the operation is not marked terminal",
                        leaf.descriptor.output
                    ),
                ));
            }
        }
    }
}
