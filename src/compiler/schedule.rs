use super::hierarchy::{HierarchyGraph, StepKind, StepRef};
use super::inference::DependencyEdge;
use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticReport};
use crate::plan::{ParallelBatch, PlanStep};
use ahash::AHashMap;
use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;

/// Partitions one group's direct steps into parallel batches.
///
/// Layered topological sort: batch 0 holds every step with no inbound
/// sibling edge; batch `k` holds the steps whose inbound edges all
/// originate in earlier batches. Ties inside a batch break by catalog
/// declaration order, so identical inputs always produce identical plans.
///
/// A cycle among siblings yields a `CyclicDependency` diagnostic naming
/// every step of the cycle, and `None`: the enclosing group gets no
/// batches while sibling groups remain unaffected.
pub fn partition(
    graph: &HierarchyGraph,
    group_path: &str,
    edges: &[DependencyEdge],
) -> (Option<Vec<ParallelBatch>>, DiagnosticReport) {
    let mut report = DiagnosticReport::new();
    let steps = graph.steps_of(group_path);
    if steps.is_empty() {
        return (Some(Vec::new()), report);
    }

    let index_of: AHashMap<&str, usize> = steps
        .iter()
        .enumerate()
        .map(|(i, step)| (step.id.as_str(), i))
        .collect();

    // Distinct producer->consumer pairs; several parameters may induce
    // the same pair.
    let mut dag: DiGraphMap<usize, ()> = DiGraphMap::new();
    for (i, _) in steps.iter().enumerate() {
        dag.add_node(i);
    }
    for edge in edges {
        if let (Some(&from), Some(&to)) = (
            index_of.get(edge.producer.as_str()),
            index_of.get(edge.consumer.as_str()),
        ) {
            dag.add_edge(from, to, ());
        }
    }

    let cycles = find_cycles(&dag, &steps);
    if !cycles.is_empty() {
        for cycle in cycles {
            report.push(Diagnostic::new(
                DiagnosticCode::CyclicDependency,
                cycle.join(" -> "),
                group_path,
                format!(
                    "dependency cycle among sibling operations: {}",
                    cycle.join(", ")
                ),
            ));
        }
        return (None, report);
    }

    let mut remaining: Vec<usize> = (0..steps.len()).collect();
    let mut placed = vec![false; steps.len()];
    let mut batches = Vec::new();

    while !remaining.is_empty() {
        let mut ready: Vec<usize> = remaining
            .iter()
            .copied()
            .filter(|&candidate| {
                dag.neighbors_directed(candidate, petgraph::Direction::Incoming)
                    .all(|producer| placed[producer])
            })
            .collect();
        // Unreachable once cycles are rejected above; kept as a guard
        // against a scheduling stall turning into an infinite loop.
        if ready.is_empty() {
            break;
        }
        ready.sort_by_key(|&i| steps[i].decl_index);

        for &i in &ready {
            placed[i] = true;
        }
        remaining.retain(|&i| !placed[i]);

        batches.push(ParallelBatch {
            steps: ready.iter().map(|&i| plan_step(&steps[i])).collect(),
        });
    }

    (Some(batches), report)
}

fn plan_step(step: &StepRef) -> PlanStep {
    match step.kind {
        StepKind::Operation => PlanStep::Operation {
            name: step.id.clone(),
        },
        StepKind::Group => PlanStep::Group {
            path: step.id.clone(),
        },
    }
}

/// Every strongly connected component that actually forms a cycle (more
/// than one member, or a self-loop), each as declaration-ordered step
/// ids, ordered by their first member.
fn find_cycles(dag: &DiGraphMap<usize, ()>, steps: &[StepRef]) -> Vec<Vec<String>> {
    let mut cycles: Vec<Vec<usize>> = tarjan_scc(dag)
        .into_iter()
        .filter(|component| {
            component.len() > 1
                || component
                    .first()
                    .is_some_and(|&n| dag.contains_edge(n, n))
        })
        .map(|mut component| {
            component.sort_by_key(|&i| steps[i].decl_index);
            component
        })
        .collect();
    cycles.sort_by_key(|component| steps[component[0]].decl_index);
    cycles
        .into_iter()
        .map(|component| component.iter().map(|&i| steps[i].id.clone()).collect())
        .collect()
}
