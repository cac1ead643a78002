use super::{OrchestrationPlan, PlanStep};
use std::fmt::Write;

/// Renders a plan as indented text, one group per section, one line per
/// batch. Intended for CLI output and debug dumps.
pub fn render(plan: &OrchestrationPlan) -> String {
    let mut out = String::new();
    for group in &plan.groups {
        let title = if group.path.is_empty() {
            "<root>"
        } else {
            &group.path
        };
        let _ = writeln!(out, "group {title}");
        for (index, batch) in group.batches.iter().enumerate() {
            let members: Vec<String> = batch
                .steps
                .iter()
                .map(|step| match step {
                    PlanStep::Operation { name } => name.clone(),
                    PlanStep::Group { path } => format!("[{path}]"),
                })
                .collect();
            let _ = writeln!(out, "  batch {index}: {}", members.join(", "));
        }
        if !group.edges.is_empty() {
            for edge in &group.edges {
                let _ = writeln!(
                    out,
                    "  edge: {} -> {} (param '{}')",
                    edge.producer, edge.consumer, edge.param
                );
            }
        }
    }
    out
}
