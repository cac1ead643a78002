mod artifact;
mod render;

pub use render::render;

use crate::compiler::inference::DependencyEdge;
use serde::{Deserialize, Serialize};

/// One entry of a parallel batch: either a directly invocable operation
/// or a nested group treated as an opaque unit. Awaiting a group step
/// means awaiting the whole child plan, so deep hierarchies compose
/// without the parent re-deriving child-level parallelism.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStep {
    Operation { name: String },
    Group { path: String },
}

impl PlanStep {
    /// Operation name or group path.
    pub fn id(&self) -> &str {
        match self {
            PlanStep::Operation { name } => name,
            PlanStep::Group { path } => path,
        }
    }
}

/// A set of steps with no dependency edges among them, safe to dispatch
/// concurrently. All predecessors live in earlier batches of the same
/// group plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelBatch {
    pub steps: Vec<PlanStep>,
}

/// The compiled execution plan of one group: ordered batches whose union
/// is exactly the group's direct steps, plus the dependency edges used
/// for input wiring and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPlan {
    pub path: String,
    pub batches: Vec<ParallelBatch>,
    pub edges: Vec<DependencyEdge>,
}

impl GroupPlan {
    /// Step ids across all batches, batch order preserved.
    pub fn step_ids(&self) -> Vec<&str> {
        self.batches
            .iter()
            .flat_map(|batch| batch.steps.iter().map(PlanStep::id))
            .collect()
    }
}

/// The compiled artifact of one catalog compilation: a plan per group
/// that validated cleanly. Created fresh on every compile and handed to
/// the workflow-engine adapter; it has no persistence of its own beyond
/// the optional artifact encoding.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrchestrationPlan {
    /// Group plans in lexicographic path order.
    pub groups: Vec<GroupPlan>,
}

impl OrchestrationPlan {
    pub fn group(&self, path: &str) -> Option<&GroupPlan> {
        self.groups.iter().find(|group| group.path == path)
    }

    /// The synthetic root group's plan, when it compiled cleanly.
    pub fn root(&self) -> Option<&GroupPlan> {
        self.group("")
    }

    pub fn group_paths(&self) -> Vec<&str> {
        self.groups.iter().map(|group| group.path.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// The batches of `path` with nested group steps flattened into the
    /// operations of their subtree, preserving the parent's batch
    /// boundaries. Display/assertion helper: the nesting itself is the
    /// executable structure.
    pub fn expanded_batches(&self, path: &str) -> Option<Vec<Vec<String>>> {
        let group = self.group(path)?;
        let expanded = group
            .batches
            .iter()
            .map(|batch| {
                batch
                    .steps
                    .iter()
                    .flat_map(|step| match step {
                        PlanStep::Operation { name } => vec![name.clone()],
                        PlanStep::Group { path } => self.subtree_operations(path),
                    })
                    .collect()
            })
            .collect();
        Some(expanded)
    }

    fn subtree_operations(&self, path: &str) -> Vec<String> {
        let Some(group) = self.group(path) else {
            return Vec::new();
        };
        group
            .batches
            .iter()
            .flat_map(|batch| batch.steps.iter())
            .flat_map(|step| match step {
                PlanStep::Operation { name } => vec![name.clone()],
                PlanStep::Group { path } => self.subtree_operations(path),
            })
            .collect()
    }
}
