use crate::catalog::{Catalog, OperationDescriptor, TypeSignature};
use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticReport};
use crate::name::ParsedName;
use ahash::AHashMap;
use std::collections::BTreeMap;

/// Path of the synthetic root group.
pub const ROOT_PATH: &str = "";

/// A registered operation attached to the containment graph.
#[derive(Debug, Clone)]
pub struct LeafNode {
    pub descriptor: OperationDescriptor,
    pub parsed: ParsedName,
    /// Position in the catalog; the stable scheduling tie-break key.
    pub decl_index: usize,
}

/// A named group synthesized from dotted-name prefixes. Groups are never
/// registered explicitly; every proper prefix of every operation name
/// becomes one, including the empty root.
#[derive(Debug, Clone)]
pub struct GroupNode {
    pub path: String,
    /// Direct child operations, as indices into the leaf table, in
    /// declaration order.
    pub operations: Vec<usize>,
    /// Direct child group paths, in order of first appearance.
    pub subgroups: Vec<String>,
}

impl GroupNode {
    fn new(path: String) -> Self {
        Self {
            path,
            operations: Vec::new(),
            subgroups: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty() && self.subgroups.is_empty()
    }
}

/// Whether a sibling step is an operation or a nested group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Operation,
    Group,
}

/// Uniform view of one direct child of a group, used by dependency
/// inference and scheduling. Operations carry their declared output;
/// groups carry their derived aggregate output.
#[derive(Debug, Clone)]
pub struct StepRef {
    /// Full operation name or group path.
    pub id: String,
    /// Last path segment; the key under which this step appears in the
    /// enclosing group's aggregate output.
    pub step_name: String,
    pub kind: StepKind,
    pub decl_index: usize,
    pub output: TypeSignature,
}

/// The containment graph: groups synthesized from name prefixes, leaves
/// attached to the group matching their parent path.
#[derive(Debug, Clone)]
pub struct HierarchyGraph {
    groups: BTreeMap<String, GroupNode>,
    leaves: Vec<LeafNode>,
    leaf_by_name: AHashMap<String, usize>,
}

impl HierarchyGraph {
    /// Builds the graph from a catalog snapshot. The catalog itself is
    /// never mutated. Invalid names create no node; duplicate names keep
    /// only their first registration attached. Both cases are reported,
    /// never silently resolved.
    pub fn build(catalog: &Catalog) -> (Self, DiagnosticReport) {
        let mut graph = Self {
            groups: BTreeMap::new(),
            leaves: Vec::new(),
            leaf_by_name: AHashMap::new(),
        };
        let mut report = DiagnosticReport::new();

        graph
            .groups
            .insert(ROOT_PATH.to_string(), GroupNode::new(ROOT_PATH.to_string()));

        for (decl_index, descriptor) in catalog.iter().enumerate() {
            let parsed = match ParsedName::parse(&descriptor.name) {
                Ok(parsed) => parsed,
                Err(err) => {
                    report.push(Diagnostic::new(
                        DiagnosticCode::InvalidName,
                        &descriptor.name,
                        ROOT_PATH,
                        err.to_string(),
                    ));
                    continue;
                }
            };

            if let Some(&first) = graph.leaf_by_name.get(parsed.full()) {
                report.push(Diagnostic::new(
                    DiagnosticCode::DuplicateOperation,
                    parsed.full(),
                    parsed.parent_path(),
                    format!(
                        "operation '{}' is registered more than once (first at catalog position {}, again at position {})",
                        parsed.full(),
                        graph.leaves[first].decl_index,
                        decl_index
                    ),
                ));
                continue;
            }

            graph.synthesize_prefix_groups(&parsed);

            let parent = parsed.parent_path();
            let leaf_index = graph.leaves.len();
            graph.leaf_by_name.insert(parsed.full().to_string(), leaf_index);
            graph.leaves.push(LeafNode {
                descriptor: descriptor.clone(),
                parsed,
                decl_index,
            });
            graph
                .groups
                .get_mut(&parent)
                .expect("parent group was synthesized above")
                .operations
                .push(leaf_index);
        }

        // An operation whose full name doubles as a group path (both
        // `a.b` and `a.b.c` registered) would make one step id mean two
        // different things; reported like a duplicate, never resolved by
        // picking one.
        for leaf in &graph.leaves {
            if graph.groups.contains_key(leaf.parsed.full()) {
                report.push(Diagnostic::new(
                    DiagnosticCode::DuplicateOperation,
                    leaf.parsed.full(),
                    leaf.parsed.parent_path(),
                    format!(
                        "operation '{}' collides with the group of the same path",
                        leaf.parsed.full()
                    ),
                ));
            }
        }

        (graph, report)
    }

    /// Creates a group node for every proper prefix of the name and links
    /// each new group into its parent.
    fn synthesize_prefix_groups(&mut self, parsed: &ParsedName) {
        let prefixes = parsed.prefix_paths();
        for window in prefixes.windows(2) {
            let (parent, child) = (&window[0], &window[1]);
            if !self.groups.contains_key(child) {
                self.groups
                    .insert(child.clone(), GroupNode::new(child.clone()));
            }
            let parent_node = self
                .groups
                .get_mut(parent)
                .expect("prefixes are visited shortest-first");
            if !parent_node.subgroups.contains(child) {
                parent_node.subgroups.push(child.clone());
            }
        }
    }

    /// Groups in lexicographic path order (deterministic).
    pub fn groups(&self) -> impl Iterator<Item = &GroupNode> {
        self.groups.values()
    }

    pub fn group(&self, path: &str) -> Option<&GroupNode> {
        self.groups.get(path)
    }

    pub fn leaf(&self, index: usize) -> &LeafNode {
        &self.leaves[index]
    }

    pub fn leaf_by_name(&self, name: &str) -> Option<&LeafNode> {
        self.leaf_by_name.get(name).map(|&idx| &self.leaves[idx])
    }

    pub fn leaves(&self) -> impl Iterator<Item = &LeafNode> {
        self.leaves.iter()
    }

    /// The derived aggregate output of a group: a record keyed by step
    /// name, holding each child operation's output and each child
    /// subgroup's aggregate. Unit outputs and empty child aggregates are
    /// omitted; they carry nothing consumable.
    pub fn aggregate_output(&self, path: &str) -> TypeSignature {
        let Some(group) = self.groups.get(path) else {
            return TypeSignature::Record(Vec::new());
        };

        let mut fields = Vec::new();
        for &leaf_index in &group.operations {
            let leaf = &self.leaves[leaf_index];
            if !leaf.descriptor.output.is_unit() {
                fields.push((
                    leaf.parsed.step_name().to_string(),
                    leaf.descriptor.output.clone(),
                ));
            }
        }
        for subgroup in &group.subgroups {
            let aggregate = self.aggregate_output(subgroup);
            if !matches!(&aggregate, TypeSignature::Record(f) if f.is_empty()) {
                fields.push((step_name_of_path(subgroup).to_string(), aggregate));
            }
        }
        TypeSignature::Record(fields)
    }

    /// Smallest declaration index of any operation in the group's
    /// subtree; orders subgroups against sibling operations.
    pub fn group_decl_index(&self, path: &str) -> usize {
        let Some(group) = self.groups.get(path) else {
            return usize::MAX;
        };
        let own = group
            .operations
            .iter()
            .map(|&idx| self.leaves[idx].decl_index)
            .min()
            .unwrap_or(usize::MAX);
        let nested = group
            .subgroups
            .iter()
            .map(|sub| self.group_decl_index(sub))
            .min()
            .unwrap_or(usize::MAX);
        own.min(nested)
    }

    /// The direct children of a group as uniform steps, sorted by
    /// declaration order.
    pub fn steps_of(&self, path: &str) -> Vec<StepRef> {
        let Some(group) = self.groups.get(path) else {
            return Vec::new();
        };

        let mut steps = Vec::new();
        for &leaf_index in &group.operations {
            let leaf = &self.leaves[leaf_index];
            steps.push(StepRef {
                id: leaf.parsed.full().to_string(),
                step_name: leaf.parsed.step_name().to_string(),
                kind: StepKind::Operation,
                decl_index: leaf.decl_index,
                output: leaf.descriptor.output.clone(),
            });
        }
        for subgroup in &group.subgroups {
            steps.push(StepRef {
                id: subgroup.clone(),
                step_name: step_name_of_path(subgroup).to_string(),
                kind: StepKind::Group,
                decl_index: self.group_decl_index(subgroup),
                output: self.aggregate_output(subgroup),
            });
        }
        steps.sort_by_key(|step| step.decl_index);
        steps
    }

    /// All operation names in the group's subtree, declaration-ordered
    /// within each level. Used when a nested group is expanded for
    /// display.
    pub fn subtree_operations(&self, path: &str) -> Vec<String> {
        let Some(group) = self.groups.get(path) else {
            return Vec::new();
        };
        let mut names: Vec<String> = group
            .operations
            .iter()
            .map(|&idx| self.leaves[idx].parsed.full().to_string())
            .collect();
        for subgroup in &group.subgroups {
            names.extend(self.subtree_operations(subgroup));
        }
        names
    }
}

/// Last segment of a group path (`"a.b" -> "b"`).
pub fn step_name_of_path(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}
