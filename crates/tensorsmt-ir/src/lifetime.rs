//! Storage lifetimes for memory planning.
//!
//! Each value that needs backing storage is described by a [`TensorSpec`]:
//! a lifetime interval in execution steps, a byte size, an alignment, an
//! optional planned offset, and the set of values it deliberately aliases.
//! The planner assigns offsets; the verifier checks the non-overlap
//! invariant for live, non-aliased pairs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::node::{Argument, Graph, NodeId, NodeKind, PlaceholderRole};

/// Allocation role of a value, controlling whether the planner assigns it
/// storage at all (per configuration flags).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpecRole {
    Input,
    Output,
    MutableBuffer,
    Temporary,
}

/// A value's storage requirements and (once planned) its assignment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TensorSpec {
    pub value: NodeId,
    pub role: SpecRole,
    /// First and last execution step at which the value is live, inclusive.
    pub lifetime: (usize, usize),
    pub size_bytes: usize,
    pub alignment: usize,
    /// Planned byte offset; `None` until planning runs (or when the value's
    /// role is excluded from allocation).
    pub offset: Option<u64>,
    /// Values this one deliberately shares storage with.
    pub aliases: Vec<NodeId>,
    /// Explicit caller-granted permission for this spec to overlap others.
    #[serde(default)]
    pub allow_overlap: bool,
}

impl TensorSpec {
    pub fn new(value: NodeId, role: SpecRole, lifetime: (usize, usize), size_bytes: usize) -> Self {
        TensorSpec {
            value,
            role,
            lifetime,
            size_bytes,
            alignment: 1,
            offset: None,
            aliases: Vec::new(),
            allow_overlap: false,
        }
    }

    pub fn with_alignment(mut self, alignment: usize) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_aliases(mut self, aliases: Vec<NodeId>) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn with_allow_overlap(mut self) -> Self {
        self.allow_overlap = true;
        self
    }

    pub fn aliases_with(&self, other: &TensorSpec) -> bool {
        self.aliases.contains(&other.value) || other.aliases.contains(&self.value)
    }

    /// Whether the two lifetimes share at least one step.
    pub fn lifetime_overlaps(&self, other: &TensorSpec) -> bool {
        self.lifetime.0 <= other.lifetime.1 && other.lifetime.0 <= self.lifetime.1
    }

    /// Whether the two planned byte ranges intersect. Unplanned specs never
    /// intersect.
    pub fn storage_overlaps(&self, other: &TensorSpec) -> bool {
        match (self.offset, other.offset) {
            (Some(a), Some(b)) => {
                let a_end = a + self.size_bytes as u64;
                let b_end = b + other.size_bytes as u64;
                a < b_end && b < a_end
            }
            _ => false,
        }
    }
}

/// First/last use per value, from a single forward walk of the node stream.
///
/// A value's lifetime starts at its defining step and ends at its last
/// consuming step (its own step when never consumed). Output references
/// extend lifetimes to the output node's step.
pub fn compute_lifetimes(graph: &Graph) -> HashMap<NodeId, (usize, usize)> {
    let mut lifetimes: HashMap<NodeId, (usize, usize)> = HashMap::new();

    for (step, node) in graph.nodes().iter().enumerate() {
        if matches!(node.kind, NodeKind::Placeholder(_) | NodeKind::CallOperator) {
            lifetimes.insert(node.id, (step, step));
        }
        for arg in &node.args {
            let referenced: Vec<NodeId> = match arg {
                Argument::Node(id) => vec![*id],
                Argument::NodeList(list) => list.clone(),
                _ => continue,
            };
            for id in referenced {
                if let Some(interval) = lifetimes.get_mut(&id) {
                    interval.1 = interval.1.max(step);
                }
            }
        }
    }

    lifetimes
}

/// Derive a full set of specs from a graph: one per placeholder and call
/// node, with roles inferred from node kinds and output references.
pub fn specs_from_graph(
    graph: &Graph,
    size_for: impl Fn(&crate::node::Node) -> usize,
    alignment: usize,
) -> Vec<TensorSpec> {
    let lifetimes = compute_lifetimes(graph);
    let output_values: Vec<NodeId> = graph
        .outputs()
        .flat_map(|out| {
            out.args.iter().flat_map(|arg| match arg {
                Argument::Node(id) => vec![*id],
                Argument::NodeList(list) => list.clone(),
                _ => vec![],
            })
        })
        .collect();

    graph
        .nodes()
        .iter()
        .filter_map(|node| {
            let lifetime = *lifetimes.get(&node.id)?;
            let role = match node.kind {
                NodeKind::Placeholder(PlaceholderRole::UserInput) => SpecRole::Input,
                NodeKind::Placeholder(PlaceholderRole::Buffer) => SpecRole::MutableBuffer,
                NodeKind::Placeholder(_) => SpecRole::Temporary,
                NodeKind::CallOperator => {
                    if output_values.contains(&node.id) {
                        SpecRole::Output
                    } else {
                        SpecRole::Temporary
                    }
                }
                NodeKind::Output => return None,
            };
            Some(
                TensorSpec::new(node.id, role, lifetime, size_for(node))
                    .with_alignment(alignment),
            )
        })
        .collect()
}
