//! Eligibility filtering and partition grouping.
//!
//! The partitioner proper lives with the host IR; this module supplies the
//! boolean predicate it consumes (is a node encodable by this backend),
//! plus the grouping of eligible nodes into connected partitions and the
//! delegation-tag map.

use std::collections::{BTreeMap, HashMap, HashSet};

use tensorsmt_ir::{Argument, Graph, Node, NodeId, NodeKind};

use crate::encode::EncoderRegistry;
use crate::error::BackendError;

/// Operators the backend will never encode.
pub const NOT_SUPPORTED_OPERATORS: &[&str] = &[
    "aten.arange.start_step",
    "aten.clone.default",
    "aten.full.default",
    "aten.slice_scatter.default",
    "aten.copy.default",
    "quantized_decomposed.embedding_4bit.dtype",
];

/// Operators reserved for future support: recognized, rejected with a
/// logged reason.
pub const TO_BE_IMPLEMENTED_OPERATORS: &[&str] = &[
    "aten.any.dim",
    "aten.eq.Scalar",
    "aten.full_like.default",
    "aten.logical_not.default",
    "aten.where.self",
];

/// Why a node was rejected, in check order. The first failing check wins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RejectReason {
    NotCallOperator,
    Denied,
    ToBeImplemented,
    SkippedById,
    SkippedByName,
    NotAllowed,
}

/// The eligibility predicate over operator identity and deny/allow lists.
#[derive(Debug)]
pub struct OperatorSupport {
    allow: HashSet<String>,
    deny: HashSet<String>,
    pending: HashSet<String>,
    skip_node_ids: HashSet<String>,
    skip_node_ops: HashSet<String>,
}

impl OperatorSupport {
    /// Support set derived from the encoder registry's targets and the
    /// static deny/pending lists.
    pub fn new() -> Result<Self, BackendError> {
        let registry = EncoderRegistry::build()?;
        Ok(Self::with_allow_list(registry.targets()))
    }

    pub fn with_allow_list<'a>(allow: impl IntoIterator<Item = &'a str>) -> Self {
        OperatorSupport {
            allow: allow.into_iter().map(str::to_string).collect(),
            deny: NOT_SUPPORTED_OPERATORS.iter().map(|s| s.to_string()).collect(),
            pending: TO_BE_IMPLEMENTED_OPERATORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            skip_node_ids: HashSet::new(),
            skip_node_ops: HashSet::new(),
        }
    }

    /// Skip specific nodes by SSA name.
    pub fn skip_node_ids(mut self, ids: impl IntoIterator<Item = String>) -> Self {
        self.skip_node_ids.extend(ids);
        self
    }

    /// Skip all nodes of specific operator names.
    pub fn skip_node_ops(mut self, ops: impl IntoIterator<Item = String>) -> Self {
        self.skip_node_ops.extend(ops);
        self
    }

    /// The first failing check, or `None` when the node is eligible.
    /// Checks short-circuit in order: kind/denylist, pending list, skip
    /// sets, allow-list.
    pub fn eligibility(&self, node: &Node) -> Option<RejectReason> {
        if node.kind != NodeKind::CallOperator {
            return Some(RejectReason::NotCallOperator);
        }
        if self.deny.contains(&node.target) {
            return Some(RejectReason::Denied);
        }
        if self.pending.contains(&node.target) {
            return Some(RejectReason::ToBeImplemented);
        }
        if self.skip_node_ids.contains(&node.name) {
            return Some(RejectReason::SkippedById);
        }
        if self.skip_node_ops.contains(&node.target) {
            return Some(RejectReason::SkippedByName);
        }
        if !self.allow.contains(&node.target) {
            return Some(RejectReason::NotAllowed);
        }
        None
    }

    /// Boolean predicate consumed by the external partitioner, with the
    /// rejection reason logged.
    pub fn is_eligible(&self, node: &Node) -> bool {
        match self.eligibility(node) {
            None => true,
            Some(RejectReason::NotCallOperator) => false,
            Some(reason) => {
                tracing::debug!(
                    target = %node.target,
                    node = %node.name,
                    reason = ?reason,
                    "node rejected for SMT delegation"
                );
                false
            }
        }
    }
}

/// A maximal connected group of eligible nodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Partition {
    pub id: usize,
    pub nodes: Vec<NodeId>,
}

/// Group eligible call nodes into connected partitions: two eligible nodes
/// land in the same partition when one consumes the other's value.
pub fn generate_partitions(graph: &Graph, support: &OperatorSupport) -> Vec<Partition> {
    let eligible: HashSet<NodeId> = graph
        .nodes()
        .iter()
        .filter(|n| support.is_eligible(n))
        .map(|n| n.id)
        .collect();

    // Union-find over the eligible set.
    let mut parent: HashMap<NodeId, NodeId> = eligible.iter().map(|&id| (id, id)).collect();

    fn find(parent: &mut HashMap<NodeId, NodeId>, id: NodeId) -> NodeId {
        let mut root = id;
        while parent[&root] != root {
            root = parent[&root];
        }
        let mut current = id;
        while parent[&current] != root {
            let next = parent[&current];
            parent.insert(current, root);
            current = next;
        }
        root
    }

    for node in graph.nodes() {
        if !eligible.contains(&node.id) {
            continue;
        }
        for arg in &node.args {
            let referenced: Vec<NodeId> = match arg {
                Argument::Node(id) => vec![*id],
                Argument::NodeList(ids) => ids.clone(),
                _ => continue,
            };
            for other in referenced {
                if eligible.contains(&other) {
                    let a = find(&mut parent, node.id);
                    let b = find(&mut parent, other);
                    if a != b {
                        parent.insert(a, b);
                    }
                }
            }
        }
    }

    // Collect components in definition order of their first member.
    let mut groups: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
    let mut members: Vec<NodeId> = eligible.into_iter().collect();
    members.sort();
    for id in members {
        let root = find(&mut parent, id);
        groups.entry(root).or_default().push(id);
    }

    let mut partitions: Vec<(NodeId, Vec<NodeId>)> = groups
        .into_iter()
        .map(|(_, mut nodes)| {
            nodes.sort();
            (nodes[0], nodes)
        })
        .collect();
    partitions.sort_by_key(|(first, _)| *first);

    partitions
        .into_iter()
        .enumerate()
        .map(|(id, (_, nodes))| Partition { id, nodes })
        .collect()
}

/// Assign each partitioned node a delegation tag (`smt_<id>`). Consumed
/// constants (parameter-like placeholders with no remaining users) are
/// tagged into the last partition so they survive later constant pruning.
pub fn tag_nodes(graph: &Graph, partitions: &[Partition]) -> BTreeMap<String, String> {
    let mut tags = BTreeMap::new();
    for partition in partitions {
        for &id in &partition.nodes {
            if let Ok(node) = graph.node(id) {
                tags.insert(node.name.clone(), format!("smt_{}", partition.id));
            }
        }
    }

    if let Some(last) = partitions.last() {
        for node in graph.nodes() {
            let NodeKind::Placeholder(role) = node.kind else {
                continue;
            };
            if role.is_parameter_like() && graph.users(node.id).is_empty() {
                tags.insert(node.name.clone(), format!("smt_{}", last.id));
            }
        }
    }

    tags
}
