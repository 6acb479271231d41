//! Nodes in the host IR stream.

use serde::{Deserialize, Serialize};

use crate::error::IrError;
use crate::metadata::Metadata;

/// Identity of one IR value. Indices are dense and follow definition order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// How a placeholder entered the exported program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaceholderRole {
    /// A free graph input supplied by the caller at run time.
    UserInput,
    /// An exported parameter (trained weight).
    Parameter,
    /// A registered buffer (possibly mutable).
    Buffer,
    /// A literal constant lifted to a placeholder by export.
    LiftedConstant,
}

impl PlaceholderRole {
    /// Parameters, buffers and lifted constants carry data known at encode
    /// time; user inputs do not.
    pub fn is_parameter_like(self) -> bool {
        !matches!(self, PlaceholderRole::UserInput)
    }
}

/// Operation kind of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Placeholder(PlaceholderRole),
    CallOperator,
    Output,
}

/// One argument slot of a node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Argument {
    Node(NodeId),
    NodeList(Vec<NodeId>),
    Int(i64),
    IntList(Vec<i64>),
    Float(f64),
    Bool(bool),
    None,
}

/// One instruction/value in the host graph.
///
/// `target` is the operator identity (e.g. `"aten.add.Tensor"`) for call
/// nodes, and the exported value name for placeholders. `name` is the SSA
/// value name, unique per graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub target: String,
    pub name: String,
    pub args: Vec<Argument>,
    pub meta: Metadata,
}

impl Node {
    /// The argument at `index` as a node reference.
    pub fn arg_node(&self, index: usize) -> Result<NodeId, IrError> {
        match self.args.get(index) {
            Some(Argument::Node(id)) => Ok(*id),
            Some(_) => Err(IrError::ArgumentKind {
                node: self.name.clone(),
                index,
                expected: "a node reference",
            }),
            None => Err(IrError::MissingArgument {
                node: self.name.clone(),
                index,
            }),
        }
    }

    /// The argument at `index` as an integer literal.
    pub fn arg_int(&self, index: usize) -> Result<i64, IrError> {
        match self.args.get(index) {
            Some(Argument::Int(v)) => Ok(*v),
            Some(_) => Err(IrError::ArgumentKind {
                node: self.name.clone(),
                index,
                expected: "an integer literal",
            }),
            None => Err(IrError::MissingArgument {
                node: self.name.clone(),
                index,
            }),
        }
    }

    /// The argument at `index` as an integer list.
    pub fn arg_int_list(&self, index: usize) -> Result<&[i64], IrError> {
        match self.args.get(index) {
            Some(Argument::IntList(v)) => Ok(v),
            Some(_) => Err(IrError::ArgumentKind {
                node: self.name.clone(),
                index,
                expected: "an integer list",
            }),
            None => Err(IrError::MissingArgument {
                node: self.name.clone(),
                index,
            }),
        }
    }

    /// The argument at `index` as a node list.
    pub fn arg_node_list(&self, index: usize) -> Result<&[NodeId], IrError> {
        match self.args.get(index) {
            Some(Argument::NodeList(v)) => Ok(v),
            Some(_) => Err(IrError::ArgumentKind {
                node: self.name.clone(),
                index,
                expected: "a node list",
            }),
            None => Err(IrError::MissingArgument {
                node: self.name.clone(),
                index,
            }),
        }
    }

    /// An optional argument: absent slots and explicit `None` both read as
    /// `None`.
    pub fn arg_opt(&self, index: usize) -> Option<&Argument> {
        match self.args.get(index) {
            None | Some(Argument::None) => None,
            some => some,
        }
    }
}

/// An ordered node stream in definition (topological) order.
///
/// Built once, read many times; the encoder never mutates it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    nodes: Vec<Node>,
}

impl Graph {
    pub fn new() -> Self {
        Graph::default()
    }

    /// Append a node, assigning the next dense id.
    pub fn add_node(
        &mut self,
        kind: NodeKind,
        target: impl Into<String>,
        name: impl Into<String>,
        args: Vec<Argument>,
        meta: Metadata,
    ) -> Result<NodeId, IrError> {
        let name = name.into();
        if self.nodes.iter().any(|n| n.name == name) {
            return Err(IrError::DuplicateNodeName { name });
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            id,
            kind,
            target: target.into(),
            name,
            args,
            meta,
        });
        Ok(id)
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, IrError> {
        self.nodes.get(id.0).ok_or(IrError::NodeIndexOutOfBounds {
            index: id.0,
            max: self.nodes.len().saturating_sub(1),
        })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes that reference `id` through any argument slot.
    pub fn users(&self, id: NodeId) -> Vec<&Node> {
        self.nodes
            .iter()
            .filter(|n| {
                n.args.iter().any(|arg| match arg {
                    Argument::Node(other) => *other == id,
                    Argument::NodeList(list) => list.contains(&id),
                    _ => false,
                })
            })
            .collect()
    }

    /// The output nodes of the graph, in definition order.
    pub fn outputs(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.kind == NodeKind::Output)
    }
}
