//! Per-operator encoding rules.
//!
//! Every supported operator has one encoding function with the same
//! contract: resolve the operand expressions (looking them up in the
//! register file, synthesizing leaves on demand), build the result
//! expression per the operator's algebra, bind it under the node's identity
//! with a type tag, and return it.
//!
//! The supported-operator set is a closed enum ([`SupportedOp`]) dispatched
//! by matching on the operator identity, so the set is exhaustively visible
//! at compile time. [`EncoderRegistry`] maps target names onto the enum and
//! is immutable after construction; registering the same target twice is a
//! hard error.

mod arithmetic;
mod attention;
mod concat;
mod copy;
mod gather_scatter;
mod matmul;
mod reduce;
mod shape;
mod slice;

use indexmap::IndexMap;
use tensorsmt_ir::{Argument, Graph, Node, NodeId, NodeKind};
use tensorsmt_smt::SmtExpr;

use crate::error::BackendError;
use crate::regfile::TypeTag;
use crate::state::State;

pub(crate) use arithmetic::{encode_add, encode_div, encode_mul, encode_sub};
pub(crate) use attention::encode_sdpa;
pub(crate) use concat::encode_cat;
pub(crate) use copy::{encode_getitem, encode_to_copy, encode_to_dim_order_copy};
pub(crate) use gather_scatter::{encode_embedding, encode_index_put};
pub(crate) use matmul::{encode_bmm, encode_linear, encode_mm};
pub(crate) use reduce::{encode_mean_dim, encode_rsqrt, encode_softmax};
pub(crate) use shape::{encode_expand, encode_permute, encode_reshape, encode_unsqueeze};
pub(crate) use slice::{encode_select, encode_slice};

/// Fixed axis-permutation tables for channels-last handling of 4-D tensors.
pub(crate) const PERM_NCHW_TO_NHWC: [usize; 4] = [0, 2, 3, 1];
pub(crate) const PERM_NHWC_TO_NCHW: [usize; 4] = [0, 3, 1, 2];

/// The closed set of operators with an encoding rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SupportedOp {
    Add,
    Sub,
    Mul,
    Div,
    Mm,
    Bmm,
    Linear,
    Reshape,
    Permute,
    Slice,
    Select,
    Cat,
    Expand,
    Unsqueeze,
    Embedding,
    IndexPut,
    Softmax,
    MeanDim,
    Rsqrt,
    Sdpa,
    ToCopy,
    ToDimOrderCopy,
    GetItem,
}

impl SupportedOp {
    /// Encode one call node, binding the result into `state`.
    pub fn encode(
        self,
        node: &Node,
        graph: &Graph,
        state: &mut State,
    ) -> Result<SmtExpr, BackendError> {
        match self {
            SupportedOp::Add => encode_add(node, graph, state),
            SupportedOp::Sub => encode_sub(node, graph, state),
            SupportedOp::Mul => encode_mul(node, graph, state),
            SupportedOp::Div => encode_div(node, graph, state),
            SupportedOp::Mm => encode_mm(node, graph, state),
            SupportedOp::Bmm => encode_bmm(node, graph, state),
            SupportedOp::Linear => encode_linear(node, graph, state),
            SupportedOp::Reshape => encode_reshape(node, graph, state),
            SupportedOp::Permute => encode_permute(node, graph, state),
            SupportedOp::Slice => encode_slice(node, graph, state),
            SupportedOp::Select => encode_select(node, graph, state),
            SupportedOp::Cat => encode_cat(node, graph, state),
            SupportedOp::Expand => encode_expand(node, graph, state),
            SupportedOp::Unsqueeze => encode_unsqueeze(node, graph, state),
            SupportedOp::Embedding => encode_embedding(node, graph, state),
            SupportedOp::IndexPut => encode_index_put(node, graph, state),
            SupportedOp::Softmax => encode_softmax(node, graph, state),
            SupportedOp::MeanDim => encode_mean_dim(node, graph, state),
            SupportedOp::Rsqrt => encode_rsqrt(node, graph, state),
            SupportedOp::Sdpa => encode_sdpa(node, graph, state),
            SupportedOp::ToCopy => encode_to_copy(node, graph, state),
            SupportedOp::ToDimOrderCopy => encode_to_dim_order_copy(node, graph, state),
            SupportedOp::GetItem => encode_getitem(node, graph, state),
        }
    }
}

/// Target-name table for the encoders. Two targets may share one encoder
/// (`select_copy.int` / `select.int`), but a target may appear only once.
const ENCODER_TARGETS: &[(&str, SupportedOp)] = &[
    ("aten.add.Tensor", SupportedOp::Add),
    ("aten.sub.Tensor", SupportedOp::Sub),
    ("aten.mul.Tensor", SupportedOp::Mul),
    ("aten.div.Tensor", SupportedOp::Div),
    ("aten.mm.default", SupportedOp::Mm),
    ("aten.bmm.default", SupportedOp::Bmm),
    ("aten.linear.default", SupportedOp::Linear),
    ("aten.view_copy.default", SupportedOp::Reshape),
    ("aten.permute_copy.default", SupportedOp::Permute),
    ("aten.slice_copy.Tensor", SupportedOp::Slice),
    ("aten.select_copy.int", SupportedOp::Select),
    ("aten.select.int", SupportedOp::Select),
    ("aten.cat.default", SupportedOp::Cat),
    ("aten.expand_copy.default", SupportedOp::Expand),
    ("aten.unsqueeze_copy.default", SupportedOp::Unsqueeze),
    ("aten.embedding.default", SupportedOp::Embedding),
    ("aten.index_put.default", SupportedOp::IndexPut),
    ("aten._softmax.default", SupportedOp::Softmax),
    ("aten.mean.dim", SupportedOp::MeanDim),
    ("aten.rsqrt.default", SupportedOp::Rsqrt),
    (
        "aten.scaled_dot_product_attention.default",
        SupportedOp::Sdpa,
    ),
    ("aten._to_copy.default", SupportedOp::ToCopy),
    (
        "dim_order_ops._to_dim_order_copy.default",
        SupportedOp::ToDimOrderCopy,
    ),
    ("getitem", SupportedOp::GetItem),
];

/// Immutable operator-identity → encoder map, built once per pass.
#[derive(Debug)]
pub struct EncoderRegistry {
    map: IndexMap<&'static str, SupportedOp>,
}

impl EncoderRegistry {
    /// Build the registry from the static target table. A duplicate target
    /// is a construction-time hard error.
    pub fn build() -> Result<Self, BackendError> {
        let mut map = IndexMap::new();
        for &(target, op) in ENCODER_TARGETS {
            if map.insert(target, op).is_some() {
                return Err(BackendError::DuplicateEncoder {
                    target: target.to_string(),
                });
            }
        }
        Ok(EncoderRegistry { map })
    }

    pub fn get(&self, target: &str) -> Option<SupportedOp> {
        self.map.get(target).copied()
    }

    /// The registered target names, in registration order.
    pub fn targets(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.map.keys().copied()
    }
}

// --- Operand resolution -----------------------------------------------------

/// Resolve the expression for an operand node: look it up if already
/// encoded, synthesize a leaf otherwise.
///
/// Leaves synthesize as follows: single-element constant tensors become the
/// concrete numeric constant; multi-element constant tensors are
/// unsupported; values whose payload cannot be concretized fall back to a
/// fresh named symbol (logged, not failed); free inputs become fresh named
/// variables keyed by the value's declared name. The synthesized expression
/// is bound so later users share it.
pub(crate) fn operand_expr(
    op_node: &Node,
    graph: &Graph,
    state: &mut State,
    id: NodeId,
) -> Result<SmtExpr, BackendError> {
    if state.regs.contains(id) {
        return Ok(state.regs.expr(id)?.clone());
    }

    let leaf = graph.node(id)?;
    let (expr, vtype) = match leaf.kind {
        NodeKind::Placeholder(role) if role.is_parameter_like() => match &leaf.meta.value {
            Some(value) => match (value.numel(), value.first_element()) {
                (Some(1), Some(v)) => (SmtExpr::real(v), TypeTag::Float),
                (Some(numel), _) => {
                    return Err(BackendError::UnsupportedConstantShape {
                        op: op_node.target.clone(),
                        node: leaf.name.clone(),
                        numel,
                    })
                }
                // Opaque payload: not concretizable at encode time.
                (None, _) => {
                    tracing::debug!(
                        value = %leaf.name,
                        "constant payload is symbolic; substituting a fresh symbol"
                    );
                    (SmtExpr::var(leaf.name.clone()), TypeTag::Tensor)
                }
            },
            None => {
                tracing::debug!(
                    value = %leaf.name,
                    "parameter has no payload; substituting a fresh symbol"
                );
                (SmtExpr::var(leaf.name.clone()), TypeTag::Tensor)
            }
        },
        _ => (SmtExpr::var(leaf.name.clone()), TypeTag::Tensor),
    };

    state.regs.bind(id, expr.clone(), vtype)?;
    Ok(expr)
}

/// Resolve an argument slot that may hold a node reference or a numeric
/// literal.
pub(crate) fn argument_expr(
    op_node: &Node,
    graph: &Graph,
    state: &mut State,
    index: usize,
) -> Result<SmtExpr, BackendError> {
    match op_node.arg_opt(index) {
        Some(Argument::Node(id)) => operand_expr(op_node, graph, state, *id),
        Some(Argument::Int(v)) => Ok(SmtExpr::real(*v as f64)),
        Some(Argument::Float(v)) => Ok(SmtExpr::real(*v)),
        Some(_) | None => Err(tensorsmt_ir::IrError::MissingArgument {
            node: op_node.name.clone(),
            index,
        }
        .into()),
    }
}

// --- Deterministic symbol naming --------------------------------------------

/// Render a shape as a symbol-name token: `[2, 3]` → `2x3`, scalar → `s`.
pub(crate) fn shape_token(shape: &[i64]) -> String {
    if shape.is_empty() {
        return "s".to_string();
    }
    shape
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("x")
}

/// Render an axis order as a symbol-name token: `[0, 2, 1]` → `0_2_1`.
pub(crate) fn order_token(order: &[i64]) -> String {
    order
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("_")
}

/// Shape metadata of the node itself (its output value), when known.
pub(crate) fn node_shape(node: &Node) -> Option<Vec<i64>> {
    node.meta.shape.clone()
}

/// Shape metadata of an operand node, when known.
pub(crate) fn input_shape(graph: &Graph, id: NodeId) -> Option<Vec<i64>> {
    graph.node(id).ok().and_then(|n| n.meta.shape.clone())
}

/// Normalize a possibly-negative dimension/index against an extent, Python
/// modulo style. Non-negative values pass through.
pub(crate) fn normalize_index(value: i64, extent: i64) -> i64 {
    if value < 0 && extent > 0 {
        value.rem_euclid(extent)
    } else {
        value
    }
}
