//! Elementwise binary arithmetic: add, sub, mul, div.
//!
//! All four share one protocol: resolve both operand expressions, combine
//! them algebraically, and bind the combination under the node's identity.
//! When the node's sole consumer is a ReLU call, the combination is
//! additionally rewritten as `max(0, combination)` and that expression is
//! bound under the *consumer's* identity; both bindings stay independently
//! retrievable.

use tensorsmt_ir::{Graph, Node, NodeKind};
use tensorsmt_smt::SmtExpr;

use crate::error::BackendError;
use crate::regfile::TypeTag;
use crate::state::State;

use super::argument_expr;

const RELU_TARGET: &str = "aten.relu.default";

/// The single fused ReLU consumer of `node`, if any.
///
/// Fusion requires exactly one user; a producer with two or more consumers
/// is never fused, even if one consumer is a ReLU.
fn relu_fused_user<'g>(graph: &'g Graph, node: &Node) -> Option<&'g Node> {
    let users = graph.users(node.id);
    match users.as_slice() {
        &[user] if user.kind == NodeKind::CallOperator && user.target == RELU_TARGET => Some(user),
        _ => None,
    }
}

fn encode_binary(
    node: &Node,
    graph: &Graph,
    state: &mut State,
    combine: fn(SmtExpr, SmtExpr) -> Result<SmtExpr, tensorsmt_smt::SmtError>,
) -> Result<SmtExpr, BackendError> {
    let lhs = argument_expr(node, graph, state, 0)?;
    let rhs = argument_expr(node, graph, state, 1)?;
    let combined = combine(lhs, rhs)?;

    if let Some(relu) = relu_fused_user(graph, node) {
        let rectified = SmtExpr::max(SmtExpr::real(0.0), combined.clone())?;
        state.regs.bind(relu.id, rectified, TypeTag::Tensor)?;
        tracing::debug!(node = %node.name, relu = %relu.name, "fused trailing relu");
    }

    state.regs.bind(node.id, combined.clone(), TypeTag::Tensor)?;
    Ok(combined)
}

pub(crate) fn encode_add(
    node: &Node,
    graph: &Graph,
    state: &mut State,
) -> Result<SmtExpr, BackendError> {
    encode_binary(node, graph, state, SmtExpr::add)
}

pub(crate) fn encode_sub(
    node: &Node,
    graph: &Graph,
    state: &mut State,
) -> Result<SmtExpr, BackendError> {
    encode_binary(node, graph, state, SmtExpr::sub)
}

pub(crate) fn encode_mul(
    node: &Node,
    graph: &Graph,
    state: &mut State,
) -> Result<SmtExpr, BackendError> {
    encode_binary(node, graph, state, SmtExpr::mul)
}

/// Symbolic division.
///
/// The division itself is unguarded: no divisor-nonzero obligation is
/// registered here. Consumers that need the side-condition record it
/// through [`State::well_defined`].
pub(crate) fn encode_div(
    node: &Node,
    graph: &Graph,
    state: &mut State,
) -> Result<SmtExpr, BackendError> {
    encode_binary(node, graph, state, SmtExpr::div)
}
