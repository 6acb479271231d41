//! Scaled dot-product attention.

use tensorsmt_ir::{Argument, Graph, Node};
use tensorsmt_smt::SmtExpr;

use crate::error::BackendError;
use crate::regfile::TypeTag;
use crate::state::State;

use super::{argument_expr, input_shape};

/// `sdpa(q, k, v, mask, scale)` as one uninterpreted application.
///
/// When no scale argument is supplied it defaults to `1/√d` with `d` the
/// last dimension of the query, falling back to 1 when the query shape is
/// unknown.
pub(crate) fn encode_sdpa(
    node: &Node,
    graph: &Graph,
    state: &mut State,
) -> Result<SmtExpr, BackendError> {
    let q_node = node.arg_node(0)?;
    let q = argument_expr(node, graph, state, 0)?;
    let k = argument_expr(node, graph, state, 1)?;
    let v = argument_expr(node, graph, state, 2)?;
    let mask = match node.arg_opt(3) {
        Some(_) => argument_expr(node, graph, state, 3)?,
        None => SmtExpr::real(0.0),
    };

    let scale = match node.arg_opt(4) {
        Some(Argument::Float(s)) => *s,
        _ => match input_shape(graph, q_node).and_then(|shape| shape.last().copied()) {
            Some(embedding_dim) if embedding_dim > 0 => 1.0 / (embedding_dim as f64).sqrt(),
            _ => 1.0,
        },
    };

    let expr = SmtExpr::call("sdpa", vec![q, k, v, mask, SmtExpr::real(scale)]);
    state.regs.bind(node.id, expr.clone(), TypeTag::Tensor)?;
    Ok(expr)
}
