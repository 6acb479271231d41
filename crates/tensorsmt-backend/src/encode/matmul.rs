//! Matrix products: mm, bmm, linear.
//!
//! Matrix multiplication is modeled as an uninterpreted function; the
//! batch and non-batch variants get distinct symbols. No shape validation
//! happens here; the IR's own type-checking is assumed to have passed.

use tensorsmt_ir::{Graph, Node};
use tensorsmt_smt::SmtExpr;

use crate::error::BackendError;
use crate::regfile::TypeTag;
use crate::state::State;

use super::argument_expr;

pub(crate) fn encode_mm(
    node: &Node,
    graph: &Graph,
    state: &mut State,
) -> Result<SmtExpr, BackendError> {
    let a = argument_expr(node, graph, state, 0)?;
    let b = argument_expr(node, graph, state, 1)?;
    let expr = SmtExpr::call("mm", vec![a, b]);
    state.regs.bind(node.id, expr.clone(), TypeTag::Tensor)?;
    Ok(expr)
}

// (b, n, m) x (b, m, p) = (b, n, p)
pub(crate) fn encode_bmm(
    node: &Node,
    graph: &Graph,
    state: &mut State,
) -> Result<SmtExpr, BackendError> {
    let a = argument_expr(node, graph, state, 0)?;
    let b = argument_expr(node, graph, state, 1)?;
    let expr = SmtExpr::call("bmm", vec![a, b]);
    state.regs.bind(node.id, expr.clone(), TypeTag::Tensor)?;
    Ok(expr)
}

/// Linear layer: `y = x · wᵀ + bias`, with the bias defaulting to the zero
/// constant when absent.
///
/// The weight transpose is applied only when the expression kind supports
/// one; otherwise the weight is used as-is (best-effort degradation).
pub(crate) fn encode_linear(
    node: &Node,
    graph: &Graph,
    state: &mut State,
) -> Result<SmtExpr, BackendError> {
    let x = argument_expr(node, graph, state, 0)?;
    let w = argument_expr(node, graph, state, 1)?;
    let bias = match node.arg_opt(2) {
        Some(_) => argument_expr(node, graph, state, 2)?,
        None => SmtExpr::real(0.0),
    };

    let w_t = match w.try_transpose() {
        Some(t) => t,
        None => w,
    };

    let expr = SmtExpr::add(SmtExpr::mul(x, w_t)?, bias)?;
    state.regs.bind(node.id, expr.clone(), TypeTag::Tensor)?;
    Ok(expr)
}
