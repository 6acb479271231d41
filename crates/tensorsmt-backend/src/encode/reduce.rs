//! Reductions and normalization primitives: softmax, mean.dim, rsqrt.

use tensorsmt_ir::{Argument, Graph, Node};
use tensorsmt_smt::SmtExpr;

use crate::error::BackendError;
use crate::regfile::TypeTag;
use crate::state::State;

use super::{argument_expr, input_shape, shape_token};

/// Softmax over the last dimension only.
pub(crate) fn encode_softmax(
    node: &Node,
    graph: &Graph,
    state: &mut State,
) -> Result<SmtExpr, BackendError> {
    let input = node.arg_node(0)?;
    let dim = node.arg_int(1)?;

    if let Some(shape) = input_shape(graph, input) {
        let rank = shape.len() as i64;
        if dim != -1 && dim != rank - 1 {
            return Err(BackendError::UnsupportedAxis {
                op: node.target.clone(),
                node: node.name.clone(),
                axis: dim,
            });
        }
    }

    let input_expr = argument_expr(node, graph, state, 0)?;
    let expr = SmtExpr::call("softmax_last", vec![input_expr]);
    state.regs.bind(node.id, expr.clone(), TypeTag::Tensor)?;
    Ok(expr)
}

/// Mean over the two innermost dimensions of a 4-D input with keepdim:
/// a global average pool over the spatial dims. Everything else is outside
/// the modeled subset.
pub(crate) fn encode_mean_dim(
    node: &Node,
    graph: &Graph,
    state: &mut State,
) -> Result<SmtExpr, BackendError> {
    let input = node.arg_node(0)?;

    let dims = node.arg_int_list(1)?;
    if !(dims == [-1, -2] || dims == [-2, -1]) {
        return Err(BackendError::UnsupportedReduction {
            op: node.target.clone(),
            node: node.name.clone(),
            reason: format!("only the two innermost dims are supported, got {:?}", dims),
        });
    }

    let keepdim = matches!(node.arg_opt(2), Some(Argument::Bool(true)));
    if !keepdim {
        return Err(BackendError::UnsupportedReduction {
            op: node.target.clone(),
            node: node.name.clone(),
            reason: "only keepdim=true is supported".to_string(),
        });
    }

    let shape = input_shape(graph, input).ok_or_else(|| BackendError::UnsupportedReduction {
        op: node.target.clone(),
        node: node.name.clone(),
        reason: "input shape is unknown".to_string(),
    })?;
    if shape.len() != 4 {
        return Err(BackendError::UnsupportedReduction {
            op: node.target.clone(),
            node: node.name.clone(),
            reason: format!("input must be 4-D, got rank {}", shape.len()),
        });
    }

    let input_expr = argument_expr(node, graph, state, 0)?;
    let expr = SmtExpr::call(format!("gap_{}", shape_token(&shape)), vec![input_expr]);
    state.regs.bind(node.id, expr.clone(), TypeTag::Tensor)?;
    Ok(expr)
}

/// Reciprocal square root, built from the primitive real-valued sqrt and
/// divide rather than an uninterpreted symbol. No domain restriction is
/// asserted on the operand.
pub(crate) fn encode_rsqrt(
    node: &Node,
    graph: &Graph,
    state: &mut State,
) -> Result<SmtExpr, BackendError> {
    let input_expr = argument_expr(node, graph, state, 0)?;

    let expr = SmtExpr::div(SmtExpr::real(1.0), SmtExpr::sqrt(input_expr)?)?;
    state.regs.bind(node.id, expr.clone(), TypeTag::Tensor)?;
    Ok(expr)
}
