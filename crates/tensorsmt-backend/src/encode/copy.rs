//! Copies: memory-format/dtype conversion, dim-order copy, and the
//! multi-result `getitem` identity.

use tensorsmt_ir::{Graph, MemoryFormat, Node};
use tensorsmt_smt::SmtExpr;

use crate::error::BackendError;
use crate::regfile::TypeTag;
use crate::state::State;

use super::{argument_expr, input_shape, order_token, PERM_NCHW_TO_NHWC};

/// `_to_copy`: identity pass-through, except that converting to
/// channels-last on a known 4-D shape applies the fixed NCHW→NHWC symbolic
/// transpose. Formats outside {contiguous, channels-last} are unsupported.
pub(crate) fn encode_to_copy(
    node: &Node,
    graph: &Graph,
    state: &mut State,
) -> Result<SmtExpr, BackendError> {
    let target_format = node.meta.memory_format.unwrap_or(MemoryFormat::Contiguous);
    let to_channels_last = target_format == MemoryFormat::ChannelsLast;
    let to_contiguous = target_format == MemoryFormat::Contiguous;
    if !(to_channels_last || to_contiguous) {
        return Err(BackendError::UnsupportedMemoryFormat {
            op: node.target.clone(),
            node: node.name.clone(),
        });
    }

    let input = node.arg_node(0)?;
    let input_expr = argument_expr(node, graph, state, 0)?;

    let shape = input_shape(graph, input);
    let expr = if to_channels_last && shape.map(|s| s.len()) == Some(4) {
        let order: Vec<i64> = PERM_NCHW_TO_NHWC.iter().map(|&a| a as i64).collect();
        SmtExpr::call(format!("transpose_{}", order_token(&order)), vec![input_expr])
    } else {
        input_expr
    };

    state.regs.bind(node.id, expr.clone(), TypeTag::Tensor)?;
    Ok(expr)
}

/// Dim-order copy: a pure uninterpreted pass-through.
pub(crate) fn encode_to_dim_order_copy(
    node: &Node,
    graph: &Graph,
    state: &mut State,
) -> Result<SmtExpr, BackendError> {
    let input_expr = argument_expr(node, graph, state, 0)?;

    let expr = SmtExpr::call("dim_order_copy", vec![input_expr]);
    state.regs.bind(node.id, expr.clone(), TypeTag::Tensor)?;
    Ok(expr)
}

/// Multi-result selection: re-bind the operand's expression under the new
/// identity without constructing anything.
pub(crate) fn encode_getitem(
    node: &Node,
    graph: &Graph,
    state: &mut State,
) -> Result<SmtExpr, BackendError> {
    let expr = argument_expr(node, graph, state, 0)?;
    state.regs.bind(node.id, expr.clone(), TypeTag::Tensor)?;
    Ok(expr)
}
