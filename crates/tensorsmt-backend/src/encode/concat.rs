//! Concatenation.

use tensorsmt_ir::{Argument, Graph, Node};
use tensorsmt_smt::SmtExpr;

use crate::error::BackendError;
use crate::regfile::TypeTag;
use crate::state::State;

use super::{operand_expr, PERM_NHWC_TO_NCHW};

/// Concatenate 2..=4 tensors along an axis.
///
/// The symbol name encodes the exact axis and input count, so structurally
/// identical concatenations share a symbol. When the node carries the
/// channels-last flag, the stored axis is remapped through the fixed
/// NHWC→NCHW table before use.
pub(crate) fn encode_cat(
    node: &Node,
    graph: &Graph,
    state: &mut State,
) -> Result<SmtExpr, BackendError> {
    let inputs = node.arg_node_list(0)?.to_vec();
    let count = inputs.len();
    if !(2..=4).contains(&count) {
        return Err(BackendError::UnsupportedArity {
            op: node.target.clone(),
            node: node.name.clone(),
            arity: count,
        });
    }

    let mut input_exprs = Vec::with_capacity(count);
    for id in inputs {
        input_exprs.push(operand_expr(node, graph, state, id)?);
    }

    let mut axis = match node.arg_opt(1) {
        Some(Argument::Int(v)) => *v,
        _ => 0,
    };
    if node.meta.channels_last_node && (0..4).contains(&axis) {
        axis = PERM_NHWC_TO_NCHW[axis as usize] as i64;
    }

    let expr = SmtExpr::call(format!("concat_a{}_n{}", axis, count), input_exprs);
    state.regs.bind(node.id, expr.clone(), TypeTag::Tensor)?;
    Ok(expr)
}
