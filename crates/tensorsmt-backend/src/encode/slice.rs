//! Single-dimension views: slice_copy and select_copy.
//!
//! Negative dimensions and indices are normalized modulo the known shape.
//! Only stride 1 is supported for slices; the slice size comes from the
//! node's own output-shape metadata when available, then from the
//! begin/end literals, and is otherwise indeterminate.

use tensorsmt_ir::{Argument, Graph, Node};
use tensorsmt_smt::SmtExpr;

use crate::error::BackendError;
use crate::regfile::TypeTag;
use crate::state::State;

use super::{argument_expr, input_shape, node_shape, normalize_index, shape_token};

pub(crate) fn encode_slice(
    node: &Node,
    graph: &Graph,
    state: &mut State,
) -> Result<SmtExpr, BackendError> {
    let input = node.arg_node(0)?;
    let input_expr = argument_expr(node, graph, state, 0)?;

    let mut dim = node.arg_int(1)?;
    let mut start = node.arg_int(2)?;
    let end = match node.arg_opt(3) {
        Some(Argument::Int(v)) => Some(*v),
        _ => None,
    };
    let stride = match node.arg_opt(4) {
        Some(Argument::Int(v)) => *v,
        _ => 1,
    };
    if stride != 1 {
        return Err(BackendError::UnsupportedStride {
            op: node.target.clone(),
            node: node.name.clone(),
            stride,
        });
    }

    let shape = input_shape(graph, input);
    if let Some(shape) = &shape {
        dim = normalize_index(dim, shape.len() as i64);
        if let Some(&extent) = shape.get(dim as usize) {
            start = normalize_index(start, extent);
        }
    }

    let size = match node_shape(node) {
        Some(out_shape) => out_shape.get(dim as usize).copied().ok_or_else(|| {
            BackendError::IndeterminateSize {
                op: node.target.clone(),
                node: node.name.clone(),
            }
        })?,
        None => match end {
            Some(end) => end - start,
            None => {
                return Err(BackendError::IndeterminateSize {
                    op: node.target.clone(),
                    node: node.name.clone(),
                })
            }
        },
    };

    let symbol = format!(
        "slice_{}_d{}_s{}_n{}",
        shape_token(&shape.unwrap_or_default()),
        dim,
        start,
        size
    );
    let expr = SmtExpr::call(symbol, vec![input_expr]);
    state.regs.bind(node.id, expr.clone(), TypeTag::Tensor)?;
    Ok(expr)
}

/// Select picks one index out of one dimension; the output drops that
/// dimension. Same normalization rule as slice.
pub(crate) fn encode_select(
    node: &Node,
    graph: &Graph,
    state: &mut State,
) -> Result<SmtExpr, BackendError> {
    let input = node.arg_node(0)?;
    let input_expr = argument_expr(node, graph, state, 0)?;

    let mut dim = node.arg_int(1)?;
    let mut index = node.arg_int(2)?;

    let shape = input_shape(graph, input);
    if let Some(shape) = &shape {
        dim = normalize_index(dim, shape.len() as i64);
        if let Some(&extent) = shape.get(dim as usize) {
            index = index.rem_euclid(extent.max(1));
        }
    }

    let symbol = format!(
        "select_{}_d{}_i{}",
        shape_token(&shape.unwrap_or_default()),
        dim,
        index
    );
    let expr = SmtExpr::call(symbol, vec![input_expr]);
    state.regs.bind(node.id, expr.clone(), TypeTag::Tensor)?;
    Ok(expr)
}
