//! Shape-changing views: reshape, permute, expand, unsqueeze.
//!
//! All four are modeled as uninterpreted functions whose symbol names embed
//! the shape/axis parameters verbatim, so repeated identical reorderings
//! produce syntactically identical symbols.

use tensorsmt_ir::{Argument, Graph, Node};
use tensorsmt_smt::SmtExpr;

use crate::error::BackendError;
use crate::regfile::TypeTag;
use crate::state::State;

use super::{
    argument_expr, input_shape, node_shape, order_token, shape_token, PERM_NCHW_TO_NHWC,
    PERM_NHWC_TO_NCHW,
};

pub(crate) fn encode_reshape(
    node: &Node,
    graph: &Graph,
    state: &mut State,
) -> Result<SmtExpr, BackendError> {
    let input = node.arg_node(0)?;
    let input_expr = argument_expr(node, graph, state, 0)?;

    let old_shape = input_shape(graph, input).unwrap_or_default();
    // Missing output-shape metadata degrades to the empty shape. This is an
    // intentional, named default; the symbol stays deterministic.
    let new_shape = match node_shape(node) {
        Some(shape) => shape,
        None => {
            tracing::debug!(node = %node.name, "reshape target shape unknown; using empty shape");
            Vec::new()
        }
    };

    let symbol = format!(
        "reshape_{}_to_{}",
        shape_token(&old_shape),
        shape_token(&new_shape)
    );
    let expr = SmtExpr::call(symbol, vec![input_expr]);
    state.regs.bind(node.id, expr.clone(), TypeTag::Tensor)?;
    Ok(expr)
}

pub(crate) fn encode_permute(
    node: &Node,
    graph: &Graph,
    state: &mut State,
) -> Result<SmtExpr, BackendError> {
    let input_expr = argument_expr(node, graph, state, 0)?;
    let mut order: Vec<i64> = node.arg_int_list(1)?.to_vec();

    // A channels-last node stores its permutation in NHWC terms; map it
    // through the fixed tables before use. Requires a 4-D order.
    if node.meta.channels_last_node {
        if order.len() != 4 {
            return Err(BackendError::UnsupportedRank {
                op: node.target.clone(),
                node: node.name.clone(),
                rank: order.len(),
            });
        }
        let in_contiguous: Vec<i64> = order
            .iter()
            .map(|&axis| PERM_NHWC_TO_NCHW[axis as usize] as i64)
            .collect();
        order = PERM_NCHW_TO_NHWC
            .iter()
            .map(|&pos| in_contiguous[pos])
            .collect();
    }

    let symbol = format!("transpose_{}", order_token(&order));
    let expr = SmtExpr::call(symbol, vec![input_expr]);
    state.regs.bind(node.id, expr.clone(), TypeTag::Tensor)?;
    Ok(expr)
}

pub(crate) fn encode_expand(
    node: &Node,
    graph: &Graph,
    state: &mut State,
) -> Result<SmtExpr, BackendError> {
    let input = node.arg_node(0)?;
    let input_expr = argument_expr(node, graph, state, 0)?;

    let old_shape = input_shape(graph, input).unwrap_or_default();
    let new_sizes: Vec<i64> = match node.arg_opt(1) {
        Some(Argument::IntList(sizes)) => sizes.clone(),
        _ => Vec::new(),
    };

    // Broadcasting from a lower rank is assumed valid.
    if old_shape.len() < new_sizes.len() {
        tracing::warn!(
            node = %node.name,
            input_rank = old_shape.len(),
            output_rank = new_sizes.len(),
            "expand increases rank"
        );
    }

    let symbol = format!(
        "expand_{}_to_{}",
        shape_token(&old_shape),
        shape_token(&new_sizes)
    );
    let expr = SmtExpr::call(symbol, vec![input_expr]);
    state.regs.bind(node.id, expr.clone(), TypeTag::Tensor)?;
    Ok(expr)
}

pub(crate) fn encode_unsqueeze(
    node: &Node,
    graph: &Graph,
    state: &mut State,
) -> Result<SmtExpr, BackendError> {
    let input_expr = argument_expr(node, graph, state, 0)?;
    let dim = match node.arg_opt(1) {
        Some(Argument::Int(d)) => *d,
        _ => 0,
    };

    let expr = SmtExpr::call(format!("unsqueeze_d{}", dim), vec![input_expr]);
    state.regs.bind(node.id, expr.clone(), TypeTag::Tensor)?;
    Ok(expr)
}
