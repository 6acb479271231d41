//! Embedding gather and index_put scatter.
//!
//! Both are approximate by design. Embedding produces a single scalar-like
//! array select; multi-dimensional index tensors are not modeled. When
//! index_put receives several index tensors they are folded pairwise into
//! one merged expression via repeated addition; this is a crude placeholder
//! for a faithful multi-index encoding, preserved as-is.

use tensorsmt_ir::{Argument, Graph, Node};
use tensorsmt_smt::SmtExpr;

use crate::error::BackendError;
use crate::regfile::TypeTag;
use crate::state::State;

use super::{argument_expr, operand_expr};

pub(crate) fn encode_embedding(
    node: &Node,
    graph: &Graph,
    state: &mut State,
) -> Result<SmtExpr, BackendError> {
    let weight = argument_expr(node, graph, state, 0)?;
    let indices = argument_expr(node, graph, state, 1)?;

    let expr = SmtExpr::select(weight, indices)?;
    state.regs.bind(node.id, expr.clone(), TypeTag::Tensor)?;
    Ok(expr)
}

pub(crate) fn encode_index_put(
    node: &Node,
    graph: &Graph,
    state: &mut State,
) -> Result<SmtExpr, BackendError> {
    let base = argument_expr(node, graph, state, 0)?;

    let index_exprs: Vec<SmtExpr> = match node.arg_opt(1) {
        Some(Argument::NodeList(ids)) => {
            let mut exprs = Vec::with_capacity(ids.len());
            for id in ids.clone() {
                exprs.push(operand_expr(node, graph, state, id)?);
            }
            exprs
        }
        Some(Argument::Node(id)) => vec![operand_expr(node, graph, state, *id)?],
        _ => {
            return Err(tensorsmt_ir::IrError::MissingArgument {
                node: node.name.clone(),
                index: 1,
            }
            .into())
        }
    };

    let mut iter = index_exprs.into_iter();
    let first = iter.next().ok_or_else(|| tensorsmt_ir::IrError::MissingArgument {
        node: node.name.clone(),
        index: 1,
    })?;
    // A single index tensor is used directly; several fold pairwise.
    let merged = iter.try_fold(first, |acc, next| {
        SmtExpr::add(SmtExpr::add(SmtExpr::real(0.0), acc)?, next)
    })?;

    let value = argument_expr(node, graph, state, 2)?;

    let expr = SmtExpr::call("scatter", vec![base, merged, value]);
    state.regs.bind(node.id, expr.clone(), TypeTag::Tensor)?;
    Ok(expr)
}
