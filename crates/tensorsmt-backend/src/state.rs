//! The symbolic state threaded through one encoding pass.
//!
//! Owns the register file, a running precondition, and the per-operator
//! well-definedness table. The state separates *what the graph computes*
//! (register bindings) from *when that computation is valid* (the
//! well-definedness table): some operators, division foremost, are defined
//! with side-conditions the IR's typing does not guarantee. Consumers choose
//! whether to conjoin the obligations into the final formula.
//!
//! The state is created once per pass, mutated monotonically (bindings only
//! added, preconditions only conjoined) and discarded after serialization.

use indexmap::IndexMap;
use tensorsmt_ir::NodeId;
use tensorsmt_smt::SmtExpr;

use crate::error::BackendError;
use crate::regfile::RegFile;

#[derive(Debug)]
pub struct State {
    pub regs: RegFile,
    precond: SmtExpr,
    welldef: IndexMap<(NodeId, String), SmtExpr>,
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

impl State {
    pub fn new() -> Self {
        State {
            regs: RegFile::new(),
            // The neutral element of conjunction: zero added conditions
            // yield the constant `true`.
            precond: SmtExpr::tru(),
            welldef: IndexMap::new(),
        }
    }

    /// Conjoin `expr` into the running precondition.
    pub fn add_precondition(&mut self, expr: SmtExpr) -> Result<(), BackendError> {
        self.precond = SmtExpr::and(self.precond.clone(), expr)?;
        Ok(())
    }

    /// The running precondition.
    pub fn precondition(&self) -> &SmtExpr {
        &self.precond
    }

    /// Record a well-definedness obligation for `(op, desc)`, conjoining it
    /// into the slot if one already exists.
    pub fn well_defined(
        &mut self,
        op: NodeId,
        desc: impl Into<String>,
        expr: SmtExpr,
    ) -> Result<(), BackendError> {
        let key = (op, desc.into());
        match self.welldef.shift_remove(&key) {
            Some(current) => {
                let combined = SmtExpr::and(current, expr)?;
                self.welldef.insert(key, combined);
            }
            None => {
                self.welldef.insert(key, expr);
            }
        }
        Ok(())
    }

    /// Conjunction of every recorded obligation.
    pub fn is_well_defined(&self) -> Result<SmtExpr, BackendError> {
        let mut out = SmtExpr::tru();
        for expr in self.welldef.values() {
            out = SmtExpr::and(out, expr.clone())?;
        }
        Ok(out)
    }

    /// Conjunction of the obligations recorded for one operator.
    pub fn op_well_definedness(&self, op: NodeId) -> Result<SmtExpr, BackendError> {
        let mut out = SmtExpr::tru();
        for ((id, _), expr) in &self.welldef {
            if *id == op {
                out = SmtExpr::and(out, expr.clone())?;
            }
        }
        Ok(out)
    }

    /// The obligations recorded for one operator, keyed by description.
    pub fn op_obligations(&self, op: NodeId) -> Vec<(&str, &SmtExpr)> {
        self.welldef
            .iter()
            .filter(|((id, _), _)| *id == op)
            .map(|((_, desc), expr)| (desc.as_str(), expr))
            .collect()
    }

    /// Number of recorded obligation slots across all operators.
    pub fn obligation_count(&self) -> usize {
        self.welldef.len()
    }
}
