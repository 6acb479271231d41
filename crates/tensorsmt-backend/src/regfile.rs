//! The symbolic register file.
//!
//! An append-only mapping from IR value identity to the expression encoding
//! that value. Binding the same identity twice is an error, mirroring the
//! IR's SSA property; there is no removal, since one encoding pass processes a
//! bounded graph and the file is discarded with the pass.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tensorsmt_ir::NodeId;
use tensorsmt_smt::SmtExpr;

use crate::error::BackendError;

/// Type tag recorded alongside each bound expression, used by downstream
/// consumers for sort disambiguation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeTag {
    Tensor,
    Integer,
    Float,
    Bool,
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeTag::Tensor => write!(f, "Tensor"),
            TypeTag::Integer => write!(f, "Integer"),
            TypeTag::Float => write!(f, "Float"),
            TypeTag::Bool => write!(f, "Bool"),
        }
    }
}

/// One register entry: an expression and its type tag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValueTy {
    pub expr: SmtExpr,
    pub vtype: TypeTag,
}

/// Append-only register file keyed by node identity.
///
/// Iteration follows binding order, which makes serialized artifacts
/// deterministic.
#[derive(Clone, Debug, Default)]
pub struct RegFile {
    entries: IndexMap<NodeId, ValueTy>,
}

impl RegFile {
    pub fn new() -> Self {
        RegFile::default()
    }

    /// Bind `id` to `(expr, vtype)`. Fails if `id` is already bound:
    /// idempotent re-binding is an error, not a silent overwrite.
    pub fn bind(&mut self, id: NodeId, expr: SmtExpr, vtype: TypeTag) -> Result<(), BackendError> {
        if self.entries.contains_key(&id) {
            return Err(BackendError::DuplicateBinding {
                value: id.to_string(),
            });
        }
        self.entries.insert(id, ValueTy { expr, vtype });
        Ok(())
    }

    /// Look up the entry for `id`. Fails if absent.
    pub fn lookup(&self, id: NodeId) -> Result<&ValueTy, BackendError> {
        self.entries
            .get(&id)
            .ok_or_else(|| BackendError::UnboundIdentifier {
                value: id.to_string(),
            })
    }

    /// The bound expression for `id`.
    pub fn expr(&self, id: NodeId) -> Result<&SmtExpr, BackendError> {
        Ok(&self.lookup(id)?.expr)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &ValueTy)> {
        self.entries.iter()
    }
}
