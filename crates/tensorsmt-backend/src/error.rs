//! Error taxonomy for the encoding pass.
//!
//! Structural errors (`DuplicateBinding`, `UnboundIdentifier`) violate the
//! encoder's own SSA/registration invariants. The `Unsupported*` family is
//! raised by individual operator encoders when a node falls outside the
//! modeled subset; all of these are fatal for the whole pass, since a
//! partial formula would be unsound to verify against. Operators with no
//! registered encoder are *not* errors; the driver logs a warning and
//! continues.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("value {value} is already bound in the register file")]
    DuplicateBinding { value: String },

    #[error("value {value} is not bound in the register file")]
    UnboundIdentifier { value: String },

    #[error("encoder for target `{target}` registered twice")]
    DuplicateEncoder { target: String },

    #[error("{op}: node `{node}` has a constant operand with {numel} elements; only single-element constants are supported")]
    UnsupportedConstantShape {
        op: String,
        node: String,
        numel: usize,
    },

    #[error("{op}: node `{node}` has rank {rank}; expected a 4-D tensor")]
    UnsupportedRank { op: String, node: String, rank: usize },

    #[error("{op}: node `{node}` uses stride {stride}; only stride 1 is supported")]
    UnsupportedStride { op: String, node: String, stride: i64 },

    #[error("{op}: node `{node}` has {arity} inputs; only 2..=4 are supported")]
    UnsupportedArity { op: String, node: String, arity: usize },

    #[error("{op}: node `{node}` reduces over axis {axis}; only the last dimension is supported")]
    UnsupportedAxis { op: String, node: String, axis: i64 },

    #[error("{op}: node `{node}` converts to an unsupported memory format")]
    UnsupportedMemoryFormat { op: String, node: String },

    #[error("{op}: node `{node}`: {reason}")]
    UnsupportedReduction {
        op: String,
        node: String,
        reason: String,
    },

    #[error("{op}: node `{node}`: cannot deduce the slice size from metadata or arguments")]
    IndeterminateSize { op: String, node: String },

    #[error(transparent)]
    Smt(#[from] tensorsmt_smt::SmtError),

    #[error(transparent)]
    Ir(#[from] tensorsmt_ir::IrError),
}
