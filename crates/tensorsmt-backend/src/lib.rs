//! Symbolic (SMT) lowering backend for a tensor-program IR.
//!
//! The backend walks an IR graph in definition order, maintains a symbolic
//! register file, and emits algebraic expressions representing each
//! operator's semantics, producing one combined formula per graph. Around
//! that core sit the eligibility filter consumed by the host partitioner
//! and the memory planning pass that assigns and verifies storage offsets
//! for IR value lifetimes.
//!
//! # Pipeline
//!
//! 1. **Eligibility** ([`partition`]): decide which call nodes are
//!    encodable, group them into partitions, tag them for delegation.
//! 2. **Encoding** ([`SmtBackend::preprocess`]): seed placeholders,
//!    dispatch each call node to its operator encoder, resolve outputs,
//!    serialize the combined formula.
//! 3. **Memory planning** ([`memory`]): assign storage offsets to value
//!    lifetimes and verify the non-overlap invariant.
//!
//! Everything is single-threaded and single-pass: a [`State`] is created
//! per pass, mutated monotonically, and discarded after serialization.
//!
//! # Examples
//!
//! ```
//! use tensorsmt_backend::{PreprocessConfig, SmtBackend};
//! use tensorsmt_ir::{Argument, Graph, Metadata, NodeKind, PlaceholderRole};
//!
//! let mut graph = Graph::new();
//! let x = graph
//!     .add_node(
//!         NodeKind::Placeholder(PlaceholderRole::UserInput),
//!         "x",
//!         "x",
//!         vec![],
//!         Metadata::new(),
//!     )
//!     .unwrap();
//! let y = graph
//!     .add_node(
//!         NodeKind::Placeholder(PlaceholderRole::UserInput),
//!         "y",
//!         "y",
//!         vec![],
//!         Metadata::new(),
//!     )
//!     .unwrap();
//! let add = graph
//!     .add_node(
//!         NodeKind::CallOperator,
//!         "aten.add.Tensor",
//!         "add",
//!         vec![Argument::Node(x), Argument::Node(y)],
//!         Metadata::new(),
//!     )
//!     .unwrap();
//! graph
//!     .add_node(
//!         NodeKind::Output,
//!         "output",
//!         "output",
//!         vec![Argument::Node(add)],
//!         Metadata::new(),
//!     )
//!     .unwrap();
//!
//! let result = SmtBackend::preprocess(&graph, &PreprocessConfig::default()).unwrap();
//! assert_eq!(
//!     result.debug_map.get(tensorsmt_backend::FINAL_SMT_EXPRS_KEY).unwrap(),
//!     "(+ x y)"
//! );
//! ```

mod driver;
pub mod encode;
mod error;
pub mod memory;
pub mod partition;
mod regfile;
mod state;

#[cfg(test)]
mod tests;

pub use driver::{
    preprocess_with_state, PreprocessConfig, PreprocessResult, SmtBackend, FINAL_SMT_EXPRS_KEY,
};
pub use encode::{EncoderRegistry, SupportedOp};
pub use error::BackendError;
pub use memory::{
    MemoryAlgorithm, MemoryError, MemoryPlanningConfig, MemoryPlanningPass, MemoryPlanningReport,
    Verifier, ALIGNMENT,
};
pub use partition::{
    generate_partitions, tag_nodes, OperatorSupport, Partition, RejectReason,
    NOT_SUPPORTED_OPERATORS, TO_BE_IMPLEMENTED_OPERATORS,
};
pub use regfile::{RegFile, TypeTag, ValueTy};
pub use state::State;
