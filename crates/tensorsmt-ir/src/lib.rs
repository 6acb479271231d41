//! Host-IR data model consumed by the tensorsmt backend.
//!
//! The symbolic encoder treats the host program as an ordered stream of
//! opaque nodes; this crate defines that boundary: [`Graph`] (definition
//! order, single pass), [`Node`] (placeholder / operator call / output),
//! [`Argument`] (node references, literals, lists thereof), and the
//! [`Metadata`] bag the encoders read shape, dtype, memory-format and
//! constant-value hints from. The encoder never mutates a node; it only
//! reads.
//!
//! The storage side of the same IR lives in [`lifetime`]: per-value
//! [`TensorSpec`]s with lifetime intervals, sizes, alignment and aliasing,
//! as consumed by the memory planner.

mod error;
pub mod lifetime;
mod metadata;
mod node;


pub use error::IrError;
pub use lifetime::{SpecRole, TensorSpec};
pub use metadata::{ConstantValue, DType, MemoryFormat, Metadata};
pub use node::{Argument, Graph, Node, NodeId, NodeKind, PlaceholderRole};
