//! Error types for the IR.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IrError {
    #[error("node index {index} out of bounds (max: {max})")]
    NodeIndexOutOfBounds { index: usize, max: usize },
    #[error("node name `{name}` already defined")]
    DuplicateNodeName { name: String },
    #[error("node `{node}`: argument {index} is missing")]
    MissingArgument { node: String, index: usize },
    #[error("node `{node}`: argument {index} is not {expected}")]
    ArgumentKind {
        node: String,
        index: usize,
        expected: &'static str,
    },
}
