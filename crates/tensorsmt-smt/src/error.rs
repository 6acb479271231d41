//! Error types for the expression algebra.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SmtError {
    #[error("operator `{op}` expects {expected}, got {found}")]
    TypeMismatch {
        op: &'static str,
        expected: &'static str,
        found: String,
    },
}

impl SmtError {
    pub(crate) fn type_mismatch(
        op: &'static str,
        expected: &'static str,
        found: impl Into<String>,
    ) -> Self {
        SmtError::TypeMismatch {
            op,
            expected,
            found: found.into(),
        }
    }
}
