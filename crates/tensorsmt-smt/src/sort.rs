//! Sorts and literal values.

use serde::{Deserialize, Serialize};

/// The sort (logic type) of an expression.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sort {
    /// Mathematical integers.
    Int,
    /// Mathematical reals. Tensor-valued expressions are abstracted to this
    /// sort throughout the encoder.
    Real,
    /// Booleans (preconditions, well-definedness obligations).
    Bool,
    /// Arrays indexed by `Int` with `Real` elements (embedding tables).
    Array,
}

impl Sort {
    /// True for sorts that participate in arithmetic.
    pub fn is_numeric(self) -> bool {
        matches!(self, Sort::Int | Sort::Real)
    }

    pub fn is_bool(self) -> bool {
        matches!(self, Sort::Bool)
    }
}

impl std::fmt::Display for Sort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sort::Int => write!(f, "Int"),
            Sort::Real => write!(f, "Real"),
            Sort::Bool => write!(f, "Bool"),
            Sort::Array => write!(f, "(Array Int Real)"),
        }
    }
}

/// A literal constant wrapped into an expression leaf.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    Real(f64),
    Bool(bool),
}

impl Value {
    pub fn sort(&self) -> Sort {
        match self {
            Value::Int(_) => Sort::Int,
            Value::Real(_) => Sort::Real,
            Value::Bool(_) => Sort::Bool,
        }
    }

    /// The numeric value, if this literal is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Real(v) => Some(*v),
            Value::Bool(_) => None,
        }
    }
}
