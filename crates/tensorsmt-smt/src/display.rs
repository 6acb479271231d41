//! Canonical s-expression rendering.
//!
//! The printed form of the final combined expression is the serialized
//! artifact payload, so rendering must be deterministic.

use std::fmt;

use crate::expr::SmtExpr;
use crate::sort::Value;

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Real(v) => {
                if v.fract() == 0.0 && v.is_finite() && v.abs() < 1e15 {
                    write!(f, "{:.1}", v)
                } else {
                    write!(f, "{}", v)
                }
            }
            Value::Bool(v) => write!(f, "{}", v),
        }
    }
}

impl fmt::Display for SmtExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SmtExpr::Constant(v) => write!(f, "{}", v),
            SmtExpr::Variable { name, .. } => write!(f, "{}", name),
            SmtExpr::UninterpretedCall { name, args } => {
                if args.is_empty() {
                    return write!(f, "{}", name);
                }
                write!(f, "({}", name)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                write!(f, ")")
            }
            SmtExpr::Binary { op, lhs, rhs } => {
                write!(f, "({} {} {})", op.symbol(), lhs, rhs)
            }
            SmtExpr::Unary { op, operand } => write!(f, "({} {})", op.symbol(), operand),
        }
    }
}
